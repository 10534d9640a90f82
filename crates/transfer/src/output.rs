use std::path::{Component, Path, PathBuf};

use crate::TransferError;
use crate::types::AssembledFile;

/// Checks that a received file name resolves to a file inside the output
/// directory.
///
/// The name must be relative, contain at least one normal component and
/// never step upward. Backslashes and NUL are refused on every platform.
pub fn validate_file_name(file_name: &str) -> Result<(), TransferError> {
    let reject = |reason: &str| -> Result<(), TransferError> {
        Err(TransferError::InvalidPath(format!("{file_name:?} {reason}")))
    };

    if file_name.contains(['\\', '\0']) {
        return reject("contains a backslash or NUL");
    }

    let mut depth = 0usize;
    for component in Path::new(file_name).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => return reject("climbs out of the output directory"),
            Component::RootDir | Component::Prefix(_) => return reject("is not relative"),
        }
    }
    if depth == 0 {
        return reject("names no file");
    }
    Ok(())
}

/// Writes a completed file below `base_dir` and returns its path.
///
/// Intermediate directories named in the file name are created.
pub fn write_assembled(base_dir: &Path, file: &AssembledFile) -> Result<PathBuf, TransferError> {
    validate_file_name(&file.file_name)?;

    let full_path = base_dir.join(&file.file_name);
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&full_path, &file.data)?;

    tracing::info!(
        path = %full_path.display(),
        bytes = file.data.len(),
        "wrote received file"
    );
    Ok(full_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphcast_protocol::TransferId;
    use tempfile::TempDir;

    fn assembled(name: &str, data: &[u8]) -> AssembledFile {
        AssembledFile {
            transfer_id: TransferId::new("t1"),
            file_name: name.into(),
            file_size: data.len() as u64,
            chunk_size: 128,
            correction_tag: "M".into(),
            file_checksum: crate::checksum::compute(data),
            data: data.to_vec(),
        }
    }

    fn reason(file_name: &str) -> String {
        match validate_file_name(file_name) {
            Err(TransferError::InvalidPath(reason)) => reason,
            other => panic!("expected {file_name:?} to be rejected, got {other:?}"),
        }
    }

    #[test]
    fn names_without_a_file_are_rejected() {
        for name in ["", ".", "./", "./."] {
            assert!(reason(name).ends_with("names no file"), "{name:?}");
        }
    }

    #[test]
    fn upward_steps_are_rejected_anywhere() {
        for name in ["..", "../x.txt", "a/../../x.txt", "a/b/.."] {
            assert!(reason(name).contains("climbs out"), "{name:?}");
        }
    }

    #[test]
    fn rooted_names_are_rejected() {
        assert!(reason("/etc/passwd").ends_with("is not relative"));
    }

    #[test]
    fn backslash_and_nul_are_rejected() {
        assert!(reason("..\\x.txt").contains("backslash"));
        assert!(reason("dir\\file").contains("backslash"));
        assert!(reason("a\0b").contains("NUL"));
    }

    #[test]
    fn relative_names_pass() {
        for name in ["photo.jpg", "docs/notes.txt", "./notes.txt", ".hidden", "a/./b"] {
            assert!(validate_file_name(name).is_ok(), "{name:?}");
        }
    }

    #[test]
    fn writes_file_contents() {
        let dir = TempDir::new().unwrap();
        let file = assembled("out.bin", b"Hello World");
        let path = write_assembled(dir.path(), &file).unwrap();
        assert_eq!(path, dir.path().join("out.bin"));
        assert_eq!(std::fs::read(&path).unwrap(), b"Hello World");
    }

    #[test]
    fn creates_subdirectories() {
        let dir = TempDir::new().unwrap();
        let file = assembled("sub/dir/file.txt", b"data");
        write_assembled(dir.path(), &file).unwrap();
        let content = std::fs::read(dir.path().join("sub/dir/file.txt")).unwrap();
        assert_eq!(&content, b"data");
    }

    #[test]
    fn writes_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_assembled(dir.path(), &assembled("empty", b"")).unwrap();
        assert!(std::fs::read(path).unwrap().is_empty());
    }

    #[test]
    fn traversal_is_not_written() {
        let dir = TempDir::new().unwrap();
        let file = assembled("../escape.txt", b"evil");
        let result = write_assembled(dir.path(), &file);
        assert!(matches!(result, Err(TransferError::InvalidPath(_))));
        assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
    }
}
