use glyphcast_protocol::{
    MAX_CHUNK_SIZE, MAX_FILE_SIZE, Packet, PayloadCapacity, TransferId, expected_total_pieces,
};

use crate::TransferError;
use crate::checksum;

/// Splits `content` into an ordered list of packets.
///
/// Every packet carries the CRC-32 of its own payload and of the whole file.
/// An empty file still yields exactly one packet with an empty payload.
pub fn build(
    transfer_id: &TransferId,
    file_name: &str,
    content: &[u8],
    chunk_size: u32,
    correction_tag: &str,
) -> Result<Vec<Packet>, TransferError> {
    check_chunk_bounds(chunk_size)?;
    if file_name.is_empty() {
        return Err(TransferError::EmptyFileName);
    }
    if correction_tag.is_empty() {
        return Err(TransferError::EmptyCorrectionTag);
    }
    let file_size = content.len() as u64;
    if file_size > MAX_FILE_SIZE {
        return Err(TransferError::FileTooLarge {
            size: file_size,
            max: MAX_FILE_SIZE,
        });
    }

    // Bounded by MAX_FILE_SIZE, so the count always fits.
    let total_pieces = expected_total_pieces(file_size, chunk_size).unwrap_or(1);
    let file_checksum = checksum::compute(content);

    let empty = Packet {
        transfer_id: transfer_id.clone(),
        file_name: file_name.to_string(),
        file_size,
        chunk_size,
        correction_tag: correction_tag.to_string(),
        piece_index: 0,
        total_pieces,
        payload: Vec::new(),
        payload_checksum: checksum::compute(&[]),
        file_checksum,
    };
    let packets = if content.is_empty() {
        vec![empty]
    } else {
        content
            .chunks(chunk_size as usize)
            .enumerate()
            .map(|(index, slice)| Packet {
                piece_index: index as u32,
                payload: slice.to_vec(),
                payload_checksum: checksum::compute(slice),
                ..empty.clone()
            })
            .collect()
    };

    tracing::debug!(
        transfer_id = %transfer_id,
        file_name,
        file_size,
        chunk_size,
        total_pieces,
        "built packets"
    );
    Ok(packets)
}

/// Checks a configured chunk size against the protocol bound and the symbol
/// capacity for `version` at `correction_tag`.
pub fn validate_chunk_size(
    chunk_size: u32,
    version: u8,
    correction_tag: &str,
    capacity: &impl PayloadCapacity,
) -> Result<(), TransferError> {
    check_chunk_bounds(chunk_size)?;
    let max = capacity
        .max_payload_bytes(version, correction_tag)
        .ok_or_else(|| TransferError::InvalidChunkSize {
            chunk_size,
            reason: format!("unknown symbol version {version} at correction {correction_tag:?}"),
        })?;
    if chunk_size as usize > max {
        return Err(TransferError::InvalidChunkSize {
            chunk_size,
            reason: format!(
                "symbol version {version} at correction {correction_tag} holds at most {max} bytes"
            ),
        });
    }
    Ok(())
}

fn check_chunk_bounds(chunk_size: u32) -> Result<(), TransferError> {
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(TransferError::InvalidChunkSize {
            chunk_size,
            reason: format!("must be between 1 and {MAX_CHUNK_SIZE}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphcast_protocol::QR_BYTE_CAPACITY;

    fn id() -> TransferId {
        TransferId::new("build-test")
    }

    fn content(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 251) as u8).collect()
    }

    #[test]
    fn splits_into_full_pieces_and_a_short_tail() {
        let data = content(300);
        let packets = build(&id(), "a.bin", &data, 128, "M").unwrap();

        assert_eq!(packets.len(), 3);
        let lens: Vec<usize> = packets.iter().map(|p| p.payload.len()).collect();
        assert_eq!(lens, vec![128, 128, 44]);

        for (i, p) in packets.iter().enumerate() {
            assert_eq!(p.piece_index, i as u32);
            assert_eq!(p.total_pieces, 3);
            assert_eq!(p.file_size, 300);
            assert_eq!(p.chunk_size, 128);
            assert_eq!(p.correction_tag, "M");
            assert_eq!(p.file_checksum, checksum::compute(&data));
            assert!(checksum::verify(&p.payload, p.payload_checksum));
        }

        let joined: Vec<u8> = packets.iter().flat_map(|p| p.payload.clone()).collect();
        assert_eq!(joined, data);
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let packets = build(&id(), "a.bin", &content(256), 128, "L").unwrap();
        assert_eq!(packets.len(), 2);
        assert!(packets.iter().all(|p| p.payload.len() == 128));
    }

    #[test]
    fn empty_file_yields_one_empty_packet() {
        let packets = build(&id(), "empty.txt", &[], 64, "H").unwrap();
        assert_eq!(packets.len(), 1);
        let p = &packets[0];
        assert_eq!(p.piece_index, 0);
        assert_eq!(p.total_pieces, 1);
        assert_eq!(p.file_size, 0);
        assert!(p.payload.is_empty());
        assert_eq!(p.payload_checksum, 0);
        assert_eq!(p.file_checksum, 0);
    }

    #[test]
    fn rejects_zero_and_oversized_chunks() {
        assert!(matches!(
            build(&id(), "a", b"x", 0, "M"),
            Err(TransferError::InvalidChunkSize { chunk_size: 0, .. })
        ));
        assert!(matches!(
            build(&id(), "a", b"x", 256, "M"),
            Err(TransferError::InvalidChunkSize { chunk_size: 256, .. })
        ));
        assert!(build(&id(), "a", b"x", 255, "M").is_ok());
    }

    #[test]
    fn rejects_empty_name_and_tag() {
        assert!(matches!(
            build(&id(), "", b"x", 16, "M"),
            Err(TransferError::EmptyFileName)
        ));
        assert!(matches!(
            build(&id(), "a", b"x", 16, ""),
            Err(TransferError::EmptyCorrectionTag)
        ));
    }

    #[test]
    fn rejects_content_over_the_shared_limit() {
        let data = vec![0u8; MAX_FILE_SIZE as usize + 1];
        assert!(matches!(
            build(&id(), "big.bin", &data, 255, "L"),
            Err(TransferError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn chunk_size_must_fit_symbol_capacity() {
        // Version 10 holds 213 bytes at M and 119 at H.
        assert!(validate_chunk_size(200, 10, "M", &QR_BYTE_CAPACITY).is_ok());
        assert!(validate_chunk_size(213, 10, "M", &QR_BYTE_CAPACITY).is_ok());
        assert!(validate_chunk_size(120, 10, "H", &QR_BYTE_CAPACITY).is_err());
        // Capacity above the protocol bound does not lift the bound.
        assert!(validate_chunk_size(300, 40, "L", &QR_BYTE_CAPACITY).is_err());
    }

    #[test]
    fn chunk_size_validation_rejects_unknown_symbols() {
        let err = validate_chunk_size(10, 0, "M", &QR_BYTE_CAPACITY).unwrap_err();
        assert!(err.to_string().contains("unknown symbol version"));
        assert!(validate_chunk_size(10, 5, "Z", &QR_BYTE_CAPACITY).is_err());
    }

    #[test]
    fn capacity_collaborator_is_explicit() {
        struct Fixed(usize);
        impl PayloadCapacity for Fixed {
            fn max_payload_bytes(&self, _version: u8, _tag: &str) -> Option<usize> {
                Some(self.0)
            }
        }
        assert!(validate_chunk_size(32, 1, "anything", &Fixed(32)).is_ok());
        assert!(validate_chunk_size(33, 1, "anything", &Fixed(32)).is_err());
    }
}
