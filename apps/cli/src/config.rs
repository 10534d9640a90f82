//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/glyphcast/config.toml`
//! - Windows: `%APPDATA%/glyphcast/config.toml`

use std::path::{Path, PathBuf};

use anyhow::Context;
use glyphcast_protocol::CorrectionLevel;
use glyphcast_protocol::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_CORRECTION, DEFAULT_SYMBOL_VERSION};
use serde::{Deserialize, Serialize};

/// Sender and receiver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Payload bytes per symbol.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Error-correction level of rendered symbols.
    #[serde(default = "default_correction")]
    pub correction: CorrectionLevel,

    /// Symbol version the chunk size is validated against.
    #[serde(default = "default_symbol_version")]
    pub symbol_version: u8,

    /// Delay between displayed symbols in milliseconds.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Passes over all symbols before the sender stops (0 = forever).
    #[serde(default = "default_passes")]
    pub passes: u32,

    /// Directory received files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_chunk_size() -> u32 {
    DEFAULT_CHUNK_SIZE
}

fn default_correction() -> CorrectionLevel {
    DEFAULT_CORRECTION
}

fn default_symbol_version() -> u8 {
    DEFAULT_SYMBOL_VERSION
}

fn default_frame_interval_ms() -> u64 {
    250
}

fn default_passes() -> u32 {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            correction: default_correction(),
            symbol_version: default_symbol_version(),
            frame_interval_ms: default_frame_interval_ms(),
            passes: default_passes(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let path = config_path();
                if path.exists() {
                    Self::read(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration read");
        Ok(config)
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("glyphcast").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("glyphcast")
            .join("config.toml")
    }
}
