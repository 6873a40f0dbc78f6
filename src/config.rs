//! Configuration for bluecarbon-registry

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bluecarbon-registry")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for evidence blobs, the registry database and drafts
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// HTTP port for the intake API
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Debounce window for draft autosave, in milliseconds
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,

    /// Maximum accepted multipart payload size in bytes
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
}

fn default_http_port() -> u16 {
    8086
}

fn default_autosave_debounce_ms() -> u64 {
    600
}

fn default_max_payload_bytes() -> u64 {
    // Photos and documents together stay well under this.
    256 * 1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            http_port: default_http_port(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get evidence blob directory
    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    /// Get registry database path
    pub fn registry_db_path(&self) -> PathBuf {
        self.data_dir.join("registry.db")
    }

    /// Get draft autosave database path
    pub fn drafts_db_path(&self) -> PathBuf {
        self.data_dir.join("drafts.sled")
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_roundtrip() {
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.http_port, config.http_port);
        assert_eq!(loaded.autosave_debounce_ms, 600);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "http_port = 9100\n").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.http_port, 9100);
        assert_eq!(loaded.autosave_debounce_ms, 600);
    }
}
