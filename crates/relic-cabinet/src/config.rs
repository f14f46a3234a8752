//! Cabinet file naming

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Names of the files making up a cabinet set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CabinetConfig {
    /// Header file name
    pub header_name: String,

    /// Volume file name prefix, followed by the volume number
    pub volume_prefix: String,

    /// Volume file extension without the dot
    pub volume_extension: String,
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self {
            header_name: "data1.hdr".to_string(),
            volume_prefix: "data".to_string(),
            volume_extension: "cab".to_string(),
        }
    }
}

impl CabinetConfig {
    /// Set the header file name
    #[must_use]
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Set the volume file prefix
    #[must_use]
    pub fn with_volume_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.volume_prefix = prefix.into();
        self
    }

    /// Set the volume file extension
    #[must_use]
    pub fn with_volume_extension(mut self, extension: impl Into<String>) -> Self {
        self.volume_extension = extension.into();
        self
    }

    /// Path of the header file under `root`
    pub fn header_path(&self, root: &Path) -> PathBuf {
        root.join(&self.header_name)
    }

    /// Path of volume `number` under `root`
    pub fn volume_path(&self, root: &Path, number: u16) -> PathBuf {
        root.join(format!(
            "{}{}.{}",
            self.volume_prefix, number, self.volume_extension
        ))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let config = CabinetConfig::default();
        let root = Path::new("/mnt/cd");
        assert_eq!(config.header_path(root), root.join("data1.hdr"));
        assert_eq!(config.volume_path(root, 2), root.join("data2.cab"));
    }

    #[test]
    fn test_builders() {
        let config = CabinetConfig::default()
            .with_header_name("setup.hdr")
            .with_volume_prefix("disk")
            .with_volume_extension("CAB");
        assert_eq!(
            config.volume_path(Path::new("x"), 1),
            Path::new("x").join("disk1.CAB")
        );
    }

    #[test]
    fn test_partial_json() {
        let config: CabinetConfig =
            serde_json::from_str(r#"{"volume_prefix": "disk"}"#).unwrap();
        assert_eq!(config.volume_prefix, "disk");
        assert_eq!(config.header_name, "data1.hdr");
    }
}
