//! Keeper configuration management
//!
//! Configuration file: ~/.config/keeper/keeper.yaml
//!
//! Every section is optional; missing keys fall back to the defaults below.

use crate::paths::Paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Characters rotated by the field cipher
pub const DEFAULT_ALPHABET: &str = "A2HQuNq{XEgo/PwhLt)BI=a6cz43*VkSDl`KxU%F.Y\\~\"p ?!;j>dGrOZ}<T0$v,n-ye5Wm]i^7&:('9M[8+J|fb@Rs_C#1";

/// Rotation applied when encoding
pub const DEFAULT_SHIFT: i64 = 10;

/// Global keeper configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Field cipher settings
    #[serde(default)]
    pub cipher: CipherConfig,

    /// Master password gate
    #[serde(default)]
    pub gate: GateConfig,

    /// Random password generation
    #[serde(default)]
    pub passgen: PassgenConfig,

    /// Override for the user registry location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,
}

impl KeeperConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Paths::new().config_file())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read keeper config from {:?}", path))?;
            let config: Self = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse keeper config from {:?}", path))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Location of the user registry
    pub fn registry_path(&self) -> PathBuf {
        self.registry
            .clone()
            .unwrap_or_else(|| Paths::new().registry())
    }
}

/// Cipher settings.
///
/// The alphabet must not contain duplicate characters; this is not checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherConfig {
    #[serde(default = "default_alphabet")]
    pub alphabet: String,

    #[serde(default = "default_shift")]
    pub shift: i64,

    /// Characters never rotated, even when they appear in the alphabet
    #[serde(default)]
    pub reserved: String,
}

fn default_alphabet() -> String {
    DEFAULT_ALPHABET.to_string()
}

fn default_shift() -> i64 {
    DEFAULT_SHIFT
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            alphabet: default_alphabet(),
            shift: default_shift(),
            reserved: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassgenConfig {
    #[serde(default = "default_length")]
    pub length: usize,

    #[serde(default = "default_charset")]
    pub charset: String,
}

fn default_length() -> usize {
    8
}

fn default_charset() -> String {
    ('a'..='z').chain('A'..='Z').chain('0'..='9').collect()
}

impl Default for PassgenConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            charset: default_charset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let tmp = TempDir::new()?;
        let config = KeeperConfig::load_from(&tmp.path().join("absent.yaml"))?;
        assert_eq!(config.cipher.shift, 10);
        assert_eq!(config.cipher.alphabet, DEFAULT_ALPHABET);
        assert!(config.cipher.reserved.is_empty());
        assert_eq!(config.gate.max_attempts, 3);
        assert_eq!(config.passgen.length, 8);
        assert_eq!(config.passgen.charset.len(), 62);
        assert!(config.registry.is_none());
        Ok(())
    }

    #[test]
    fn test_partial_file() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("keeper.yaml");
        std::fs::write(&path, "cipher:\n  shift: -3\ngate:\n  max_attempts: 5\n")?;

        let config = KeeperConfig::load_from(&path)?;
        assert_eq!(config.cipher.shift, -3);
        assert_eq!(config.cipher.alphabet, DEFAULT_ALPHABET);
        assert_eq!(config.gate.max_attempts, 5);
        assert_eq!(config.passgen.length, 8);
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("nested").join("keeper.yaml");

        let mut config = KeeperConfig::default();
        config.passgen.length = 20;
        config.registry = Some(tmp.path().join("users.db"));
        config.save_to(&path)?;

        let loaded = KeeperConfig::load_from(&path)?;
        assert_eq!(loaded.passgen.length, 20);
        assert_eq!(loaded.registry_path(), tmp.path().join("users.db"));
        assert_eq!(loaded.cipher.alphabet, DEFAULT_ALPHABET);
        Ok(())
    }

    #[test]
    fn test_bad_yaml_is_an_error() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("keeper.yaml");
        std::fs::write(&path, "cipher: [not, a, map")?;
        assert!(KeeperConfig::load_from(&path).is_err());
        Ok(())
    }
}
