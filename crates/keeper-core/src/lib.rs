//! Keeper Core - Shared functionality for the keeper tools
//!
//! Standard filesystem locations and the YAML configuration file.

pub mod config;
pub mod paths;

pub use config::{CipherConfig, GateConfig, KeeperConfig, PassgenConfig};
pub use paths::{normalize_path, Paths};
