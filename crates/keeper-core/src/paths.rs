//! Standard paths used by keeper

use std::path::{PathBuf, MAIN_SEPARATOR};

/// Standard keeper paths
pub struct Paths {
    /// Data directory (~/.local/share/keeper)
    pub data: PathBuf,
    /// Config directory (~/.config/keeper)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("keeper");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("keeper");

        Self { data, config }
    }

    /// Default location of the user registry
    pub fn registry(&self) -> PathBuf {
        self.data.join("users.db")
    }

    /// Default location of the configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("keeper.yaml")
    }
}

/// Normalize a user-typed path.
///
/// Expands a leading `~`, rewrites foreign separators to the native one and
/// drops trailing separators (the root itself is kept).
pub fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let foreign = if MAIN_SEPARATOR == '/' { '\\' } else { '/' };
    let mut text: String = trimmed
        .chars()
        .map(|c| if c == foreign { MAIN_SEPARATOR } else { c })
        .collect();

    if text == "~" || text.starts_with(&format!("~{}", MAIN_SEPARATOR)) {
        if let Some(home) = dirs::home_dir() {
            text = format!("{}{}", home.display(), &text[1..]);
        }
    }

    while text.len() > 1 && text.ends_with(MAIN_SEPARATOR) {
        text.pop();
    }

    PathBuf::from(text)
}
