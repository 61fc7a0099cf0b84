use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file at the store root, shared with the front-end.
pub const CONFIG_FILE: &str = "config.json";

/// `config.json`: where the library lives and what to call it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Absolute path of the library directory.
    pub dir: PathBuf,
    /// Display name of the library.
    #[serde(default = "default_name")]
    pub name: String,
}

pub(crate) fn default_name() -> String {
    "Reference Manager".to_string()
}

impl HostConfig {
    /// Read `config.json` under `dir`; None when absent or unreadable.
    pub fn load(dir: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(dir.join(CONFIG_FILE)).ok()?;
        serde_json::from_str(&text).ok()
    }
}
