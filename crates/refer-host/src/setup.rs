use crate::config::{default_name, CONFIG_FILE};
use refer_core::store::to_indented_json;
use refer_core::LibraryError;
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the host-registration descriptor written next to the store.
pub const MANIFEST_FILE: &str = "refer_host.json";

/// Host name the browser resolves `runtime.connectNative` against.
pub const HOST_NAME: &str = "refer_host";

/// Extension id allowed to talk to this host.
pub const EXTENSION_ID: &str = "refer_extension@example.org";

/// Native-messaging registration descriptor. Consumed by the hosting
/// browser environment, never by the host itself.
#[derive(Debug, Serialize)]
pub struct HostManifest {
    pub name: String,
    pub description: String,
    /// Absolute path to the message-loop entry point.
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: String,
    pub allowed_extensions: Vec<String>,
}

impl HostManifest {
    pub fn for_current_exe() -> Result<Self, LibraryError> {
        Ok(Self {
            name: HOST_NAME.to_string(),
            description: "Reference library updater".to_string(),
            path: env::current_exe()?,
            kind: "stdio".to_string(),
            allowed_extensions: vec![EXTENSION_ID.to_string()],
        })
    }
}

/// One-time setup: write `config.json` (merged over any existing one, so
/// front-end keys survive) and the host manifest at the store root.
pub fn run(dir: &Path) -> Result<(), LibraryError> {
    let dir = fs::canonicalize(dir)?;

    let mut config = match fs::read_to_string(dir.join(CONFIG_FILE)) {
        Ok(text) => serde_json::from_str::<serde_json::Map<String, Value>>(&text)?,
        Err(_) => serde_json::Map::new(),
    };
    config.insert(
        "dir".to_string(),
        Value::from(dir.display().to_string()),
    );
    config.insert("name".to_string(), Value::from(default_name()));
    fs::write(dir.join(CONFIG_FILE), to_indented_json(&config)?)?;

    let manifest = HostManifest::for_current_exe()?;
    fs::write(dir.join(MANIFEST_FILE), to_indented_json(&manifest)?)?;
    Ok(())
}
