//! Config file loading shared by the dataio crates

use serde::de::DeserializeOwned;
use std::path::Path;

/// Load a config struct from a `.toml` or `.json` file, chosen by extension.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match ext.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(&contents)?),
        "json" => Ok(serde_json::from_str(&contents)?),
        _ => anyhow::bail!("Unsupported config file extension: {}", ext),
    }
}
