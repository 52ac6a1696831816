//! CLI configuration.
//!
//! Settings live in a TOML file under an `[upload]` table:
//! - Linux: `~/.config/chunkup/config.toml`
//! - Windows: `%APPDATA%/chunkup/config.toml`
//!
//! Command-line flags and their environment variables win over the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chunkup_uploader::UploaderConfig;
use serde::{Deserialize, Serialize};

/// On-disk configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub upload: UploaderConfig,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub auth_token: Option<String>,
    pub chunk_size_mb: Option<u64>,
    pub folder: Option<String>,
}

impl Overrides {
    pub fn apply(self, config: &mut UploaderConfig) {
        if let Some(url) = self.server_url {
            config.server_url = url;
        }
        if let Some(token) = self.auth_token {
            config.auth_token = Some(token);
        }
        if let Some(mb) = self.chunk_size_mb {
            config.chunk_size_mb = mb;
        }
        if let Some(folder) = self.folder {
            config.folder = Some(folder);
        }
    }
}

/// Loads the upload settings from `path`, or from the platform default.
///
/// A missing file yields the defaults.
pub fn load(path: Option<&Path>) -> anyhow::Result<UploaderConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(UploaderConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let file: ConfigFile =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(file.upload)
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("chunkup").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("chunkup")
            .join("config.toml")
    }
}
