//! Upload client configuration.

use chunkup_transfer::{ValidationRules, mb_to_bytes};
use serde::{Deserialize, Serialize};

/// Settings consumed by the upload client.
///
/// Changes made through [`Uploader::set_config`](crate::Uploader::set_config)
/// apply to the next enqueue or batch start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Base URL of the upload server; endpoint paths are appended to it.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Part size in megabytes. The server enforces its own minimum.
    #[serde(default = "default_chunk_size_mb")]
    pub chunk_size_mb: u64,

    /// Sent as `Authorization: Bearer <token>` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Accepted file extensions. Empty accepts everything.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_extensions: Vec<String>,

    /// Maximum file size in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size_mb: Option<u64>,

    /// Destination folder passed to `initiate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    /// Accept only the first file of each `add_files` call.
    #[serde(default)]
    pub single_file: bool,

    /// Largest image, in bytes, for which a data-URL preview is built.
    #[serde(default = "default_preview_max_bytes")]
    pub preview_max_bytes: u64,
}

fn default_server_url() -> String {
    "http://localhost:3000".into()
}

fn default_chunk_size_mb() -> u64 {
    5
}

fn default_preview_max_bytes() -> u64 {
    2 * 1024 * 1024
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            chunk_size_mb: default_chunk_size_mb(),
            auth_token: None,
            allowed_extensions: Vec::new(),
            max_file_size_mb: None,
            folder: None,
            single_file: false,
            preview_max_bytes: default_preview_max_bytes(),
        }
    }
}

impl UploaderConfig {
    /// Part size in bytes.
    pub fn chunk_size_bytes(&self) -> u64 {
        mb_to_bytes(self.chunk_size_mb)
    }

    /// Client-side validation rules derived from this config.
    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            allowed_extensions: self.allowed_extensions.clone(),
            max_file_size_mb: self.max_file_size_mb,
        }
    }

    /// Bearer token, ignoring blank values.
    pub fn bearer_token(&self) -> Option<&str> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
