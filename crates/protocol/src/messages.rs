use serde::{Deserialize, Serialize};

use crate::types::SessionRef;

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Starts a new multipart session for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub file_name: String,
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

/// One acknowledged part, in the order it was uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// Asks the server to assemble the listed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub upload_id: String,
    pub key: String,
    pub parts: Vec<CompletedPart>,
}

impl CompleteRequest {
    pub fn new(session: &SessionRef, parts: Vec<CompletedPart>) -> Self {
        Self {
            upload_id: session.upload_id.clone(),
            key: session.key.clone(),
            parts,
        }
    }
}

/// Discards a session and whatever parts the server holds for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortRequest {
    pub upload_id: String,
    pub key: String,
}

impl From<&SessionRef> for AbortRequest {
    fn from(session: &SessionRef) -> Self {
        Self {
            upload_id: session.upload_id.clone(),
            key: session.key.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Response to `initiate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub upload_id: String,
    pub key: String,
}

impl From<InitiateResponse> for SessionRef {
    fn from(resp: InitiateResponse) -> Self {
        SessionRef {
            upload_id: resp.upload_id,
            key: resp.key,
        }
    }
}

/// Per-part acknowledgment. The tag is opaque to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartResponse {
    pub etag: String,
}
