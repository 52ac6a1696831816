//! Wire protocol types for the four multipart upload endpoints.

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{
    ABORT_PATH, COMPLETE_PATH, HEADER_KEY, HEADER_PART_NUMBER, HEADER_UPLOAD_ID, INITIATE_PATH,
    PART_PATH,
};
pub use messages::{
    AbortRequest, CompleteRequest, CompletedPart, InitiateRequest, InitiateResponse, PartResponse,
};
pub use types::{Phase, SessionRef, UploadStatus};
