//! Part planning, file sources, validation and progress math for
//! chunked multipart uploads.

mod chunked;
mod progress;
mod source;
mod validation;

pub use chunked::{PartPlan, PartRange, mb_to_bytes};
pub use progress::{SpeedCalculator, progress_percent};
pub use source::{FileSource, UploadFile};
pub use validation::{ValidationError, ValidationRules, validate_file};

/// Default part size: 5 MiB, the usual multipart minimum.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Bytes per configured megabyte.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid byte range {start}..{end} for file of {size} bytes")]
    InvalidRange { start: u64, end: u64, size: u64 },

    #[error("read task failed: {0}")]
    Join(String),
}
