//! Chunked multipart upload client.
//!
//! The host queues files, starts a batch and listens for events. Each file
//! goes through the same three phases against the server:
//!
//! 1. **Initiate**: obtain an upload session id and destination key
//! 2. **Parts**: send fixed-size byte ranges in order, one at a time
//! 3. **Complete**: hand the ordered `{partNumber, etag}` list back
//!
//! Files in a batch are uploaded strictly one after another. A batch shares
//! one cancellation token; [`Uploader::abort_upload`] signals it, asks the
//! server to discard every started session and marks the affected tasks
//! `aborted`.

pub mod config;
pub mod error;
mod file_upload;
pub mod http;
pub mod preview;
pub mod table;
pub mod transport;
pub mod types;
pub mod uploader;

#[cfg(test)]
pub(crate) mod testing;

// Re-export primary types for convenience.
pub use chunkup_protocol::{Phase, SessionRef, UploadStatus};
pub use chunkup_transfer::{FileSource, UploadFile};
pub use config::UploaderConfig;
pub use error::UploadError;
pub use http::HttpTransport;
pub use table::TaskTable;
pub use transport::{ResponseNormalizer, TransportFuture, UploadTransport};
pub use types::{UploadEvent, UploadTask};
pub use uploader::{ABORT_REASON, Uploader};
