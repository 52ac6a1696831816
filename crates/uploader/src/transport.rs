//! Transport seam between the upload loop and the server.
//!
//! [`HttpTransport`](crate::HttpTransport) talks to the real endpoints; tests
//! plug in a recording mock. Transports hand back the raw JSON of each
//! response so the host's [`ResponseNormalizer`] can reshape it before it is
//! decoded.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chunkup_protocol::{AbortRequest, CompleteRequest, InitiateRequest, Phase, SessionRef};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::UploaderConfig;
use crate::error::UploadError;

/// Boxed future returned by transport calls.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Host hook that rewrites a raw response before decoding.
///
/// Called synchronously with the phase the response belongs to. It should be
/// a pure function of its inputs.
pub type ResponseNormalizer = Arc<dyn Fn(Phase, Value) -> Value + Send + Sync>;

/// Abstract connection to the upload server.
pub trait UploadTransport: Send + Sync {
    /// `POST initiate` with a JSON body.
    fn initiate<'a>(&'a self, req: &'a InitiateRequest) -> TransportFuture<'a, Value>;

    /// `POST part` with the raw bytes as body.
    fn upload_part<'a>(
        &'a self,
        session: &'a SessionRef,
        part_number: u32,
        data: Vec<u8>,
    ) -> TransportFuture<'a, Value>;

    /// `POST complete` with the ordered parts list.
    fn complete<'a>(&'a self, req: &'a CompleteRequest) -> TransportFuture<'a, Value>;

    /// `POST abort`. The response body is ignored.
    fn abort<'a>(&'a self, req: &'a AbortRequest) -> TransportFuture<'a, ()>;

    /// Picks up a new configuration (base URL, token).
    fn apply_config(&self, _config: &UploaderConfig) -> Result<(), UploadError> {
        Ok(())
    }
}

/// Runs `fut` until it finishes or `cancel` fires.
///
/// On cancellation the future is dropped, which aborts the request at the
/// transport level.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: TransportFuture<'_, T>,
) -> Result<T, UploadError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(UploadError::Cancelled),
        result = fut => result,
    }
}

/// Applies the normalizer, then decodes the response for `phase`.
pub(crate) fn decode<T: DeserializeOwned>(
    phase: Phase,
    raw: Value,
    normalizer: Option<&ResponseNormalizer>,
) -> Result<T, UploadError> {
    let value = match normalizer {
        Some(normalize) => normalize(phase, raw),
        None => raw,
    };
    serde_json::from_value(value).map_err(|e| UploadError::InvalidResponse {
        phase,
        reason: e.to_string(),
    })
}
