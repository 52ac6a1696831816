//! HTTP transport for the upload endpoints.
//!
//! Async client using `reqwest` with optional Bearer authentication.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chunkup_protocol::{
    ABORT_PATH, AbortRequest, COMPLETE_PATH, CompleteRequest, HEADER_KEY, HEADER_PART_NUMBER,
    HEADER_UPLOAD_ID, INITIATE_PATH, InitiateRequest, PART_PATH, SessionRef,
};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;

use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::transport::{TransportFuture, UploadTransport};

/// Time allowed to establish a connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    token: Option<String>,
}

impl Endpoint {
    fn from_config(config: &UploaderConfig) -> Result<Self, UploadError> {
        let base_url = config.server_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(UploadError::Config(format!(
                "server URL must be http(s): {:?}",
                config.server_url
            )));
        }
        Ok(Self {
            base_url,
            token: config.bearer_token().map(str::to_string),
        })
    }
}

/// Upload transport over HTTP.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: RwLock<Endpoint>,
}

impl HttpTransport {
    /// Creates a transport for the server and token in `config`.
    pub fn new(config: &UploaderConfig) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: RwLock::new(Endpoint::from_config(config)?),
        })
    }

    /// Current base URL.
    pub fn base_url(&self) -> String {
        self.endpoint().base_url
    }

    fn endpoint(&self) -> Endpoint {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let endpoint = self.endpoint();
        let req = self.http.post(format!("{}{}", endpoint.base_url, path));
        match endpoint.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Sends a request and parses the JSON body of a 2xx response.
    ///
    /// An empty body parses as `null`.
    async fn send(&self, path: &'static str, req: reqwest::RequestBuilder) -> Result<Value, UploadError> {
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Status {
                endpoint: path,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        debug!(endpoint = path, status = status.as_u16(), len = bytes.len(), "response");
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl UploadTransport for HttpTransport {
    fn initiate<'a>(&'a self, req: &'a InitiateRequest) -> TransportFuture<'a, Value> {
        Box::pin(async move {
            let builder = self.post(INITIATE_PATH).json(req);
            self.send(INITIATE_PATH, builder).await
        })
    }

    fn upload_part<'a>(
        &'a self,
        session: &'a SessionRef,
        part_number: u32,
        data: Vec<u8>,
    ) -> TransportFuture<'a, Value> {
        Box::pin(async move {
            let builder = self
                .post(PART_PATH)
                .header(HEADER_UPLOAD_ID, &session.upload_id)
                .header(HEADER_KEY, &session.key)
                .header(HEADER_PART_NUMBER, part_number.to_string())
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(data);
            self.send(PART_PATH, builder).await
        })
    }

    fn complete<'a>(&'a self, req: &'a CompleteRequest) -> TransportFuture<'a, Value> {
        Box::pin(async move {
            let builder = self.post(COMPLETE_PATH).json(req);
            self.send(COMPLETE_PATH, builder).await
        })
    }

    fn abort<'a>(&'a self, req: &'a AbortRequest) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let resp = self.post(ABORT_PATH).json(req).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(UploadError::Status {
                    endpoint: ABORT_PATH,
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(())
        })
    }

    fn apply_config(&self, config: &UploaderConfig) -> Result<(), UploadError> {
        let endpoint = Endpoint::from_config(config)?;
        *self.endpoint.write().unwrap_or_else(PoisonError::into_inner) = endpoint;
        Ok(())
    }
}
