//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chunkup_protocol::{AbortRequest, CompleteRequest, InitiateRequest, SessionRef};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::UploadError;
use crate::transport::{TransportFuture, UploadTransport};

/// A request observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Initiate(InitiateRequest),
    Part {
        upload_id: String,
        key: String,
        part_number: u32,
        len: usize,
    },
    Complete(CompleteRequest),
    Abort(AbortRequest),
}

/// Pauses part uploads until released.
#[derive(Default)]
pub(crate) struct Gate {
    pub reached: Notify,
    pub release: Notify,
}

/// In-memory server that records every request.
///
/// Session ids are `upload-<n>` in initiate order; keys are
/// `uploads/<fileName>`; etags are `"etag-<part>"`.
#[derive(Default)]
pub(crate) struct MockTransport {
    calls: Mutex<Vec<Call>>,
    pub fail_initiate: AtomicBool,
    pub fail_complete: AtomicBool,
    pub fail_abort: AtomicBool,
    /// Part number that answers 500, for any file.
    pub fail_part: Mutex<Option<u32>>,
    /// Replaces the initiate response body.
    pub initiate_body: Mutex<Option<Value>>,
    /// Replaces the part response body.
    pub part_body: Mutex<Option<Value>>,
    pub part_gate: Option<Gate>,
    /// Runs to completion inside the next `initiate`, after the request is
    /// recorded and before the response is returned.
    pub during_initiate: Mutex<Option<Pin<Box<dyn Future<Output = ()> + Send>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            part_gate: Some(Gate::default()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn part_numbers(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Part { part_number, .. } => Some(part_number),
                _ => None,
            })
            .collect()
    }

    pub fn part_lens(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Part { len, .. } => Some(len),
                _ => None,
            })
            .collect()
    }

    pub fn aborts(&self) -> Vec<AbortRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Abort(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn initiate_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Initiate(_)))
            .count()
    }
}

fn server_error(endpoint: &'static str) -> UploadError {
    UploadError::Status {
        endpoint,
        status: 500,
        body: "mock failure".into(),
    }
}

impl UploadTransport for MockTransport {
    fn initiate<'a>(&'a self, req: &'a InitiateRequest) -> TransportFuture<'a, Value> {
        Box::pin(async move {
            self.record(Call::Initiate(req.clone()));
            let hook = self.during_initiate.lock().unwrap().take();
            if let Some(hook) = hook {
                hook.await;
            }
            if self.fail_initiate.load(Ordering::SeqCst) {
                return Err(server_error(chunkup_protocol::INITIATE_PATH));
            }
            if let Some(body) = self.initiate_body.lock().unwrap().clone() {
                return Ok(body);
            }
            let n = self.initiate_count();
            Ok(json!({
                "uploadId": format!("upload-{n}"),
                "key": format!("uploads/{}", req.file_name),
            }))
        })
    }

    fn upload_part<'a>(
        &'a self,
        session: &'a SessionRef,
        part_number: u32,
        data: Vec<u8>,
    ) -> TransportFuture<'a, Value> {
        Box::pin(async move {
            if let Some(gate) = &self.part_gate {
                gate.reached.notify_one();
                gate.release.notified().await;
            }
            self.record(Call::Part {
                upload_id: session.upload_id.clone(),
                key: session.key.clone(),
                part_number,
                len: data.len(),
            });
            if *self.fail_part.lock().unwrap() == Some(part_number) {
                return Err(server_error(chunkup_protocol::PART_PATH));
            }
            if let Some(body) = self.part_body.lock().unwrap().clone() {
                return Ok(body);
            }
            Ok(json!({ "etag": format!("\"etag-{part_number}\"") }))
        })
    }

    fn complete<'a>(&'a self, req: &'a CompleteRequest) -> TransportFuture<'a, Value> {
        Box::pin(async move {
            self.record(Call::Complete(req.clone()));
            if self.fail_complete.load(Ordering::SeqCst) {
                return Err(server_error(chunkup_protocol::COMPLETE_PATH));
            }
            Ok(json!({ "location": format!("https://cdn.example.com/{}", req.key) }))
        })
    }

    fn abort<'a>(&'a self, req: &'a AbortRequest) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            self.record(Call::Abort(req.clone()));
            if self.fail_abort.load(Ordering::SeqCst) {
                return Err(server_error(chunkup_protocol::ABORT_PATH));
            }
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// Raw HTTP mock server
// ---------------------------------------------------------------------------

/// A request received by [`mock_http_server`].
#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    /// Header value by lower-case name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Starts a mock HTTP server that answers one connection per entry of
/// `responses`, in order, then returns every request it captured.
pub(crate) async fn mock_http_server(
    responses: Vec<(u16, String)>,
) -> (String, JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}");

    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let Some(request) = read_request(&mut stream).await else {
                break;
            };
            captured.push(request);

            let resp = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        captured
    });

    (url, handle)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Some(CapturedRequest {
        method,
        path,
        headers,
        body,
    })
}
