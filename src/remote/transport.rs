use std::collections::VecDeque;
use std::time::Duration;

use crate::config::EndpointConfig;
use crate::foundation::error::{CutoutError, CutoutResult};

/// Which background-removal endpoint a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Automatic removal of a freshly loaded image.
    RemoveBackground,
    /// Mask-guided re-run.
    Refine,
}

/// One multipart/form-data field carrying a binary file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormPart {
    /// Form field name (`file`, `mask`).
    pub field: &'static str,
    /// Filename attribute.
    pub file_name: String,
    /// MIME type of the part.
    pub content_type: String,
    /// Part body.
    pub bytes: Vec<u8>,
}

/// Status, content type and body of an HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if present.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpReply {
    /// `200 image/png` reply.
    pub fn png(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: Some("image/png".to_string()),
            body,
        }
    }

    /// Error reply with a text body.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain".to_string()),
            body: body.into().into_bytes(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-success reply into [`CutoutError::Http`]; pass successes through.
    pub fn into_result(self) -> CutoutResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(CutoutError::http(
            self.status,
            String::from_utf8_lossy(&self.body).into_owned(),
        ))
    }
}

/// Sends multipart uploads to the background-removal service.
///
/// `Err` means no response arrived at all; HTTP error statuses come back as `Ok(HttpReply)`.
pub trait Transport {
    /// POST `parts` as multipart/form-data to `endpoint`.
    fn post_multipart(&mut self, endpoint: Endpoint, parts: &[FormPart])
    -> CutoutResult<HttpReply>;
}

/// Blocking HTTP transport over `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoints: EndpointConfig,
}

impl HttpTransport {
    /// Build a client with the configured timeout.
    pub fn new(endpoints: EndpointConfig) -> CutoutResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(endpoints.timeout_secs.max(1)))
            .build()
            .map_err(|e| CutoutError::network(format!("build http client: {e}")))?;
        Ok(Self { client, endpoints })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        match endpoint {
            Endpoint::RemoveBackground => self.endpoints.remove_url(),
            Endpoint::Refine => self.endpoints.refine_url(),
        }
    }
}

impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, parts), fields(parts = parts.len()))]
    fn post_multipart(
        &mut self,
        endpoint: Endpoint,
        parts: &[FormPart],
    ) -> CutoutResult<HttpReply> {
        let mut form = reqwest::blocking::multipart::Form::new();
        for p in parts {
            let part = reqwest::blocking::multipart::Part::bytes(p.bytes.clone())
                .file_name(p.file_name.clone())
                .mime_str(&p.content_type)
                .map_err(|e| CutoutError::validation(format!("bad content type: {e}")))?;
            form = form.part(p.field, part);
        }

        let url = self.url(endpoint);
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| CutoutError::network(format!("POST {url}: {e}")))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .map_err(|e| CutoutError::network(format!("read body from {url}: {e}")))?
            .to_vec();
        tracing::info!(%url, status, len = body.len(), "background service replied");
        Ok(HttpReply {
            status,
            content_type,
            body,
        })
    }
}

/// A request seen by [`ScriptedTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Target endpoint.
    pub endpoint: Endpoint,
    /// Parts as sent.
    pub parts: Vec<FormPart>,
}

/// In-memory transport for tests and debugging: replays queued replies in order and records
/// every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: VecDeque<CutoutResult<HttpReply>>,
    repeat_last: Option<HttpReply>,
    requests: Vec<RecordedRequest>,
}

impl ScriptedTransport {
    /// Transport with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    pub fn push_reply(&mut self, reply: HttpReply) -> &mut Self {
        self.replies.push_back(Ok(reply));
        self
    }

    /// Queue a transport-level failure.
    pub fn push_failure(&mut self, err: CutoutError) -> &mut Self {
        self.replies.push_back(Err(err));
        self
    }

    /// Answer with `reply` once the queue is empty.
    pub fn always(&mut self, reply: HttpReply) -> &mut Self {
        self.repeat_last = Some(reply);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }
}

impl Transport for ScriptedTransport {
    fn post_multipart(
        &mut self,
        endpoint: Endpoint,
        parts: &[FormPart],
    ) -> CutoutResult<HttpReply> {
        self.requests.push(RecordedRequest {
            endpoint,
            parts: parts.to_vec(),
        });
        if let Some(next) = self.replies.pop_front() {
            return next;
        }
        self.repeat_last
            .clone()
            .ok_or_else(|| CutoutError::network("scripted transport has no reply queued"))
    }
}
