//! Transport abstraction for reaching the inference endpoint

use std::{fmt, future::Future, pin::Pin};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::error::{Error, Result};

/// Default inference endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/ask";

/// A request ready to be sent
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Conversation this turn belongs to
    pub conversation_id: String,
    pub body: RequestBody,
}

/// Encoded request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart { data: String, files: Vec<FilePart> },
}

/// One attached file in a multipart body
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub file_name: String,
    pub mime: String,
    pub contents: Vec<u8>,
}

type BodyFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send>>;

/// Response head plus a body that is only read when asked for
pub struct TransportResponse {
    status: u16,
    reason: String,
    body: BodyFuture,
}

impl TransportResponse {
    /// Create a response whose body is produced by `body`
    pub fn new(
        status: u16,
        reason: impl Into<String>,
        body: impl Future<Output = Result<Vec<u8>>> + Send + 'static,
    ) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: Box::pin(body),
        }
    }

    /// Create a response with an already buffered body
    pub fn from_bytes(status: u16, reason: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self::new(status, reason, async move { Ok(body) })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase accompanying the status
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the full body
    pub async fn bytes(self) -> Result<Vec<u8>> {
        self.body.await
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Sends one request and hands back the response.
///
/// Dropping the returned future must abort the request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse>;
}

/// HTTP transport backed by reqwest
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport posting to `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    /// Create a transport with a preconfigured client
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("endpoint is empty".to_string()));
        }
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse> {
        tracing::debug!(
            conversation_id = %request.conversation_id,
            "POST {}",
            self.endpoint
        );

        let builder = self.client.post(&self.endpoint);
        let builder = match request.body {
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { data, files } => {
                let mut form = Form::new();
                for file in files {
                    let part = Part::bytes(file.contents)
                        .file_name(file.file_name)
                        .mime_str(&file.mime)?;
                    form = form.part("files", part);
                }
                builder.multipart(form.text("data", data))
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();

        Ok(TransportResponse::new(status.as_u16(), reason, async move {
            Ok(response.bytes().await?.to_vec())
        }))
    }
}
