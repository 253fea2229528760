//! The update source: one request in, a lazy stream of updates out

use std::{pin::Pin, sync::Arc, time::Duration};

use async_stream::stream;
use serde::Deserialize;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    request::{MessageUpdateRequestOptions, RequestMode},
    transport::{DEFAULT_ENDPOINT, HttpTransport, OutboundRequest, Transport, TransportResponse},
    update::MessageUpdate,
};

/// A stream of message updates
pub type MessageUpdateStream = Pin<Box<dyn Stream<Item = MessageUpdate> + Send>>;

/// Settings for an [`UpdateSource`]
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Endpoint URL used by [`UpdateSource::http`]
    pub endpoint: String,
    pub request_mode: RequestMode,
    /// Pause after the interim update
    pub interim_delay: Duration,
    /// Pause after each token
    pub token_delay: Duration,
    /// Token sent while the answer is being prepared
    pub interim_message: String,
    /// Question asked when the caller supplies no input
    pub default_question: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_mode: RequestMode::Ask,
            interim_delay: Duration::from_millis(500),
            token_delay: Duration::from_millis(80),
            interim_message: "Searching for movies...".to_string(),
            default_question: "Which movie has humans fighting against AI?".to_string(),
        }
    }
}

impl SourceConfig {
    /// Set both pacing delays
    pub fn with_delays(mut self, interim_delay: Duration, token_delay: Duration) -> Self {
        self.interim_delay = interim_delay;
        self.token_delay = token_delay;
        self
    }
}

/// Successful endpoint payload
#[derive(Debug, Deserialize)]
struct AskResponse {
    answer: String,
    #[serde(default)]
    results: Option<Vec<AskResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AskResult {
    title: Option<String>,
    image: Option<String>,
    content: Option<String>,
}

/// Turns requests into streams of [`MessageUpdate`]s
pub struct UpdateSource {
    transport: Arc<dyn Transport>,
    config: SourceConfig,
}

impl UpdateSource {
    /// Create a source over an arbitrary transport
    pub fn new(transport: Arc<dyn Transport>, config: SourceConfig) -> Self {
        Self { transport, config }
    }

    /// Create a source posting over HTTP to `config.endpoint`
    pub fn http(config: SourceConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.endpoint.clone())?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Issue one turn's request and stream its updates.
    ///
    /// Fails before producing anything if the request is rejected or
    /// `cancel` fires while waiting for the response. After that, every
    /// failure surfaces as a terminal `Status` error update, and
    /// cancellation ends the stream without one.
    pub async fn fetch_message_updates(
        &self,
        conversation_id: &str,
        opts: &MessageUpdateRequestOptions,
        cancel: &CancellationToken,
    ) -> Result<MessageUpdateStream> {
        let cancel = cancel.child_token();
        let request = OutboundRequest {
            conversation_id: conversation_id.to_string(),
            body: opts.to_body(self.config.request_mode, &self.config.default_question)?,
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Aborted),
            response = self.transport.send(request) => response?,
        };

        if !response.is_success() {
            let status = response.status();
            let reason = response.reason().to_string();
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Aborted),
                body = response.bytes() => body.unwrap_or_default(),
            };
            let message = rejection_message(status, &reason, &body);
            tracing::warn!(status, conversation_id, "Request rejected: {}", message);
            return Err(Error::rejected(status, message));
        }

        Ok(Box::pin(answer_updates(
            response,
            self.config.clone(),
            cancel,
        )))
    }
}

/// Build the error message for a non-success response
fn rejection_message(status: u16, reason: &str, body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) if !value.is_null() => ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(message_text))
            .unwrap_or_else(|| "API error".to_string()),
        _ => format!("Request failed with status code {}: {}", status, reason),
    }
}

/// Text of a `message`/`error` field, or None when the field is empty
fn message_text(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Render the endpoint payload as markdown
fn format_answer(response: &AskResponse) -> String {
    let mut text = format!("\n\n**{}**\n\n", response.answer);

    if let Some(first) = response.results.as_ref().and_then(|r| r.first()) {
        let title = first.title.as_deref().unwrap_or_default();
        text.push_str(&format!("### {}\n\n", title));
        text.push_str(&format!(
            "![{}]({})\n\n",
            title,
            first.image.as_deref().unwrap_or_default()
        ));
        text.push_str(&format!(
            "{}\n\n",
            first.content.as_deref().unwrap_or_default()
        ));
    }

    text
}

fn decode_answer(body: &[u8]) -> Result<String> {
    let response: AskResponse = serde_json::from_slice(body)?;
    Ok(format_answer(&response))
}

/// Split on single spaces, keeping each space attached to the word before it
/// so that concatenating the tokens yields `text` again.
fn split_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(' ')
}

/// Sleep for `delay` unless cancelled first. Returns false on cancellation.
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn answer_updates(
    response: TransportResponse,
    config: SourceConfig,
    cancel: CancellationToken,
) -> impl Stream<Item = MessageUpdate> + Send {
    stream! {
        // Abandoning the stream cancels the derived token, never the caller's.
        let _guard = cancel.clone().drop_guard();

        if cancel.is_cancelled() {
            return;
        }
        yield MessageUpdate::stream(config.interim_message.clone());

        if !pause(config.interim_delay, &cancel).await {
            tracing::debug!("Cancelled before the response body was read");
            return;
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            body = response.bytes() => body,
        };

        let text = match body.and_then(|b| decode_answer(&b)) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Failed to process response: {}", e);
                yield MessageUpdate::error(format!("Error processing response: {}", e));
                return;
            }
        };

        for token in split_tokens(&text) {
            if cancel.is_cancelled() {
                tracing::debug!("Cancelled mid-stream");
                return;
            }
            yield MessageUpdate::stream(token);

            if !pause(config.token_delay, &cancel).await {
                tracing::debug!("Cancelled mid-stream");
                return;
            }
        }

        yield MessageUpdate::finished();
    }
}
