//! Message update event types

use serde::{Deserialize, Serialize};

/// One discrete event in a message-update stream.
///
/// Serialized with a `type` tag; the `WebSearch` and `Tool` variants carry
/// a second `subtype` tag flattened next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageUpdate {
    /// Incremental text fragment to append to the response
    Stream { token: String },
    /// Lifecycle signal
    Status {
        status: MessageUpdateStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Web search progress
    WebSearch(WebSearchUpdate),
    /// Tool invocation progress
    Tool(ToolUpdate),
}

/// Status carried by a `Status` update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageUpdateStatus {
    Finished,
    Error,
}

/// Web search sub-events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "camelCase")]
pub enum WebSearchUpdate {
    Update(WebSearchGeneralUpdate),
    Sources(WebSearchSourcesUpdate),
    Error(WebSearchErrorUpdate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchGeneralUpdate {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchSourcesUpdate {
    pub message: String,
    #[serde(default)]
    pub sources: Vec<WebSearchSource>,
}

/// A page consulted during web search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchErrorUpdate {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Tool invocation sub-events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "camelCase")]
pub enum ToolUpdate {
    Call(ToolCallUpdate),
    Result(ToolResultUpdate),
    Error(ToolErrorUpdate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallUpdate {
    pub uuid: String,
    pub call: ToolCall,
}

/// A tool the assistant asked to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultUpdate {
    pub uuid: String,
    pub result: ToolResult,
}

/// Outcome of a tool run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolResultStatus,
    #[serde(default)]
    pub outputs: Vec<serde_json::Value>,
    #[serde(default)]
    pub display: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolResultStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolErrorUpdate {
    pub uuid: String,
    pub message: String,
}

impl MessageUpdate {
    /// Create a text token update
    pub fn stream(token: impl Into<String>) -> Self {
        Self::Stream {
            token: token.into(),
        }
    }

    /// Create a successful terminal status
    pub fn finished() -> Self {
        Self::Status {
            status: MessageUpdateStatus::Finished,
            message: None,
        }
    }

    /// Create a failed terminal status
    pub fn error(message: impl Into<String>) -> Self {
        Self::Status {
            status: MessageUpdateStatus::Error,
            message: Some(message.into()),
        }
    }

    /// Check if this is a terminal status update
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageUpdate::Status { .. })
    }

    /// Get the token if this is a `Stream` update
    pub fn as_token(&self) -> Option<&str> {
        match self {
            MessageUpdate::Stream { token } => Some(token),
            _ => None,
        }
    }
}

/// Folds a stream of updates into the rendered response.
///
/// Updates never reference earlier updates, so anything that wants the whole
/// response has to accumulate it; this is the canonical way to do that.
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    text: String,
    status: Option<MessageUpdateStatus>,
    error: Option<String>,
    web_sources: Vec<WebSearchSource>,
    tool_calls: Vec<ToolCallUpdate>,
}

impl ResponseBuilder {
    /// Create a new response builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one update
    pub fn process_update(&mut self, update: &MessageUpdate) {
        match update {
            MessageUpdate::Stream { token } => self.text.push_str(token),
            MessageUpdate::Status { status, message } => {
                self.status = Some(*status);
                if *status == MessageUpdateStatus::Error {
                    self.error = message.clone();
                }
            }
            MessageUpdate::WebSearch(WebSearchUpdate::Sources(sources)) => {
                self.web_sources.extend(sources.sources.iter().cloned());
            }
            MessageUpdate::Tool(ToolUpdate::Call(call)) => {
                self.tool_calls.push(call.clone());
            }
            MessageUpdate::WebSearch(_) | MessageUpdate::Tool(_) => {}
        }
    }

    /// Text accumulated so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Terminal status, once seen
    pub fn status(&self) -> Option<MessageUpdateStatus> {
        self.status
    }

    /// Error message from a failed terminal status
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn web_sources(&self) -> &[WebSearchSource] {
        &self.web_sources
    }

    pub fn tool_calls(&self) -> &[ToolCallUpdate] {
        &self.tool_calls
    }

    /// Whether a terminal status has been seen
    pub fn is_complete(&self) -> bool {
        self.status.is_some()
    }

    /// Consume the builder, returning the accumulated text
    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stream_wire_format() {
        let v = serde_json::to_value(MessageUpdate::stream("hi ")).unwrap();
        assert_eq!(v, json!({"type": "stream", "token": "hi "}));
    }

    #[test]
    fn test_status_wire_format_omits_empty_message() {
        let v = serde_json::to_value(MessageUpdate::finished()).unwrap();
        assert_eq!(v, json!({"type": "status", "status": "finished"}));

        let v = serde_json::to_value(MessageUpdate::error("boom")).unwrap();
        assert_eq!(
            v,
            json!({"type": "status", "status": "error", "message": "boom"})
        );
    }

    #[test]
    fn test_nested_subtype_is_flattened() {
        let update = MessageUpdate::Tool(ToolUpdate::Call(ToolCallUpdate {
            uuid: "t1".into(),
            call: ToolCall {
                name: "calculator".into(),
                parameters: json!({"expr": "1+1"}),
            },
        }));
        let v = serde_json::to_value(&update).unwrap();
        assert_eq!(v["type"], "tool");
        assert_eq!(v["subtype"], "call");
        assert_eq!(v["call"]["name"], "calculator");
    }

    #[test]
    fn test_parse_web_search_sources() {
        let raw = r#"{
            "type": "webSearch",
            "subtype": "sources",
            "message": "sources",
            "sources": [{"title": "Example", "link": "https://example.com"}]
        }"#;
        let update: MessageUpdate = serde_json::from_str(raw).unwrap();
        match update {
            MessageUpdate::WebSearch(WebSearchUpdate::Sources(s)) => {
                assert_eq!(s.sources.len(), 1);
                assert_eq!(s.sources[0].link, "https://example.com");
            }
            other => panic!("expected sources update, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_subtype() {
        let raw = r#"{"type": "tool", "subtype": "progress", "uuid": "x"}"#;
        assert!(serde_json::from_str::<MessageUpdate>(raw).is_err());
    }

    #[test]
    fn test_is_terminal() {
        assert!(MessageUpdate::finished().is_terminal());
        assert!(MessageUpdate::error("x").is_terminal());
        assert!(!MessageUpdate::stream("x").is_terminal());
    }

    #[test]
    fn test_builder_folds_tokens_and_status() {
        let mut builder = ResponseBuilder::new();
        for update in [
            MessageUpdate::stream("Hello "),
            MessageUpdate::stream("world"),
            MessageUpdate::error("decode failed"),
        ] {
            builder.process_update(&update);
        }
        assert_eq!(builder.text(), "Hello world");
        assert_eq!(builder.status(), Some(MessageUpdateStatus::Error));
        assert_eq!(builder.error(), Some("decode failed"));
        assert!(builder.is_complete());
    }

    #[test]
    fn test_builder_collects_sources_and_tool_calls() {
        let mut builder = ResponseBuilder::new();
        builder.process_update(&MessageUpdate::WebSearch(WebSearchUpdate::Sources(
            WebSearchSourcesUpdate {
                message: "found".into(),
                sources: vec![WebSearchSource {
                    title: None,
                    link: "https://a.test".into(),
                }],
            },
        )));
        builder.process_update(&MessageUpdate::Tool(ToolUpdate::Call(ToolCallUpdate {
            uuid: "1".into(),
            call: ToolCall {
                name: "fetch".into(),
                parameters: serde_json::Value::Null,
            },
        })));
        assert_eq!(builder.web_sources().len(), 1);
        assert_eq!(builder.tool_calls()[0].call.name, "fetch");
        assert!(!builder.is_complete());
    }
}
