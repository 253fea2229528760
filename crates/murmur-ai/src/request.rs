//! Request options and outbound body construction

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    transport::{FilePart, RequestBody},
};

/// How the outbound request body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    /// JSON `{"question": ...}` body
    #[default]
    Ask,
    /// Multipart form with a `data` options part plus one part per file
    Multipart,
}

/// How a [`MessageFile`] value is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFileKind {
    /// Value is a content hash of a previously uploaded file
    Hash,
    /// Value is the base64-encoded file contents
    Base64,
}

impl MessageFileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFileKind::Hash => "hash",
            MessageFileKind::Base64 => "base64",
        }
    }
}

/// An attachment supplied with a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageFile {
    #[serde(rename = "type")]
    pub kind: MessageFileKind,
    pub name: String,
    pub mime: String,
    pub value: String,
}

impl MessageFile {
    /// Create a base64 attachment from raw bytes
    pub fn base64(name: impl Into<String>, mime: impl Into<String>, contents: &[u8]) -> Self {
        Self {
            kind: MessageFileKind::Base64,
            name: name.into(),
            mime: mime.into(),
            value: base64::engine::general_purpose::STANDARD.encode(contents),
        }
    }

    /// Create an attachment referring to an already uploaded file
    pub fn hash(name: impl Into<String>, mime: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            kind: MessageFileKind::Hash,
            name: name.into(),
            mime: mime.into(),
            value: hash.into(),
        }
    }

    /// Form part file name, embedding the value encoding ahead of the name
    pub fn part_name(&self) -> String {
        format!("{};{}", self.kind.as_str(), self.name)
    }

    fn to_part(&self) -> FilePart {
        FilePart {
            file_name: self.part_name(),
            mime: self.mime.clone(),
            contents: self.value.clone().into_bytes(),
        }
    }
}

/// Options for one conversation turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageUpdateRequestOptions {
    /// User prompt text
    pub inputs: Option<String>,
    /// Message being retried or continued
    pub message_id: Option<String>,
    pub is_retry: bool,
    pub is_continue: bool,
    pub web_search: bool,
    /// Names of tools the assistant may call
    pub tools: Option<Vec<String>>,
    pub files: Vec<MessageFile>,
}

/// Options JSON sent as the `data` part of a multipart request
#[derive(Serialize)]
struct RequestData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    inputs: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    is_retry: bool,
    is_continue: bool,
    web_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [String]>,
}

impl MessageUpdateRequestOptions {
    /// Create options for a plain prompt
    pub fn new(inputs: impl Into<String>) -> Self {
        Self {
            inputs: Some(inputs.into()),
            ..Default::default()
        }
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    /// Enable a tool by name
    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn with_file(mut self, file: MessageFile) -> Self {
        self.files.push(file);
        self
    }

    /// Mark this turn as a retry of `message_id`
    pub fn retry(mut self, message_id: impl Into<String>) -> Self {
        self.is_retry = true;
        self.message_id = Some(message_id.into());
        self
    }

    /// Mark this turn as a continuation of `message_id`
    pub fn continuation(mut self, message_id: impl Into<String>) -> Self {
        self.is_continue = true;
        self.message_id = Some(message_id.into());
        self
    }

    /// The question to ask, falling back when no input was supplied
    pub fn question<'a>(&'a self, default_question: &'a str) -> &'a str {
        self.inputs
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(default_question)
    }

    /// Encode these options as an outbound request body
    pub fn to_body(&self, mode: RequestMode, default_question: &str) -> Result<RequestBody> {
        match mode {
            RequestMode::Ask => Ok(RequestBody::Json(serde_json::json!({
                "question": self.question(default_question),
            }))),
            RequestMode::Multipart => {
                let data = serde_json::to_string(&RequestData {
                    inputs: self.inputs.as_deref(),
                    id: self.message_id.as_deref(),
                    is_retry: self.is_retry,
                    is_continue: self.is_continue,
                    web_search: self.web_search,
                    tools: self.tools.as_deref(),
                })?;
                Ok(RequestBody::Multipart {
                    data,
                    files: self.files.iter().map(MessageFile::to_part).collect(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ask_body_uses_inputs() {
        let opts = MessageUpdateRequestOptions::new("test");
        match opts.to_body(RequestMode::Ask, "fallback").unwrap() {
            RequestBody::Json(v) => assert_eq!(v, json!({"question": "test"})),
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_ask_body_falls_back_on_missing_or_empty_input() {
        let opts = MessageUpdateRequestOptions::default();
        assert_eq!(opts.question("fallback"), "fallback");

        let opts = MessageUpdateRequestOptions::new("");
        assert_eq!(opts.question("fallback"), "fallback");
    }

    #[test]
    fn test_multipart_body_carries_options_and_files() {
        let opts = MessageUpdateRequestOptions::new("hi")
            .retry("msg-1")
            .with_web_search(true)
            .with_tool("calculator")
            .with_file(MessageFile::base64("a.txt", "text/plain", b"abc"));

        match opts.to_body(RequestMode::Multipart, "fallback").unwrap() {
            RequestBody::Multipart { data, files } => {
                let data: serde_json::Value = serde_json::from_str(&data).unwrap();
                assert_eq!(
                    data,
                    json!({
                        "inputs": "hi",
                        "id": "msg-1",
                        "is_retry": true,
                        "is_continue": false,
                        "web_search": true,
                        "tools": ["calculator"],
                    })
                );
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].file_name, "base64;a.txt");
                assert_eq!(files[0].mime, "text/plain");
                assert_eq!(files[0].contents, b"YWJj");
            }
            other => panic!("expected multipart body, got {:?}", other),
        }
    }

    #[test]
    fn test_multipart_omits_unset_fields() {
        let opts = MessageUpdateRequestOptions::default();
        match opts.to_body(RequestMode::Multipart, "fallback").unwrap() {
            RequestBody::Multipart { data, files } => {
                let data: serde_json::Value = serde_json::from_str(&data).unwrap();
                assert!(data.get("inputs").is_none());
                assert!(data.get("tools").is_none());
                assert!(files.is_empty());
            }
            other => panic!("expected multipart body, got {:?}", other),
        }
    }

    #[test]
    fn test_hash_file_part_name() {
        let file = MessageFile::hash("photo.png", "image/png", "deadbeef");
        assert_eq!(file.part_name(), "hash;photo.png");
        let v = serde_json::to_value(&file).unwrap();
        assert_eq!(v["type"], "hash");
    }
}
