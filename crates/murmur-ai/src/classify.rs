//! Predicates for dispatching on update kind
//!
//! Each `is_*` predicate checks the outer tag and, for nested variants, the
//! inner subtype. The matching `as_*` accessor narrows to the leaf payload.

use crate::update::{
    MessageUpdate, ToolCallUpdate, ToolErrorUpdate, ToolResultUpdate, ToolUpdate,
    WebSearchErrorUpdate, WebSearchGeneralUpdate, WebSearchSourcesUpdate, WebSearchUpdate,
};

/// Leaf kinds of [`MessageUpdate`], one per concrete variant/subtype pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Stream,
    Status,
    WebSearchGeneral,
    WebSearchSources,
    WebSearchError,
    ToolCall,
    ToolResult,
    ToolError,
}

impl UpdateKind {
    /// All leaf kinds
    pub const ALL: [UpdateKind; 8] = [
        UpdateKind::Stream,
        UpdateKind::Status,
        UpdateKind::WebSearchGeneral,
        UpdateKind::WebSearchSources,
        UpdateKind::WebSearchError,
        UpdateKind::ToolCall,
        UpdateKind::ToolResult,
        UpdateKind::ToolError,
    ];

    pub fn is_web_search(self) -> bool {
        matches!(
            self,
            UpdateKind::WebSearchGeneral | UpdateKind::WebSearchSources | UpdateKind::WebSearchError
        )
    }

    pub fn is_tool(self) -> bool {
        matches!(
            self,
            UpdateKind::ToolCall | UpdateKind::ToolResult | UpdateKind::ToolError
        )
    }
}

impl MessageUpdate {
    /// Classify this update into its leaf kind
    pub fn kind(&self) -> UpdateKind {
        match self {
            MessageUpdate::Stream { .. } => UpdateKind::Stream,
            MessageUpdate::Status { .. } => UpdateKind::Status,
            MessageUpdate::WebSearch(WebSearchUpdate::Update(_)) => UpdateKind::WebSearchGeneral,
            MessageUpdate::WebSearch(WebSearchUpdate::Sources(_)) => UpdateKind::WebSearchSources,
            MessageUpdate::WebSearch(WebSearchUpdate::Error(_)) => UpdateKind::WebSearchError,
            MessageUpdate::Tool(ToolUpdate::Call(_)) => UpdateKind::ToolCall,
            MessageUpdate::Tool(ToolUpdate::Result(_)) => UpdateKind::ToolResult,
            MessageUpdate::Tool(ToolUpdate::Error(_)) => UpdateKind::ToolError,
        }
    }
}

pub fn is_web_search_update(update: &MessageUpdate) -> bool {
    as_web_search_update(update).is_some()
}

pub fn is_web_search_general_update(update: &MessageUpdate) -> bool {
    as_web_search_general_update(update).is_some()
}

pub fn is_web_search_sources_update(update: &MessageUpdate) -> bool {
    as_web_search_sources_update(update).is_some()
}

pub fn is_web_search_error_update(update: &MessageUpdate) -> bool {
    as_web_search_error_update(update).is_some()
}

pub fn is_tool_update(update: &MessageUpdate) -> bool {
    as_tool_update(update).is_some()
}

pub fn is_tool_call_update(update: &MessageUpdate) -> bool {
    as_tool_call_update(update).is_some()
}

pub fn is_tool_result_update(update: &MessageUpdate) -> bool {
    as_tool_result_update(update).is_some()
}

pub fn is_tool_error_update(update: &MessageUpdate) -> bool {
    as_tool_error_update(update).is_some()
}

pub fn as_web_search_update(update: &MessageUpdate) -> Option<&WebSearchUpdate> {
    match update {
        MessageUpdate::WebSearch(inner) => Some(inner),
        _ => None,
    }
}

pub fn as_web_search_general_update(update: &MessageUpdate) -> Option<&WebSearchGeneralUpdate> {
    match as_web_search_update(update)? {
        WebSearchUpdate::Update(u) => Some(u),
        _ => None,
    }
}

pub fn as_web_search_sources_update(update: &MessageUpdate) -> Option<&WebSearchSourcesUpdate> {
    match as_web_search_update(update)? {
        WebSearchUpdate::Sources(u) => Some(u),
        _ => None,
    }
}

pub fn as_web_search_error_update(update: &MessageUpdate) -> Option<&WebSearchErrorUpdate> {
    match as_web_search_update(update)? {
        WebSearchUpdate::Error(u) => Some(u),
        _ => None,
    }
}

pub fn as_tool_update(update: &MessageUpdate) -> Option<&ToolUpdate> {
    match update {
        MessageUpdate::Tool(inner) => Some(inner),
        _ => None,
    }
}

pub fn as_tool_call_update(update: &MessageUpdate) -> Option<&ToolCallUpdate> {
    match as_tool_update(update)? {
        ToolUpdate::Call(u) => Some(u),
        _ => None,
    }
}

pub fn as_tool_result_update(update: &MessageUpdate) -> Option<&ToolResultUpdate> {
    match as_tool_update(update)? {
        ToolUpdate::Result(u) => Some(u),
        _ => None,
    }
}

pub fn as_tool_error_update(update: &MessageUpdate) -> Option<&ToolErrorUpdate> {
    match as_tool_update(update)? {
        ToolUpdate::Error(u) => Some(u),
        _ => None,
    }
}
