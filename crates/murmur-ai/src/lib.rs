//! murmur-ai: the message-update streaming protocol
//!
//! This crate turns one request to an inference endpoint into a lazy,
//! cancelable stream of typed [`MessageUpdate`] events, and provides the
//! predicates renderers use to dispatch on them.

pub mod classify;
pub mod error;
pub mod request;
pub mod source;
pub mod transport;
pub mod update;

pub use error::{Error, Result};
pub use request::{MessageFile, MessageFileKind, MessageUpdateRequestOptions, RequestMode};
pub use source::{MessageUpdateStream, SourceConfig, UpdateSource};
pub use transport::{HttpTransport, OutboundRequest, RequestBody, Transport, TransportResponse};
pub use update::*;
