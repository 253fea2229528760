//! murmur-store: the conversation store collaborator
//!
//! A uniform asynchronous document-collection interface plus a blob bucket,
//! with a disabled backend (every read empty, every write a no-op) and an
//! in-memory backend, selected at runtime.

pub mod bucket;
pub mod collection;
pub mod conversation;
pub mod database;
pub mod disabled;
pub mod error;
pub mod memory;

pub use bucket::{Bucket, DownloadStream, UploadStream};
pub use collection::{
    Collection, Cursor, DeleteResult, Document, FindOptions, InsertManyResult, InsertOneResult,
    SortOrder, UpdateResult,
};
pub use conversation::{
    ConversationPage, MessageRole, StoredMessage, load_conversation, save_conversation,
};
pub use database::{Collections, Database, StoreBackend};
pub use error::{Error, Result};
