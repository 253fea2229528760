//! Conversation page loading
//!
//! Seeds a chat view with the conversation's identity and prior messages
//! before any new turn is streamed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{database::Collections, error::Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A message as stored with its conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub from: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestors: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(from: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            from,
            content: content.into(),
            ancestors: None,
            created_at: Utc::now(),
        }
    }
}

/// Everything a chat view needs to render a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub model: String,
    #[serde(default)]
    pub preprompt: String,
    #[serde(default)]
    pub root_message_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
    #[serde(default)]
    pub assistant_id: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub model_tools: bool,
    #[serde(default)]
    pub shared: bool,
}

impl ConversationPage {
    /// Page shown for a conversation the store knows nothing about
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: "New conversation".to_string(),
            model: "default".to_string(),
            preprompt: String::new(),
            root_message_id: None,
            messages: Vec::new(),
            assistant_id: None,
            updated_at: Utc::now(),
            model_tools: false,
            shared: false,
        }
    }

    /// Mark the conversation as active now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Load a conversation, falling back to a placeholder when it isn't stored
pub async fn load_conversation(collections: &Collections, id: &str) -> Result<ConversationPage> {
    match collections.conversations.find_one(&json!({ "_id": id })).await? {
        Some(doc) => Ok(serde_json::from_value(doc)?),
        None => {
            tracing::debug!(conversation_id = id, "Conversation not stored, using placeholder");
            Ok(ConversationPage::placeholder(id))
        }
    }
}

/// Write a conversation back, inserting it if it isn't stored yet
pub async fn save_conversation(collections: &Collections, page: &ConversationPage) -> Result<()> {
    let doc = serde_json::to_value(page)?;
    let filter = json!({ "_id": page.id });
    let result = collections.conversations.replace_one(&filter, doc.clone()).await?;
    if result.matched_count == 0 {
        collections.conversations.insert_one(doc).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Database, StoreBackend};

    #[tokio::test]
    async fn test_load_unknown_conversation_gives_placeholder() {
        let db = Database::connect(StoreBackend::Disabled);
        let page = load_conversation(db.collections(), "abc").await.unwrap();
        assert_eq!(page.id, "abc");
        assert!(page.messages.is_empty());
        assert!(page.root_message_id.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_with_memory_backend() {
        let db = Database::connect(StoreBackend::Memory);
        let mut page = ConversationPage::placeholder("c1");
        page.messages.push(StoredMessage::new(MessageRole::User, "hi"));
        save_conversation(db.collections(), &page).await.unwrap();

        page.title = "Greetings".into();
        save_conversation(db.collections(), &page).await.unwrap();

        let loaded = load_conversation(db.collections(), "c1").await.unwrap();
        assert_eq!(loaded.title, "Greetings");
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.messages[0].content, "hi");
        assert!(loaded.messages[0].ancestors.is_none());
        assert_eq!(
            db.collections()
                .conversations
                .count_documents(&json!({}))
                .await
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_touch_moves_updated_at_forward() {
        let mut page = ConversationPage::placeholder("c1");
        let before = page.updated_at;
        page.touch();
        assert!(page.updated_at >= before);
        assert!(page.messages.is_empty());
    }

    #[tokio::test]
    async fn test_save_is_invisible_with_disabled_backend() {
        let db = Database::connect(StoreBackend::Disabled);
        let mut page = ConversationPage::placeholder("c1");
        page.title = "Saved".into();
        save_conversation(db.collections(), &page).await.unwrap();

        let loaded = load_conversation(db.collections(), "c1").await.unwrap();
        assert_eq!(loaded.title, "New conversation");
    }
}
