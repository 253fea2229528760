//! Backend selection and the named collection set

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    bucket::Bucket,
    collection::Collection,
    disabled::{DisabledBucket, DisabledCollection},
    memory::{MemoryBucket, MemoryCollection},
};

pub const CONVERSATION_STATS_COLLECTION: &str = "conversations.stats";

/// Which store implementation backs the collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Nothing is persisted; reads come back empty
    #[default]
    Disabled,
    /// Kept in process memory for the lifetime of the `Database`
    Memory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Disabled => write!(f, "disabled"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Every collection the application uses, plus the blob bucket
#[derive(Clone)]
pub struct Collections {
    pub conversations: Arc<dyn Collection>,
    pub conversation_stats: Arc<dyn Collection>,
    pub assistants: Arc<dyn Collection>,
    pub assistant_stats: Arc<dyn Collection>,
    pub reports: Arc<dyn Collection>,
    pub shared_conversations: Arc<dyn Collection>,
    pub aborted_generations: Arc<dyn Collection>,
    pub settings: Arc<dyn Collection>,
    pub users: Arc<dyn Collection>,
    pub sessions: Arc<dyn Collection>,
    pub message_events: Arc<dyn Collection>,
    pub migration_results: Arc<dyn Collection>,
    pub semaphores: Arc<dyn Collection>,
    pub token_caches: Arc<dyn Collection>,
    pub tools: Arc<dyn Collection>,
    pub config: Arc<dyn Collection>,
    pub bucket: Arc<dyn Bucket>,
}

impl Collections {
    fn build(make: impl Fn(&str) -> Arc<dyn Collection>, bucket: Arc<dyn Bucket>) -> Self {
        Self {
            conversations: make("conversations"),
            conversation_stats: make(CONVERSATION_STATS_COLLECTION),
            assistants: make("assistants"),
            assistant_stats: make("assistants.stats"),
            reports: make("reports"),
            shared_conversations: make("sharedConversations"),
            aborted_generations: make("abortedGenerations"),
            settings: make("settings"),
            users: make("users"),
            sessions: make("sessions"),
            message_events: make("messageEvents"),
            migration_results: make("migrationResults"),
            semaphores: make("semaphores"),
            token_caches: make("tokens"),
            tools: make("tools"),
            config: make("config"),
            bucket,
        }
    }

    /// All document collections, in declaration order
    pub fn all(&self) -> Vec<&Arc<dyn Collection>> {
        vec![
            &self.conversations,
            &self.conversation_stats,
            &self.assistants,
            &self.assistant_stats,
            &self.reports,
            &self.shared_conversations,
            &self.aborted_generations,
            &self.settings,
            &self.users,
            &self.sessions,
            &self.message_events,
            &self.migration_results,
            &self.semaphores,
            &self.token_caches,
            &self.tools,
            &self.config,
        ]
    }
}

/// Handle to the configured store
#[derive(Clone)]
pub struct Database {
    backend: StoreBackend,
    collections: Collections,
}

impl Database {
    /// Open the store with the given backend
    pub fn connect(backend: StoreBackend) -> Self {
        let collections = match backend {
            StoreBackend::Disabled => {
                tracing::info!("Store disabled; collections will stay empty");
                Collections::build(
                    |name| Arc::new(DisabledCollection::new(name)) as Arc<dyn Collection>,
                    Arc::new(DisabledBucket),
                )
            }
            StoreBackend::Memory => {
                tracing::info!("Using in-memory store");
                Collections::build(
                    |name| Arc::new(MemoryCollection::new(name)) as Arc<dyn Collection>,
                    Arc::new(MemoryBucket::new()),
                )
            }
        };
        Self {
            backend,
            collections,
        }
    }

    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    /// Names of the collections that exist in the backend
    pub fn list_collections(&self) -> Vec<String> {
        match self.backend {
            StoreBackend::Disabled => Vec::new(),
            StoreBackend::Memory => self
                .collections
                .all()
                .into_iter()
                .map(|c| c.name().to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_parses_lowercase() {
        let b: StoreBackend = serde_json::from_value(json!("memory")).unwrap();
        assert_eq!(b, StoreBackend::Memory);
        assert_eq!(StoreBackend::default(), StoreBackend::Disabled);
        assert_eq!(StoreBackend::Disabled.to_string(), "disabled");
    }

    #[test]
    fn test_list_collections() {
        assert!(Database::connect(StoreBackend::Disabled)
            .list_collections()
            .is_empty());

        let names = Database::connect(StoreBackend::Memory).list_collections();
        assert_eq!(names.len(), 16);
        assert!(names.contains(&CONVERSATION_STATS_COLLECTION.to_string()));
    }

    #[tokio::test]
    async fn test_same_code_against_both_backends() {
        for (backend, expected) in [(StoreBackend::Disabled, 0), (StoreBackend::Memory, 1)] {
            let db = Database::connect(backend);
            let sessions = &db.collections().sessions;
            sessions
                .insert_one(json!({"_id": "s1", "userId": "u"}))
                .await
                .unwrap();
            assert_eq!(
                sessions.count_documents(&json!({"userId": "u"})).await.unwrap(),
                expected,
                "backend {}",
                backend
            );
        }
    }
}
