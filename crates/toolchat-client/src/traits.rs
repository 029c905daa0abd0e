use async_trait::async_trait;
use serde_json::Value;
use toolchat_types::{Conversation, StructuredReply, Turn};

use crate::error::Result;

/// Trait for the recommendation query endpoint
///
/// Implementations must be cancel-safe: dropping the returned future abandons
/// the call without side effects on the caller.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Submit one query for a conversation and wait for the structured reply
    async fn ask(&self, request: QueryRequest) -> Result<StructuredReply>;

    /// Ask the backend to forget its conversational memory for a conversation
    async fn reset_memory(&self, conversation_id: &str) -> Result<String>;
}

/// Trait for the persisted conversation catalog and its turns
#[async_trait]
pub trait HistoryClient: Send + Sync {
    /// Conversations owned by a user, most recently updated first
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>>;

    /// Turns of a conversation in chronological order
    async fn fetch_turns(&self, conversation_id: &str) -> Result<Vec<Turn>>;

    async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<()>;

    async fn delete_conversation(&self, conversation_id: &str) -> Result<()>;

    async fn delete_all_conversations(&self, user_id: &str) -> Result<()>;
}

/// Trait for the free-form user profile blob
#[async_trait]
pub trait ProfileClient: Send + Sync {
    /// `None` when the user has no stored profile
    async fn get_profile(&self, user_id: &str) -> Result<Option<Value>>;

    async fn put_profile(&self, user_id: &str, profile: Value) -> Result<()>;

    async fn delete_profile(&self, user_id: &str) -> Result<()>;
}

/// Convenience trait for backends that serve every collaborator operation
pub trait Backend: QueryClient + HistoryClient + ProfileClient {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
    pub conversation_id: String,
    pub user_id: String,
}

impl QueryRequest {
    pub fn new(
        query: impl Into<String>,
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
        }
    }
}
