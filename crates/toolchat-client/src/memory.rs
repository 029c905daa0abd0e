// In-process backend: keeps conversations in memory and answers with scripted replies

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use toolchat_types::{derive_title, Conversation, StructuredReply, Turn};

use crate::error::{ClientError, Result};
use crate::traits::{Backend, HistoryClient, ProfileClient, QueryClient, QueryRequest};

/// Next answer the memory backend will give
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Reply(StructuredReply),
    Failure(String),
}

struct StoredConversation {
    user_id: String,
    conversation: Conversation,
    turns: Vec<Turn>,
}

#[derive(Default)]
struct Store {
    conversations: HashMap<String, StoredConversation>,
    profiles: HashMap<String, Value>,
}

/// Backend that mirrors the server's persistence rules without a network.
///
/// A successful `ask` upserts the conversation (title from the first query)
/// and appends the user and assistant turns, like the server does. Failed or
/// abandoned calls persist nothing.
pub struct MemoryBackend {
    store: RwLock<Store>,
    script: Mutex<VecDeque<ScriptedReply>>,
    latency: Duration,
    history_available: AtomicBool,
    asks_started: AtomicUsize,
    memory_resets: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
            script: Mutex::new(VecDeque::new()),
            latency: Duration::ZERO,
            history_available: AtomicBool::new(true),
            asks_started: AtomicUsize::new(0),
            memory_resets: Mutex::new(Vec::new()),
        }
    }

    /// Delay every `ask` by `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue the reply for the next `ask`; without a script the backend echoes
    pub async fn push_reply(&self, reply: StructuredReply) {
        self.script.lock().await.push_back(ScriptedReply::Reply(reply));
    }

    /// Queue a server failure for the next `ask`
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(ScriptedReply::Failure(message.into()));
    }

    /// Simulate a history store outage
    pub fn set_history_available(&self, available: bool) {
        self.history_available.store(available, Ordering::SeqCst);
    }

    /// Number of `ask` calls that reached the backend
    pub fn asks_started(&self) -> usize {
        self.asks_started.load(Ordering::SeqCst)
    }

    /// Conversation ids whose memory was reset, in call order
    pub async fn memory_resets(&self) -> Vec<String> {
        self.memory_resets.lock().await.clone()
    }

    /// Store a conversation with pre-existing turns
    pub async fn insert_conversation(
        &self,
        user_id: impl Into<String>,
        conversation: Conversation,
        turns: Vec<Turn>,
    ) {
        let mut store = self.store.write().await;
        store.conversations.insert(
            conversation.id.clone(),
            StoredConversation {
                user_id: user_id.into(),
                conversation,
                turns,
            },
        );
    }

    fn history_down(&self) -> Option<ClientError> {
        if self.history_available.load(Ordering::SeqCst) {
            None
        } else {
            Some(ClientError::Status {
                status: 503,
                message: "History store unavailable".to_string(),
            })
        }
    }

    async fn record_exchange(&self, request: &QueryRequest, reply: &StructuredReply) {
        let now = Utc::now();
        let mut store = self.store.write().await;

        let entry = store
            .conversations
            .entry(request.conversation_id.clone())
            .or_insert_with(|| StoredConversation {
                user_id: request.user_id.clone(),
                conversation: Conversation {
                    id: request.conversation_id.clone(),
                    title: derive_title(&request.query),
                    created_at: Some(now),
                    updated_at: Some(now),
                },
                turns: Vec::new(),
            });

        entry.user_id = request.user_id.clone();
        entry.conversation.updated_at = Some(now);
        entry.turns.push(Turn::user(request.query.clone(), now));
        entry.turns.push(Turn::assistant(reply.clone(), now));
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryClient for MemoryBackend {
    async fn ask(&self, request: QueryRequest) -> Result<StructuredReply> {
        self.asks_started.fetch_add(1, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let scripted = self.script.lock().await.pop_front();
        let reply = match scripted {
            Some(ScriptedReply::Reply(reply)) => reply,
            Some(ScriptedReply::Failure(message)) => {
                return Err(ClientError::Status {
                    status: 500,
                    message,
                })
            }
            None => StructuredReply::chat(format!("You said: {}", request.query)),
        };

        self.record_exchange(&request, &reply).await;
        Ok(reply)
    }

    async fn reset_memory(&self, conversation_id: &str) -> Result<String> {
        self.memory_resets
            .lock()
            .await
            .push(conversation_id.to_string());
        Ok(format!("Memory reset for session {}", conversation_id))
    }
}

#[async_trait]
impl HistoryClient for MemoryBackend {
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        if let Some(err) = self.history_down() {
            return Err(err);
        }

        let store = self.store.read().await;
        let mut conversations: Vec<Conversation> = store
            .conversations
            .values()
            .filter(|stored| stored.user_id == user_id)
            .map(|stored| stored.conversation.clone())
            .collect();

        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn fetch_turns(&self, conversation_id: &str) -> Result<Vec<Turn>> {
        if let Some(err) = self.history_down() {
            return Err(err);
        }

        let store = self.store.read().await;
        Ok(store
            .conversations
            .get(conversation_id)
            .map(|stored| stored.turns.clone())
            .unwrap_or_default())
    }

    async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<()> {
        let mut store = self.store.write().await;
        let stored = store
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| ClientError::NotFound(conversation_id.to_string()))?;
        stored.conversation.title = title.to_string();
        Ok(())
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        self.store.write().await.conversations.remove(conversation_id);
        Ok(())
    }

    async fn delete_all_conversations(&self, user_id: &str) -> Result<()> {
        self.store
            .write()
            .await
            .conversations
            .retain(|_, stored| stored.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl ProfileClient for MemoryBackend {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Value>> {
        Ok(self.store.read().await.profiles.get(user_id).cloned())
    }

    async fn put_profile(&self, user_id: &str, profile: Value) -> Result<()> {
        self.store
            .write()
            .await
            .profiles
            .insert(user_id.to_string(), profile);
        Ok(())
    }

    async fn delete_profile(&self, user_id: &str) -> Result<()> {
        self.store.write().await.profiles.remove(user_id);
        Ok(())
    }
}

impl Backend for MemoryBackend {}
