// Session manager: conversation identity, catalog, and the reducer that
// applies query and history-load outcomes to the timeline

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolchat_client::{Backend, QueryRequest};
use toolchat_types::{new_conversation_id, Conversation, DisplayBlock};

use crate::dispatcher::{DispatchOutcome, Dispatched, Dispatcher, PendingRequest};
use crate::error::{CoreError, Result};
use crate::labels::DateLabeler;
use crate::normalizer::{normalize, CONNECTION_ERROR_REPLY, STOPPED_NOTICE};
use crate::reconciler::HistoryReconciler;
use crate::timeline::Timeline;

/// Banner shown once when a past conversation cannot be loaded
pub const HISTORY_LOAD_FAILED: &str =
    "Could not load that conversation. A new conversation has been started.";

/// Stable opaque id of the person using the client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// A past conversation is being replayed
    Loading,
    Ready,
}

/// What applying an outcome did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Blocks were added to the timeline
    Appended(usize),
    /// The timeline was rebuilt from history
    Replaced(usize),
    Cancelled,
    /// An error block and banner were shown
    Failed,
    /// Superseded by a newer query, load or conversation switch
    Discarded,
    /// Nothing to do
    Unchanged,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Blocks(Vec<DisplayBlock>),
    Cancelled,
    Failed(CoreError),
}

/// History load result tagged with the load generation it belongs to
#[derive(Debug)]
pub struct Loaded {
    pub conversation_id: String,
    pub generation: u64,
    pub outcome: LoadOutcome,
}

/// A history load started by [`SessionManager::begin_select`]
pub struct PendingLoad {
    reconciler: HistoryReconciler,
    conversation_id: String,
    generation: u64,
    token: CancellationToken,
}

impl PendingLoad {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub async fn wait(self) -> Loaded {
        let outcome = tokio::select! {
            biased;
            _ = self.token.cancelled() => LoadOutcome::Cancelled,
            result = self.reconciler.reconstruct(&self.conversation_id) => match result {
                Ok(blocks) => LoadOutcome::Blocks(blocks),
                Err(err) => LoadOutcome::Failed(err),
            },
        };

        Loaded {
            conversation_id: self.conversation_id,
            generation: self.generation,
            outcome,
        }
    }
}

struct Outstanding {
    conversation_id: String,
    generation: u64,
    date: String,
}

pub struct SessionManager {
    identity: UserIdentity,
    backend: Arc<dyn Backend>,
    dispatcher: Dispatcher,
    reconciler: HistoryReconciler,
    labeler: DateLabeler,

    active_id: String,
    state: SessionState,
    timeline: Timeline,
    conversations: Vec<Conversation>,
    banner: Option<String>,

    outstanding: Option<Outstanding>,
    load_generation: u64,
    load_token: Option<CancellationToken>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>, identity: UserIdentity) -> Self {
        Self::with_labeler(backend, identity, DateLabeler::default())
    }

    pub fn with_labeler(
        backend: Arc<dyn Backend>,
        identity: UserIdentity,
        labeler: DateLabeler,
    ) -> Self {
        Self {
            identity,
            dispatcher: Dispatcher::new(Arc::clone(&backend)),
            reconciler: HistoryReconciler::new(Arc::clone(&backend), labeler),
            backend,
            labeler,
            active_id: new_conversation_id(),
            state: SessionState::Idle,
            timeline: Timeline::new(),
            conversations: Vec::new(),
            banner: None,
            outstanding: None,
            load_generation: 0,
            load_token: None,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Cached catalog from the last refresh
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Banner-level error, if any
    pub fn error(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.banner = None;
    }

    pub fn labeler(&self) -> &DateLabeler {
        &self.labeler
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.outstanding.is_some()
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Show the user's message and start the query for it.
    ///
    /// The returned request runs when awaited; hand its result to [`Self::apply`].
    /// Rejected while a history load is pending, since the load replaces the
    /// timeline.
    pub fn submit(&mut self, query: &str) -> Result<PendingRequest> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CoreError::EmptyQuery);
        }
        if self.state == SessionState::Loading {
            return Err(CoreError::Loading);
        }

        let now = Utc::now();
        let date = self.labeler.date_label(now);
        self.timeline.push(DisplayBlock::user_text(
            query,
            date.clone(),
            Some(self.labeler.time_label(now)),
        ));

        let pending = self.dispatcher.begin(QueryRequest::new(
            query,
            self.active_id.clone(),
            self.identity.as_str(),
        ));

        self.outstanding = Some(Outstanding {
            conversation_id: self.active_id.clone(),
            generation: pending.generation(),
            date,
        });
        if self.state == SessionState::Idle {
            self.state = SessionState::Ready;
        }

        Ok(pending)
    }

    /// Apply a query outcome. Outcomes for anything but the latest query of
    /// the active conversation are discarded.
    pub fn apply(&mut self, dispatched: Dispatched) -> Applied {
        let outstanding = match self.outstanding.take() {
            Some(current)
                if current.generation == dispatched.generation
                    && current.conversation_id == dispatched.conversation_id
                    && current.conversation_id == self.active_id =>
            {
                current
            }
            other => {
                self.outstanding = other;
                tracing::debug!(
                    conversation_id = %dispatched.conversation_id,
                    generation = dispatched.generation,
                    "Discarding stale query result"
                );
                return Applied::Discarded;
            }
        };

        match dispatched.outcome {
            DispatchOutcome::Reply(reply) => {
                let blocks = normalize(&reply, &outstanding.date);
                let count = blocks.len();
                self.timeline.append(blocks);
                Applied::Appended(count)
            }
            DispatchOutcome::Cancelled => Applied::Cancelled,
            DispatchOutcome::Failed(err) => {
                self.timeline.push(DisplayBlock::assistant_text(
                    CONNECTION_ERROR_REPLY,
                    outstanding.date,
                ));
                self.banner = Some(format!("Could not reach the assistant: {}", err));
                Applied::Failed
            }
        }
    }

    /// Submit, wait and apply in one step
    pub async fn send(&mut self, query: &str) -> Result<Applied> {
        let pending = self.submit(query)?;
        let dispatched = pending.wait().await;
        Ok(self.apply(dispatched))
    }

    /// Stop the outstanding reply and say so in the timeline
    pub fn stop(&mut self) -> bool {
        let Some(outstanding) = self.outstanding.take() else {
            return false;
        };

        self.dispatcher.cancel(&outstanding.conversation_id);
        self.timeline
            .push(DisplayBlock::assistant_text(STOPPED_NOTICE, self.labeler.today_label()));
        tracing::info!(conversation_id = %outstanding.conversation_id, "Reply stopped");
        true
    }

    /// Ask the backend to forget its memory of the active conversation
    pub async fn reset_memory(&self) -> Result<String> {
        Ok(self.backend.reset_memory(&self.active_id).await?)
    }

    // ========================================================================
    // CONVERSATION SWITCHING
    // ========================================================================

    /// Start a fresh conversation and return its id
    pub fn create_new(&mut self) -> &str {
        self.cancel_pending_work();
        self.active_id = new_conversation_id();
        self.timeline.reset();
        self.banner = None;
        self.state = SessionState::Ready;

        tracing::info!(conversation_id = %self.active_id, "Started new conversation");
        &self.active_id
    }

    /// Switch to a past conversation and start loading its history.
    ///
    /// `None` when `id` is already active. Pass the load's result to
    /// [`Self::apply_load`]; a later select supersedes this one.
    pub fn begin_select(&mut self, id: &str) -> Result<Option<PendingLoad>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CoreError::UnknownConversation(id.to_string()));
        }
        if id == self.active_id {
            return Ok(None);
        }

        self.cancel_pending_work();
        let token = CancellationToken::new();
        self.load_token = Some(token.clone());

        self.active_id = id.to_string();
        self.timeline.reset();
        self.banner = None;
        self.state = SessionState::Loading;

        tracing::info!(conversation_id = %id, "Switching conversation");

        Ok(Some(PendingLoad {
            reconciler: self.reconciler.clone(),
            conversation_id: id.to_string(),
            generation: self.load_generation,
            token,
        }))
    }

    pub fn apply_load(&mut self, loaded: Loaded) -> Applied {
        if loaded.generation != self.load_generation || loaded.conversation_id != self.active_id {
            tracing::debug!(
                conversation_id = %loaded.conversation_id,
                generation = loaded.generation,
                "Discarding stale history load"
            );
            return Applied::Discarded;
        }

        self.load_token = None;
        match loaded.outcome {
            LoadOutcome::Blocks(blocks) => {
                let count = blocks.len();
                self.timeline.replace(blocks);
                self.state = SessionState::Ready;
                Applied::Replaced(count)
            }
            LoadOutcome::Cancelled => Applied::Discarded,
            LoadOutcome::Failed(err) => {
                tracing::warn!(
                    conversation_id = %loaded.conversation_id,
                    error = %err,
                    "Failed to load conversation history"
                );
                self.create_new();
                self.banner = Some(HISTORY_LOAD_FAILED.to_string());
                Applied::Failed
            }
        }
    }

    /// Select a past conversation and replay it
    pub async fn select_existing(&mut self, id: &str) -> Result<Applied> {
        let Some(pending) = self.begin_select(id)? else {
            return Ok(Applied::Unchanged);
        };
        let loaded = pending.wait().await;
        Ok(self.apply_load(loaded))
    }

    fn cancel_pending_work(&mut self) {
        if let Some(outstanding) = self.outstanding.take() {
            self.dispatcher.cancel(&outstanding.conversation_id);
        }
        if let Some(token) = self.load_token.take() {
            token.cancel();
        }
        self.load_generation += 1;
    }

    // ========================================================================
    // CATALOG
    // ========================================================================

    pub async fn refresh_conversations(&mut self) -> Result<&[Conversation]> {
        self.conversations = self
            .backend
            .list_conversations(self.identity.as_str())
            .await?;
        Ok(self.conversations.as_slice())
    }

    /// Cached conversations whose title contains `term`, ignoring case
    pub fn search(&self, term: &str) -> Vec<&Conversation> {
        self.conversations
            .iter()
            .filter(|conversation| conversation.title_matches(term))
            .collect()
    }

    pub async fn rename(&mut self, id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CoreError::EmptyTitle);
        }

        self.backend.rename_conversation(id, title).await?;
        self.refresh_conversations().await?;
        Ok(())
    }

    /// Delete one conversation; deleting the active one starts a new conversation
    pub async fn remove(&mut self, id: &str) -> Result<()> {
        self.backend.delete_conversation(id).await?;
        if id == self.active_id {
            self.create_new();
        }
        self.refresh_conversations().await?;
        Ok(())
    }

    /// Delete every conversation of the user and start a new one
    pub async fn remove_all(&mut self) -> Result<()> {
        self.backend
            .delete_all_conversations(self.identity.as_str())
            .await?;
        self.conversations.clear();
        self.create_new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchat_client::MemoryBackend;

    fn session() -> (Arc<MemoryBackend>, SessionManager) {
        let backend = Arc::new(MemoryBackend::new());
        let manager = SessionManager::new(backend.clone(), UserIdentity::new("user-1"));
        (backend, manager)
    }

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let (_, manager) = session();
        assert_eq!(manager.state(), SessionState::Idle);
        assert!(manager.timeline().is_empty());
        assert!(!manager.active_id().is_empty());
        assert_eq!(manager.identity().as_str(), "user-1");
    }

    #[test]
    fn test_empty_query_appends_nothing() {
        let (_, mut manager) = session();
        assert!(matches!(manager.submit("   "), Err(CoreError::EmptyQuery)));
        assert!(manager.timeline().is_empty());
        assert!(!manager.is_awaiting_reply());
    }

    #[tokio::test]
    async fn test_send_appends_user_and_reply() {
        let (_, mut manager) = session();

        let applied = manager.send("  hello  ").await.unwrap();

        assert_eq!(applied, Applied::Appended(1));
        let blocks = manager.timeline().blocks();
        assert_eq!(blocks.len(), 2);
        match &blocks[0] {
            DisplayBlock::TextMessage { content, time, .. } => {
                assert_eq!(content, "hello");
                assert!(time.is_some());
            }
            other => panic!("Expected user message, got {:?}", other),
        }
        assert_eq!(manager.state(), SessionState::Ready);
        assert!(!manager.is_awaiting_reply());
    }

    #[test]
    fn test_stop_without_outstanding_reply() {
        let (_, mut manager) = session();
        assert!(!manager.stop());
        assert!(manager.timeline().is_empty());
    }

    #[tokio::test]
    async fn test_select_active_is_noop() {
        let (_, mut manager) = session();
        let id = manager.active_id().to_string();
        assert_eq!(manager.select_existing(&id).await.unwrap(), Applied::Unchanged);
    }

    #[tokio::test]
    async fn test_select_rejects_blank_id() {
        let (_, mut manager) = session();
        let before = manager.active_id().to_string();

        let err = manager.begin_select("   ").err().unwrap();
        assert!(matches!(err, CoreError::UnknownConversation(_)));
        assert_eq!(manager.active_id(), before);
        assert_eq!(manager.state(), SessionState::Idle);
    }

    #[test]
    fn test_submit_rejected_while_loading() {
        let (_, mut manager) = session();
        let _load = manager.begin_select("conv-x").unwrap().unwrap();

        assert!(matches!(manager.submit("hello"), Err(CoreError::Loading)));
        assert!(manager.timeline().is_empty());
        assert!(!manager.is_awaiting_reply());
    }

    #[test]
    fn test_create_new_allocates_fresh_id() {
        let (_, mut manager) = session();
        let before = manager.active_id().to_string();
        let after = manager.create_new().to_string();
        assert_ne!(before, after);
        assert_eq!(manager.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_rename_rejects_blank_title() {
        let (_, mut manager) = session();
        let err = manager.rename("any", "  ").await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyTitle));
    }
}
