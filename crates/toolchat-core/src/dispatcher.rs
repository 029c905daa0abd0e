// Request dispatch: one outstanding query per conversation, cancellable

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolchat_client::{Backend, ClientError, QueryRequest};
use toolchat_types::StructuredReply;

/// How a dispatched query ended
#[derive(Debug)]
pub enum DispatchOutcome {
    Reply(StructuredReply),
    /// Stopped locally; never a failure
    Cancelled,
    Failed(ClientError),
}

/// Outcome tagged with the conversation and generation it was issued for
#[derive(Debug)]
pub struct Dispatched {
    pub conversation_id: String,
    pub generation: u64,
    pub outcome: DispatchOutcome,
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

/// Issues queries to the backend.
///
/// Starting a query for a conversation cancels the one already outstanding
/// for it. The dispatcher only does I/O; applying outcomes is up to the caller.
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    in_flight: Arc<DashMap<String, InFlight>>,
    next_generation: AtomicU64,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            in_flight: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Register a query and return the handle that performs it
    pub fn begin(&self, request: QueryRequest) -> PendingRequest {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let previous = self.in_flight.insert(
            request.conversation_id.clone(),
            InFlight {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            tracing::debug!(
                conversation_id = %request.conversation_id,
                superseded = previous.generation,
                generation,
                "Cancelling superseded query"
            );
            previous.token.cancel();
        }

        PendingRequest {
            backend: Arc::clone(&self.backend),
            in_flight: Arc::clone(&self.in_flight),
            request,
            generation,
            token,
        }
    }

    pub async fn send(&self, request: QueryRequest) -> Dispatched {
        self.begin(request).wait().await
    }

    /// Cancel the outstanding query for a conversation. Returns whether one existed.
    pub fn cancel(&self, conversation_id: &str) -> bool {
        match self.in_flight.remove(conversation_id) {
            Some((_, in_flight)) => {
                in_flight.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_in_flight(&self, conversation_id: &str) -> bool {
        self.in_flight.contains_key(conversation_id)
    }

    /// Generation of the outstanding query for a conversation
    pub fn current_generation(&self, conversation_id: &str) -> Option<u64> {
        self.in_flight
            .get(conversation_id)
            .map(|entry| entry.generation)
    }
}

/// A registered query. Nothing is sent until [`PendingRequest::wait`] is polled.
///
/// Dropping the handle (or the `wait` future) abandons the call.
pub struct PendingRequest {
    backend: Arc<dyn Backend>,
    in_flight: Arc<DashMap<String, InFlight>>,
    request: QueryRequest,
    generation: u64,
    token: CancellationToken,
}

impl PendingRequest {
    pub fn conversation_id(&self) -> &str {
        &self.request.conversation_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait(self) -> Dispatched {
        let outcome = tokio::select! {
            biased;
            _ = self.token.cancelled() => DispatchOutcome::Cancelled,
            result = self.backend.ask(self.request.clone()) => match result {
                Ok(reply) => DispatchOutcome::Reply(reply),
                Err(err) => {
                    tracing::error!(
                        conversation_id = %self.request.conversation_id,
                        error = %err,
                        "Query failed"
                    );
                    DispatchOutcome::Failed(err)
                }
            },
        };

        Dispatched {
            conversation_id: self.request.conversation_id.clone(),
            generation: self.generation,
            outcome,
        }
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        // A newer query may own the slot by now
        let generation = self.generation;
        self.in_flight
            .remove_if(&self.request.conversation_id, |_, entry| {
                entry.generation == generation
            });
    }
}
