pub mod dispatcher;
pub mod error;
pub mod labels;
pub mod mapper;
pub mod normalizer;
pub mod reconciler;
pub mod session;
pub mod timeline;

pub use dispatcher::{DispatchOutcome, Dispatched, Dispatcher, PendingRequest};
pub use error::{CoreError, Result};
pub use labels::{DateLabeler, DEFAULT_UTC_OFFSET_MINUTES};
pub use mapper::{favicon_url, map_tool, map_tools, MAX_SUGGESTIONS};
pub use normalizer::{
    normalize, COMPARISON_LEAD_IN, CONCLUSION_LEAD_IN, CONNECTION_ERROR_REPLY, FALLBACK_REPLY,
    NEXT_STEPS_LEAD_IN, STOPPED_NOTICE,
};
pub use reconciler::HistoryReconciler;
pub use session::{
    Applied, LoadOutcome, Loaded, PendingLoad, SessionManager, SessionState, UserIdentity,
    HISTORY_LOAD_FAILED,
};
pub use timeline::{RenderedBlock, Timeline};

// Re-export the data model so callers need only this crate
pub use toolchat_types::{
    comparison_cell, Conversation, DisplayBlock, Role, StructuredReply, ToolDetails, ToolSummary,
};
