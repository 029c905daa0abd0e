//! Data model shared by every toolchat crate.
//!
//! - `conversation` - catalog entries for a user's conversations
//! - `turn` - persisted user/assistant exchanges
//! - `reply` - the backend's structured reply payload
//! - `block` - display blocks that make up a timeline
//! - `timestamp` - lenient parsing of backend timestamps

pub mod block;
pub mod conversation;
pub mod reply;
pub mod timestamp;
pub mod turn;

mod lenient;

pub use block::{comparison_cell, DisplayBlock, ToolDetails, ToolSummary, MISSING_COMPARISON};
pub use conversation::{derive_title, new_conversation_id, Conversation, TITLE_MAX_CHARS};
pub use reply::{RawTool, StructuredReply, ToolRecommendation, CHAT_MODE, TOOLS_MODE};
pub use timestamp::parse_timestamp;
pub use turn::{Role, Turn, TurnContent};
