use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reply::StructuredReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One persisted exchange unit. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
    #[serde(default, with = "crate::timestamp::lenient")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Turn {
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
            timestamp: Some(timestamp),
        }
    }

    pub fn assistant(reply: StructuredReply, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Reply(reply),
            timestamp: Some(timestamp),
        }
    }
}

/// Turn body: plain text (user turns and older assistant records) or a
/// structured reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Reply(StructuredReply),
}

impl TurnContent {
    /// Assistant content as a reply. Bare strings are older chat records.
    pub fn into_reply(self) -> StructuredReply {
        match self {
            TurnContent::Text(text) => StructuredReply::chat(text),
            TurnContent::Reply(reply) => reply,
        }
    }

    /// User content as display text
    pub fn into_text(self) -> String {
        match self {
            TurnContent::Text(text) => text,
            TurnContent::Reply(StructuredReply::Chat { reply }) => reply.unwrap_or_default(),
            TurnContent::Reply(StructuredReply::Tools(rec)) => rec.intro.unwrap_or_default(),
        }
    }
}
