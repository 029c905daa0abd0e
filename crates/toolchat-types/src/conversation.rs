use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Titles derived from a first query keep this many characters
pub const TITLE_MAX_CHARS: usize = 60;

/// Catalog entry for one persisted conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "session_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// The catalog listing does not always project this field
    #[serde(default, with = "crate::timestamp::lenient", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::timestamp::lenient", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Case-insensitive title match, as used by the history search box
    pub fn title_matches(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(&term.to_lowercase())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fresh opaque conversation id
pub fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Title for a conversation started by `query`: the first
/// [`TITLE_MAX_CHARS`] characters, with `...` appended when cut.
pub fn derive_title(query: &str) -> String {
    if query.chars().count() > TITLE_MAX_CHARS {
        let head: String = query.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        query.to_string()
    }
}
