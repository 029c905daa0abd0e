use serde::{Deserialize, Serialize};

use crate::turn::Role;

/// Placeholder shown in a comparison cell with no text
pub const MISSING_COMPARISON: &str = "N/A";

/// One renderable unit of a conversation timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayBlock {
    /// Plain message bubble
    TextMessage {
        role: Role,
        content: String,
        date: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time: Option<String>,
    },

    /// Bolded lead-in line
    Preface { content: String, date: String },

    /// Up to three suggestion cards
    SuggestionRow { tools: Vec<ToolSummary>, date: String },

    /// Side-by-side comparison; texts align with tools by index
    ComparisonTable {
        tools: Vec<ToolSummary>,
        comparison_texts: Vec<String>,
        date: String,
    },
}

impl DisplayBlock {
    pub fn user_text(content: impl Into<String>, date: impl Into<String>, time: Option<String>) -> Self {
        Self::TextMessage {
            role: Role::User,
            content: content.into(),
            date: date.into(),
            time,
        }
    }

    pub fn assistant_text(content: impl Into<String>, date: impl Into<String>) -> Self {
        Self::TextMessage {
            role: Role::Assistant,
            content: content.into(),
            date: date.into(),
            time: None,
        }
    }

    pub fn preface(content: impl Into<String>, date: impl Into<String>) -> Self {
        Self::Preface {
            content: content.into(),
            date: date.into(),
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Self::TextMessage { date, .. }
            | Self::Preface { date, .. }
            | Self::SuggestionRow { date, .. }
            | Self::ComparisonTable { date, .. } => date,
        }
    }

    /// Everything but a user text message is spoken by the assistant
    pub fn role(&self) -> Role {
        match self {
            Self::TextMessage { role, .. } => *role,
            _ => Role::Assistant,
        }
    }
}

/// Comparison text for the tool at `index`, or [`MISSING_COMPARISON`]
pub fn comparison_cell(texts: &[String], index: usize) -> &str {
    texts
        .get(index)
        .map(String::as_str)
        .filter(|text| !text.is_empty())
        .unwrap_or(MISSING_COMPARISON)
}

/// Display-ready view of a recommended tool. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub favicon: Option<String>,
    pub details: ToolDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDetails {
    pub overview: Vec<String>,
    pub advantages: Option<Vec<String>>,
    pub disadvantages: Option<Vec<String>>,
    pub quick_guide: Option<Vec<String>>,
    pub best_for: Option<String>,
}
