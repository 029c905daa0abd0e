// Reply normalization: StructuredReply -> ordered display blocks
//
// Used for live replies and for history replay alike, so both paths render
// the same blocks for the same reply and date.

use toolchat_types::{DisplayBlock, StructuredReply, ToolRecommendation};

use crate::mapper::map_tools;

/// Shown when a chat reply carries no text
pub const FALLBACK_REPLY: &str = "Sorry, I don't have a suitable answer for that yet.";

pub const COMPARISON_LEAD_IN: &str = "**Quick comparison of the options:**";
pub const CONCLUSION_LEAD_IN: &str = "**Quick conclusion:**";
pub const NEXT_STEPS_LEAD_IN: &str = "**Next steps you can take:**";

/// Appended when the user stops an outstanding reply
pub const STOPPED_NOTICE: &str = "Response stopped.";

/// Assistant message for a failed query
pub const CONNECTION_ERROR_REPLY: &str =
    "Sorry, something went wrong while reaching the assistant. Please try again.";

/// Convert a reply into display blocks dated `date`.
///
/// Chat replies become one assistant message. Tool recommendations emit, in
/// order and only when present: intro, suggestion row, comparison,
/// conclusion, next steps. A recommendation with no sections yields no blocks.
pub fn normalize(reply: &StructuredReply, date: &str) -> Vec<DisplayBlock> {
    match reply {
        StructuredReply::Chat { reply } => {
            let content = reply
                .as_deref()
                .filter(|text| !text.is_empty())
                .unwrap_or(FALLBACK_REPLY);
            vec![DisplayBlock::assistant_text(content, date)]
        }
        StructuredReply::Tools(recommendation) => normalize_tools(recommendation, date),
    }
}

fn normalize_tools(rec: &ToolRecommendation, date: &str) -> Vec<DisplayBlock> {
    let tools = map_tools(&rec.recommended_tools);
    let mut blocks = Vec::new();

    if let Some(intro) = rec.intro.as_deref().filter(|intro| !intro.is_empty()) {
        blocks.push(DisplayBlock::preface(intro, date));
    }

    if !tools.is_empty() {
        blocks.push(DisplayBlock::SuggestionRow {
            tools: tools.clone(),
            date: date.to_string(),
        });
    }

    if let Some(comparison) = non_empty(&rec.comparison) {
        blocks.push(DisplayBlock::preface(COMPARISON_LEAD_IN, date));
        blocks.push(DisplayBlock::ComparisonTable {
            tools,
            comparison_texts: comparison.to_vec(),
            date: date.to_string(),
        });
    }

    if let Some(conclusion) = non_empty(&rec.final_recommendation) {
        blocks.push(DisplayBlock::preface(CONCLUSION_LEAD_IN, date));
        blocks.push(DisplayBlock::assistant_text(conclusion.join("\n\n"), date));
    }

    if let Some(steps) = non_empty(&rec.next_steps) {
        blocks.push(DisplayBlock::preface(NEXT_STEPS_LEAD_IN, date));
        blocks.push(DisplayBlock::assistant_text(numbered(steps), date));
    }

    blocks
}

fn non_empty(section: &Option<Vec<String>>) -> Option<&[String]> {
    section.as_deref().filter(|items| !items.is_empty())
}

fn numbered(steps: &[String]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}
