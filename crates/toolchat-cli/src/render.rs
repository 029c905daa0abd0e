// Plain-text rendering of the timeline and the conversation list

use std::fmt::Write;
use toolchat_core::{
    comparison_cell, Conversation, DateLabeler, DisplayBlock, RenderedBlock, Role, ToolSummary,
};

const UNTITLED_TOOL: &str = "Tool";
const UNTITLED_CONVERSATION: &str = "(untitled)";

pub fn render_blocks(blocks: &[RenderedBlock<'_>]) -> String {
    let mut out = String::new();
    for rendered in blocks {
        if let Some(date) = rendered.separator {
            let _ = writeln!(out, "\n------------ {} ------------", date);
        }
        out.push_str(&render_block(rendered.block));
    }
    out
}

pub fn render_block(block: &DisplayBlock) -> String {
    match block {
        DisplayBlock::TextMessage {
            role: Role::User,
            content,
            time,
            ..
        } => match time {
            Some(time) => format!("you [{}]: {}\n", time, content),
            None => format!("you: {}\n", content),
        },
        DisplayBlock::TextMessage { content, .. } => format!("assistant: {}\n", indent(content)),
        DisplayBlock::Preface { content, .. } => format!("{}\n", content),
        DisplayBlock::SuggestionRow { tools, .. } => render_suggestions(tools),
        DisplayBlock::ComparisonTable {
            tools,
            comparison_texts,
            ..
        } => {
            let mut out = String::new();
            for (i, tool) in tools.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  | {:<20} | {}",
                    tool_title(tool),
                    comparison_cell(comparison_texts, i)
                );
            }
            out
        }
    }
}

fn render_suggestions(tools: &[ToolSummary]) -> String {
    let mut out = String::new();
    for (i, tool) in tools.iter().enumerate() {
        let _ = write!(out, "  [{}] {}", i + 1, tool_title(tool));
        if let Some(link) = &tool.link {
            let _ = write!(out, " <{}>", link);
        }
        out.push('\n');

        if let Some(summary) = &tool.summary {
            let _ = writeln!(out, "      {}", summary);
        }
        for line in &tool.details.overview {
            let _ = writeln!(out, "      {}", line);
        }
        if let Some(best_for) = &tool.details.best_for {
            let _ = writeln!(out, "      Best for: {}", best_for);
        }
    }
    out
}

pub fn render_conversations(
    conversations: &[&Conversation],
    active_id: &str,
    labeler: &DateLabeler,
) -> String {
    if conversations.is_empty() {
        return "No conversations.\n".to_string();
    }

    let mut out = String::new();
    for conversation in conversations {
        let marker = if conversation.id == active_id { "*" } else { " " };
        let title = if conversation.title.is_empty() {
            UNTITLED_CONVERSATION
        } else {
            conversation.title.as_str()
        };
        let updated = conversation
            .updated_at
            .map(|at| labeler.date_label(at))
            .unwrap_or_default();

        let _ = writeln!(out, "{} {}  {:<40} {}", marker, conversation.id, title, updated);
    }
    out
}

fn tool_title(tool: &ToolSummary) -> &str {
    tool.title.as_deref().unwrap_or(UNTITLED_TOOL)
}

fn indent(text: &str) -> String {
    text.replace('\n', "\n           ")
}
