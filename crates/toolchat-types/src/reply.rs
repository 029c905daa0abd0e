use serde::{Deserialize, Serialize};

use crate::lenient;

/// `mode` value marking a plain chat reply
pub const CHAT_MODE: &str = "chat";

/// `mode` value the backend stamps on tool recommendations
pub const TOOLS_MODE: &str = "tools";

/// Reply payload returned by the backend for a single query.
///
/// On the wire this is one flat JSON object whose `mode` field decides how the
/// rest is read: `"chat"` carries a `reply` string, anything else (including a
/// missing `mode`) is a tool recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireReply", into = "WireReply")]
pub enum StructuredReply {
    Chat { reply: Option<String> },
    Tools(ToolRecommendation),
}

impl StructuredReply {
    pub fn chat(reply: impl Into<String>) -> Self {
        Self::Chat {
            reply: Some(reply.into()),
        }
    }

    pub fn is_chat(&self) -> bool {
        matches!(self, Self::Chat { .. })
    }
}

impl From<ToolRecommendation> for StructuredReply {
    fn from(recommendation: ToolRecommendation) -> Self {
        Self::Tools(recommendation)
    }
}

/// Structured tool recommendation. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolRecommendation {
    /// Mode label as sent by the backend (usually `"tools"`)
    pub mode: Option<String>,
    pub intro: Option<String>,
    pub recommended_tools: Vec<RawTool>,
    pub comparison: Option<Vec<String>>,
    pub final_recommendation: Option<Vec<String>>,
    pub next_steps: Option<Vec<String>>,
}

impl ToolRecommendation {
    pub fn new() -> Self {
        Self {
            mode: Some(TOOLS_MODE.to_string()),
            ..Self::default()
        }
    }

    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = Some(intro.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<RawTool>) -> Self {
        self.recommended_tools = tools;
        self
    }

    pub fn with_comparison(mut self, comparison: Vec<String>) -> Self {
        self.comparison = Some(comparison);
        self
    }

    pub fn with_final_recommendation(mut self, recommendation: Vec<String>) -> Self {
        self.final_recommendation = Some(recommendation);
        self
    }

    pub fn with_next_steps(mut self, steps: Vec<String>) -> Self {
        self.next_steps = Some(steps);
        self
    }
}

/// A tool record exactly as the backend model produced it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTool {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub pricing: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub setup_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<String>,
    #[serde(default, deserialize_with = "lenient::one_or_many", skip_serializing_if = "Option::is_none")]
    pub advantages: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::one_or_many", skip_serializing_if = "Option::is_none")]
    pub disadvantages: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::one_or_many", skip_serializing_if = "Option::is_none")]
    pub quick_guide: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub best_for: Option<String>,
}

impl RawTool {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireReply {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    reply: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    intro: Option<String>,
    #[serde(default, deserialize_with = "lenient::tools", skip_serializing_if = "Vec::is_empty")]
    recommended_tools: Vec<RawTool>,
    #[serde(default, deserialize_with = "lenient::array_of_strings", skip_serializing_if = "Option::is_none")]
    comparison: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::array_of_strings", skip_serializing_if = "Option::is_none")]
    final_recommendation: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::array_of_strings", skip_serializing_if = "Option::is_none")]
    next_steps: Option<Vec<String>>,
}

impl From<WireReply> for StructuredReply {
    fn from(wire: WireReply) -> Self {
        if wire.mode.as_deref() == Some(CHAT_MODE) {
            return StructuredReply::Chat { reply: wire.reply };
        }

        StructuredReply::Tools(ToolRecommendation {
            mode: wire.mode,
            intro: wire.intro,
            recommended_tools: wire.recommended_tools,
            comparison: wire.comparison,
            final_recommendation: wire.final_recommendation,
            next_steps: wire.next_steps,
        })
    }
}

impl From<StructuredReply> for WireReply {
    fn from(reply: StructuredReply) -> Self {
        match reply {
            StructuredReply::Chat { reply } => WireReply {
                mode: Some(CHAT_MODE.to_string()),
                reply,
                ..WireReply::default()
            },
            StructuredReply::Tools(rec) => WireReply {
                mode: rec.mode,
                reply: None,
                intro: rec.intro,
                recommended_tools: rec.recommended_tools,
                comparison: rec.comparison,
                final_recommendation: rec.final_recommendation,
                next_steps: rec.next_steps,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_mode_decodes_to_chat() {
        let reply: StructuredReply =
            serde_json::from_value(json!({"mode": "chat", "reply": "Hello"})).unwrap();
        assert_eq!(reply, StructuredReply::chat("Hello"));
    }

    #[test]
    fn test_missing_mode_is_tool_recommendation() {
        let reply: StructuredReply = serde_json::from_value(json!({
            "intro": "Here are some tools",
            "recommended_tools": [{"name": "Notion", "url": "https://notion.so"}]
        }))
        .unwrap();

        match reply {
            StructuredReply::Tools(rec) => {
                assert_eq!(rec.mode, None);
                assert_eq!(rec.intro.as_deref(), Some("Here are some tools"));
                assert_eq!(rec.recommended_tools.len(), 1);
                assert_eq!(rec.recommended_tools[0].name.as_deref(), Some("Notion"));
            }
            other => panic!("Expected tools reply, got {:?}", other),
        }
    }

    #[test]
    fn test_non_array_sections_are_absent() {
        let reply: StructuredReply = serde_json::from_value(json!({
            "mode": "tools",
            "recommended_tools": "Notion",
            "comparison": "not a list",
            "final_recommendation": {"a": 1},
            "next_steps": null
        }))
        .unwrap();

        let StructuredReply::Tools(rec) = reply else {
            panic!("Expected tools reply");
        };
        assert!(rec.recommended_tools.is_empty());
        assert_eq!(rec.comparison, None);
        assert_eq!(rec.final_recommendation, None);
        assert_eq!(rec.next_steps, None);
    }

    #[test]
    fn test_tool_list_fields_accept_single_string() {
        let tool: RawTool = serde_json::from_value(json!({
            "name": "Trello",
            "advantages": "Free plan",
            "disadvantages": ["Limited automation", 3],
            "pricing": 0
        }))
        .unwrap();

        assert_eq!(tool.advantages, Some(vec!["Free plan".to_string()]));
        assert_eq!(
            tool.disadvantages,
            Some(vec!["Limited automation".to_string(), "3".to_string()])
        );
        assert_eq!(tool.pricing.as_deref(), Some("0"));
    }

    #[test]
    fn test_non_object_tool_entry_becomes_blank_tool() {
        let reply: StructuredReply = serde_json::from_value(json!({
            "recommended_tools": [null, {"name": "Canva"}]
        }))
        .unwrap();

        let StructuredReply::Tools(rec) = reply else {
            panic!("Expected tools reply");
        };
        assert_eq!(rec.recommended_tools[0], RawTool::default());
        assert_eq!(rec.recommended_tools[1].name.as_deref(), Some("Canva"));
    }

    #[test]
    fn test_chat_serializes_with_mode() {
        let value = serde_json::to_value(StructuredReply::chat("Hi")).unwrap();
        assert_eq!(value, json!({"mode": "chat", "reply": "Hi"}));
    }
}
