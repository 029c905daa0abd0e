// Raw tool records -> display-ready summaries

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use toolchat_types::{RawTool, ToolDetails, ToolSummary};

/// A suggestion row never shows more than this many tools
pub const MAX_SUGGESTIONS: usize = 3;

const FAVICON_ENDPOINT: &str =
    "https://t1.gstatic.com/faviconV2?client=SOCIAL&type=FAVICON&fallback_opts=TYPE,SIZE,URL";
const FAVICON_SIZE: u32 = 64;

/// Characters left alone by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Map the first [`MAX_SUGGESTIONS`] tools, keeping backend order
pub fn map_tools(tools: &[RawTool]) -> Vec<ToolSummary> {
    tools.iter().take(MAX_SUGGESTIONS).map(map_tool).collect()
}

pub fn map_tool(tool: &RawTool) -> ToolSummary {
    let link = present(&tool.url);

    ToolSummary {
        title: present(&tool.name),
        summary: present(&tool.description),
        favicon: link.as_deref().and_then(favicon_url),
        link,
        details: ToolDetails {
            overview: overview_lines(tool),
            advantages: tool.advantages.clone(),
            disadvantages: tool.disadvantages.clone(),
            quick_guide: tool.quick_guide.clone(),
            best_for: present(&tool.best_for),
        },
    }
}

/// Favicon service URL for a tool link; `None` for a blank link
pub fn favicon_url(url: &str) -> Option<String> {
    if url.trim().is_empty() {
        return None;
    }

    Some(format!(
        "{}&url={}&size={}",
        FAVICON_ENDPOINT,
        utf8_percent_encode(url, URI_COMPONENT),
        FAVICON_SIZE
    ))
}

fn overview_lines(tool: &RawTool) -> Vec<String> {
    [
        ("Category", &tool.category),
        ("Pricing", &tool.pricing),
        ("Setup time", &tool.setup_time),
        ("Difficulty", &tool.difficulty_level),
    ]
    .into_iter()
    .filter_map(|(label, value)| present(value).map(|value| format!("- {}: {}", label, value)))
    .collect()
}

fn present(field: &Option<String>) -> Option<String> {
    field.as_ref().filter(|value| !value.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_to_three_in_order() {
        let tools: Vec<RawTool> = ["A", "B", "C", "D", "E"]
            .into_iter()
            .map(RawTool::named)
            .collect();

        let titles: Vec<Option<String>> = map_tools(&tools).into_iter().map(|t| t.title).collect();
        assert_eq!(
            titles,
            vec![Some("A".to_string()), Some("B".to_string()), Some("C".to_string())]
        );
    }

    #[test]
    fn test_favicon_encodes_like_uri_component() {
        let favicon = favicon_url("https://example.com/a b?x=1&y=(2)").unwrap();
        assert_eq!(
            favicon,
            "https://t1.gstatic.com/faviconV2?client=SOCIAL&type=FAVICON&fallback_opts=TYPE,SIZE,URL\
             &url=https%3A%2F%2Fexample.com%2Fa%20b%3Fx%3D1%26y%3D(2)&size=64"
        );
    }

    #[test]
    fn test_missing_url_has_no_favicon() {
        let summary = map_tool(&RawTool::named("Offline"));
        assert_eq!(summary.link, None);
        assert_eq!(summary.favicon, None);

        let blank = map_tool(&RawTool::named("Blank").with_url(""));
        assert_eq!(blank.link, None);
        assert_eq!(blank.favicon, None);
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let summary = map_tool(&RawTool::default());
        assert_eq!(summary, ToolSummary::default());
    }

    #[test]
    fn test_overview_lines_in_fixed_order() {
        let tool = RawTool {
            difficulty_level: Some("Easy".to_string()),
            category: Some("Flashcards".to_string()),
            pricing: Some(String::new()),
            setup_time: Some("5 minutes".to_string()),
            ..RawTool::named("Anki")
        };

        assert_eq!(
            map_tool(&tool).details.overview,
            vec![
                "- Category: Flashcards".to_string(),
                "- Setup time: 5 minutes".to_string(),
                "- Difficulty: Easy".to_string(),
            ]
        );
    }

    #[test]
    fn test_detail_lists_pass_through() {
        let tool = RawTool {
            advantages: Some(vec!["Free".to_string()]),
            quick_guide: Some(vec!["Sign up".to_string(), "Create a deck".to_string()]),
            best_for: Some("Vocabulary".to_string()),
            ..RawTool::named("Anki").with_description("Spaced repetition cards")
        };

        let summary = map_tool(&tool);
        assert_eq!(summary.summary.as_deref(), Some("Spaced repetition cards"));
        assert_eq!(summary.details.advantages, Some(vec!["Free".to_string()]));
        assert_eq!(summary.details.disadvantages, None);
        assert_eq!(summary.details.quick_guide.map(|g| g.len()), Some(2));
        assert_eq!(summary.details.best_for.as_deref(), Some("Vocabulary"));
    }
}
