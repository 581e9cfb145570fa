// src/normalize.rs
//! Response normalizer: untrusted model text in, guaranteed-shape idea records out.
//!
//! Total structural failure (no JSON, bad JSON, no `ideas` array, empty array)
//! is an error for the request. Partial field loss inside an element is not:
//! the field gets a placeholder and the element is logged as suspect.

use metrics::counter;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::MalformedOutput;
use crate::ideas::{
    IdeaRecord, DEFAULT_CATEGORY, DEFAULT_EXECUTION_GUIDE, DEFAULT_FORMAT, DEFAULT_HOOK_TITLE,
};

/// Top-level key holding the idea list.
pub const IDEAS_FIELD: &str = "ideas";

/// Max chars of model output quoted in logs.
const SNIPPET_CHARS: usize = 200;

/// Parse raw model output into idea records, preserving element order.
pub fn parse_response(raw: &str) -> Result<Vec<IdeaRecord>, MalformedOutput> {
    let result = parse_inner(raw);
    if let Err(e) = &result {
        warn!(error = %e, snippet = %snippet(raw), "model output rejected");
    }
    result
}

fn parse_inner(raw: &str) -> Result<Vec<IdeaRecord>, MalformedOutput> {
    let json = extract_json_span(raw).ok_or(MalformedOutput::NoJson)?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| MalformedOutput::InvalidJson(e.to_string()))?;

    let items = value
        .get(IDEAS_FIELD)
        .and_then(Value::as_array)
        .ok_or(MalformedOutput::MissingField(IDEAS_FIELD))?;
    if items.is_empty() {
        return Err(MalformedOutput::NoIdeas);
    }

    Ok(items
        .iter()
        .enumerate()
        .map(|(i, item)| coerce_idea(i, item))
        .collect())
}

/// Greedy span from the first `{` to the last `}`.
///
/// Tolerates leading prose and markdown fences. Known limitation: when the
/// model emits several brace-delimited blocks the span covers all of them,
/// which then fails to parse as one object.
pub fn extract_json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn coerce_idea(index: usize, item: &Value) -> IdeaRecord {
    let empty = Map::new();
    let obj = item.as_object().unwrap_or(&empty);
    let mut defaulted: Vec<&'static str> = Vec::new();

    let mut field = |name: &'static str, fallback: &str| -> String {
        // Whitespace only decides emptiness; present values are copied as-is.
        match obj.get(name).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => {
                defaulted.push(name);
                fallback.to_string()
            }
        }
    };

    let idea = IdeaRecord {
        category: field("category", DEFAULT_CATEGORY),
        suggested_format: field("suggestedFormat", DEFAULT_FORMAT),
        hook_title: field("hookTitle", DEFAULT_HOOK_TITLE),
        execution_guide: field("executionGuide", DEFAULT_EXECUTION_GUIDE),
    };

    if !defaulted.is_empty() {
        counter!("ideas_fields_defaulted_total").increment(defaulted.len() as u64);
        warn!(index, fields = ?defaulted, "idea entry incomplete; placeholders applied");
    }
    idea
}

fn snippet(raw: &str) -> String {
    let mut s: String = raw.chars().take(SNIPPET_CHARS).collect();
    if raw.chars().count() > SNIPPET_CHARS {
        s.push_str("...");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{"ideas":[
        {"category":"Practical tip","suggestedFormat":"15s reel","hookTitle":"3 ways to keep bread fresh","executionGuide":"Film the tricks. Ask followers to share theirs."},
        {"category":"Viral trend","suggestedFormat":"Carousel","hookTitle":"Croissant glow-up","executionGuide":"Before/after shots. Tag a friend!"}
    ]}"#;

    #[test]
    fn well_formed_json_is_copied_through() {
        let ideas = parse_response(WELL_FORMED).unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].category, "Practical tip");
        assert_eq!(ideas[0].suggested_format, "15s reel");
        assert_eq!(ideas[0].hook_title, "3 ways to keep bread fresh");
        assert_eq!(
            ideas[0].execution_guide,
            "Film the tricks. Ask followers to share theirs."
        );
        assert_eq!(ideas[1].category, "Viral trend");
    }

    #[test]
    fn fenced_and_prose_wrapped_json_matches_unwrapped() {
        let wrapped = format!("Sure! Here are your ideas:\n```json\n{WELL_FORMED}\n```\nGood luck.");
        assert_eq!(
            parse_response(&wrapped).unwrap(),
            parse_response(WELL_FORMED).unwrap()
        );
    }

    #[test]
    fn no_braces_means_no_json() {
        assert_eq!(
            parse_response("I cannot help with that."),
            Err(MalformedOutput::NoJson)
        );
        assert_eq!(parse_response("} backwards {"), Err(MalformedOutput::NoJson));
    }

    #[test]
    fn syntax_error_is_invalid_json_not_partial() {
        let err = parse_response(r#"{"ideas":[{"category":"A",}"#).unwrap_err();
        assert!(matches!(err, MalformedOutput::InvalidJson(_)), "{err:?}");
    }

    #[test]
    fn missing_or_non_array_ideas_names_the_field() {
        let err = parse_response(r#"{"posts":[]}"#).unwrap_err();
        assert_eq!(err, MalformedOutput::MissingField("ideas"));
        assert!(err.to_string().contains("ideas"));

        let err = parse_response(r#"{"ideas":"none"}"#).unwrap_err();
        assert_eq!(err, MalformedOutput::MissingField("ideas"));
    }

    #[test]
    fn empty_array_is_an_error() {
        assert_eq!(
            parse_response(r#"{"ideas": []}"#),
            Err(MalformedOutput::NoIdeas)
        );
    }

    #[test]
    fn missing_fields_get_placeholders_and_nothing_is_dropped() {
        let raw = r#"{"ideas":[
            {"category":"Special promotion"},
            {"hookTitle":"", "executionGuide": 42},
            "not an object"
        ]}"#;
        let ideas = parse_response(raw).unwrap();
        assert_eq!(ideas.len(), 3);

        assert_eq!(ideas[0].category, "Special promotion");
        assert_eq!(ideas[0].suggested_format, DEFAULT_FORMAT);
        assert_eq!(ideas[1].category, DEFAULT_CATEGORY);
        assert_eq!(ideas[1].hook_title, DEFAULT_HOOK_TITLE);
        assert_eq!(ideas[1].execution_guide, DEFAULT_EXECUTION_GUIDE);
        for idea in &ideas {
            assert!(!idea.category.is_empty());
            assert!(!idea.suggested_format.is_empty());
            assert!(!idea.hook_title.is_empty());
            assert!(!idea.execution_guide.is_empty());
        }
    }

    #[test]
    fn present_fields_keep_surrounding_whitespace() {
        let raw = r#"{"ideas":[{"category":"  Practical tip ","suggestedFormat":"Reel\n","hookTitle":" Hook","executionGuide":"Desc "}]}"#;
        let ideas = parse_response(raw).unwrap();
        assert_eq!(ideas[0].category, "  Practical tip ");
        assert_eq!(ideas[0].suggested_format, "Reel\n");
        assert_eq!(ideas[0].hook_title, " Hook");
        assert_eq!(ideas[0].execution_guide, "Desc ");
    }

    #[test]
    fn multiple_blocks_are_over_captured() {
        let raw = r#"{"ideas":[{"category":"A"}]} and also {"other":1}"#;
        assert!(matches!(
            parse_response(raw),
            Err(MalformedOutput::InvalidJson(_))
        ));
    }

    #[test]
    fn snippet_is_truncated() {
        let long = "x".repeat(500);
        let s = snippet(&long);
        assert_eq!(s.chars().count(), SNIPPET_CHARS + 3);
    }
}
