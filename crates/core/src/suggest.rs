//! Turning analysis suggestions into a modification payload.
//!
//! Suggestions come from an external reviewer that read the extraction
//! payload. Each one points at a paragraph (by the same indices extraction
//! produced) and proposes replacement text.

use crate::change::{
    Change, ModificationRequest, ReplaceByIndex, ReplaceByShapeParagraph, SlideModification,
    TargetType,
};
use crate::error::{Error, Result};
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Regex matching a location that names the slide title.
static TITLE_LOCATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)标题|\btitle\b").unwrap());

/// Integers, whole floats and numeric strings such as `"3"`.
fn index_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Anything that is not an index reads as absent.
fn lenient_index<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(index_from_value))
}

/// Absent or `null` reads as absent; any other non-index value is an error,
/// since defaulting it would retarget the suggestion to slide 1.
fn strict_slide_number<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => index_from_value(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid slide_number: {}", value))),
    }
}

/// One reviewer suggestion. Fields the planner does not know are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    /// 1-based; treated as 1 when absent.
    #[serde(default, deserialize_with = "strict_slide_number", skip_serializing_if = "Option::is_none")]
    pub slide_number: Option<i64>,
    /// Free text such as "slide 3, title" or "第5页，第8段".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    /// Global content index; treated as 0 when absent.
    #[serde(default, deserialize_with = "lenient_index", skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<i64>,
    #[serde(default, deserialize_with = "lenient_index", skip_serializing_if = "Option::is_none")]
    pub shape_index: Option<i64>,
    #[serde(default, deserialize_with = "lenient_index", skip_serializing_if = "Option::is_none")]
    pub paragraph_index_in_shape: Option<i64>,
    #[serde(default, deserialize_with = "lenient_index", skip_serializing_if = "Option::is_none")]
    pub nonempty_index_in_shape: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Suggestion {
    pub fn is_title(&self) -> bool {
        self.target_type.as_deref() == Some("title")
            || self
                .location
                .as_deref()
                .is_some_and(|location| TITLE_LOCATION_REGEX.is_match(location))
    }

    fn key(&self) -> (Option<i64>, Option<&str>, Option<i64>, Option<&str>) {
        (
            self.slide_number,
            self.location.as_deref(),
            self.paragraph_index,
            self.current_content.as_deref(),
        )
    }

    fn to_change(&self, is_title: bool) -> Change {
        let paragraph_index = if is_title {
            0
        } else {
            self.paragraph_index.unwrap_or(0)
        };
        let old_text = self.current_content.clone().unwrap_or_default();
        let new_text = self.modification_suggestion.clone().unwrap_or_default();

        let has_in_shape_index =
            self.paragraph_index_in_shape.is_some() || self.nonempty_index_in_shape.is_some();
        if !is_title && self.shape_index.is_some() && has_in_shape_index {
            Change::ReplaceByShapeParagraph(ReplaceByShapeParagraph {
                shape_index: self.shape_index,
                paragraph_index_in_shape: self.paragraph_index_in_shape,
                nonempty_index_in_shape: self.nonempty_index_in_shape,
                paragraph_index: Some(paragraph_index),
                old_text,
                new_text,
                ..ReplaceByShapeParagraph::default()
            })
        } else {
            Change::ReplaceByIndex(ReplaceByIndex {
                paragraph_index: Some(paragraph_index),
                old_text,
                new_text,
                ..ReplaceByIndex::default()
            })
        }
    }
}

/// Read a suggestion array, dropping entries that cannot be placed on a
/// slide.
pub fn suggestions_from_value(list: Value) -> Result<Vec<Suggestion>> {
    let Value::Array(items) = list else {
        return Err(Error::Payload("expected a suggestion array".to_string()));
    };
    let mut suggestions = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(suggestion) => suggestions.push(suggestion),
            Err(e) => log::warn!("Skipping suggestion {}: {}", i, e),
        }
    }
    Ok(suggestions)
}

/// Build a modification payload: one entry per slide and target, slides
/// ascending, the title entry before the content entry.
pub fn plan_modifications(suggestions: &[Suggestion]) -> ModificationRequest {
    let mut by_slide: BTreeMap<i64, (Vec<Change>, Vec<Change>)> = BTreeMap::new();
    for suggestion in suggestions {
        let slide = suggestion.slide_number.unwrap_or(1);
        let is_title = suggestion.is_title();
        let (title, content) = by_slide.entry(slide).or_default();
        let bucket = if is_title { title } else { content };
        bucket.push(suggestion.to_change(is_title));
    }

    let mut entries = Vec::new();
    for (slide, (title, content)) in by_slide {
        for (target_type, changes) in [(TargetType::Title, title), (TargetType::Content, content)] {
            if changes.is_empty() {
                continue;
            }
            entries.push(SlideModification {
                slide_index: Some(slide),
                target_type,
                changes,
            });
        }
    }
    log::debug!(
        "Planned {} entries from {} suggestions",
        entries.len(),
        suggestions.len()
    );
    ModificationRequest::new(entries)
}

/// The fields a reviewer needs to refine a suggestion's wording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefineView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_index_in_shape: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonempty_index_in_shape: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_suggestion: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<&'a Value>,
}

pub fn refine_view(suggestions: &[Suggestion]) -> Vec<RefineView<'_>> {
    suggestions
        .iter()
        .map(|s| RefineView {
            problem_type: s.problem_type.as_deref(),
            slide_number: s.slide_number,
            location: s.location.as_deref(),
            paragraph_index: s.paragraph_index,
            shape_index: s.shape_index,
            paragraph_index_in_shape: s.paragraph_index_in_shape,
            nonempty_index_in_shape: s.nonempty_index_in_shape,
            current_content: s.current_content.as_deref(),
            modification_suggestion: s.modification_suggestion.as_deref(),
            priority: s.priority.as_ref(),
            confidence: s.confidence.as_ref(),
        })
        .collect()
}

/// Take refined wording back into the original suggestions.
///
/// An original is updated when a refined entry has the same slide number,
/// location, paragraph index and current content and carries a suggestion.
/// The last refined entry wins for duplicate keys.
pub fn merge_refined(original: &[Suggestion], refined: &[Suggestion]) -> Vec<Suggestion> {
    let mut refined_by_key = BTreeMap::new();
    for suggestion in refined {
        refined_by_key.insert(suggestion.key(), suggestion.modification_suggestion.as_deref());
    }

    original
        .iter()
        .map(|suggestion| {
            let mut merged = suggestion.clone();
            if let Some(Some(text)) = refined_by_key.get(&suggestion.key()) {
                merged.modification_suggestion = Some(text.to_string());
            }
            merged
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestions(json: &str) -> Vec<Suggestion> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_title_detection() {
        let parsed = suggestions(
            r#"[{"location": "第3页，标题"}, {"location": "Slide 2 title"},
                {"target_type": "title"}, {"location": "Subtitles and captions"},
                {"location": "第5页，第8段"}]"#,
        );
        let flags: Vec<bool> = parsed.iter().map(Suggestion::is_title).collect();
        assert_eq!(flags, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_plan_groups_and_orders() {
        let parsed = suggestions(
            r#"[
                {"slide_number": 3, "location": "body", "paragraph_index": 4,
                 "current_content": "old body", "modification_suggestion": "new body"},
                {"slide_number": 1, "location": "第1页，标题", "paragraph_index": 7,
                 "current_content": "Old Title", "modification_suggestion": "New Title"},
                {"slide_number": 3, "target_type": "title",
                 "current_content": "T3", "modification_suggestion": "T3'"},
                {"slide_number": 3, "paragraph_index": 1, "shape_index": 2, "nonempty_index_in_shape": 0,
                 "current_content": "a", "modification_suggestion": "b", "priority": "high"}
            ]"#,
        );
        let plan = plan_modifications(&parsed);
        let shape: Vec<_> = plan
            .entries
            .iter()
            .map(|e| (e.slide_index, e.target_type, e.changes.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (Some(1), TargetType::Title, 1),
                (Some(3), TargetType::Title, 1),
                (Some(3), TargetType::Content, 2),
            ]
        );

        match &plan.entries[0].changes[0] {
            Change::ReplaceByIndex(c) => {
                assert_eq!(c.paragraph_index, Some(0));
                assert_eq!(c.old_text, "Old Title");
                assert_eq!(c.new_text, "New Title");
            }
            other => panic!("unexpected change {:?}", other),
        }
        match &plan.entries[2].changes[1] {
            Change::ReplaceByShapeParagraph(c) => {
                assert_eq!(c.shape_index, Some(2));
                assert_eq!(c.paragraph_index_in_shape, None);
                assert_eq!(c.nonempty_index_in_shape, Some(0));
                assert_eq!(c.paragraph_index, Some(1));
            }
            other => panic!("unexpected change {:?}", other),
        }
        assert_eq!(plan.entries[2].changes[0].order_key(), 4);
    }

    #[test]
    fn test_unreadable_shape_index_uses_content_index() {
        let parsed = suggestions(
            r#"[{"shape_index": "second", "paragraph_index_in_shape": 1, "current_content": "x"}]"#,
        );
        let plan = plan_modifications(&parsed);
        assert_eq!(plan.entries[0].slide_index, Some(1));
        assert!(matches!(plan.entries[0].changes[0], Change::ReplaceByIndex(_)));
    }

    #[test]
    fn test_numeric_strings_are_indices() {
        let parsed = suggestions(
            r#"[{"slide_number": "3", "paragraph_index": " 2 ", "shape_index": 1.0,
                 "nonempty_index_in_shape": "0", "current_content": "x"}]"#,
        );
        assert_eq!(parsed[0].slide_number, Some(3));
        let plan = plan_modifications(&parsed);
        assert_eq!(plan.entries[0].slide_index, Some(3));
        match &plan.entries[0].changes[0] {
            Change::ReplaceByShapeParagraph(c) => {
                assert_eq!(c.shape_index, Some(1));
                assert_eq!(c.nonempty_index_in_shape, Some(0));
                assert_eq!(c.paragraph_index, Some(2));
            }
            other => panic!("unexpected change {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_slide_number_drops_suggestion() {
        assert!(serde_json::from_str::<Suggestion>(r#"{"slide_number": "third"}"#).is_err());

        let parsed = suggestions_from_value(serde_json::json!([
            {"slide_number": "third", "current_content": "a", "modification_suggestion": "b"},
            {"slide_number": null, "current_content": "c", "modification_suggestion": "d"},
            {"slide_number": 2, "current_content": "e", "modification_suggestion": "f"}
        ]))
        .unwrap();
        assert_eq!(parsed.len(), 2);
        let plan = plan_modifications(&parsed);
        let slides: Vec<_> = plan.entries.iter().map(|e| e.slide_index).collect();
        assert_eq!(slides, vec![Some(1), Some(2)]);

        let err = suggestions_from_value(serde_json::json!({"slide_number": 1})).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidPayload);
    }

    #[test]
    fn test_refine_view_keeps_only_present_keys() {
        let parsed = suggestions(
            r#"[{"slide_number": 2, "location": "body", "current_content": "c",
                 "modification_suggestion": "m", "confidence": 0.8, "reasoning": "long text"}]"#,
        );
        let view = serde_json::to_value(refine_view(&parsed)).unwrap();
        assert_eq!(
            view,
            serde_json::json!([{
                "slide_number": 2, "location": "body", "current_content": "c",
                "modification_suggestion": "m", "confidence": 0.8
            }])
        );
    }

    #[test]
    fn test_merge_refined() {
        let original = suggestions(
            r#"[{"slide_number": 1, "location": "body", "paragraph_index": 0,
                 "current_content": "a", "modification_suggestion": "a1", "reasoning": "kept"},
                {"slide_number": 1, "location": "body", "paragraph_index": 1,
                 "current_content": "b", "modification_suggestion": "b1"}]"#,
        );
        let refined = suggestions(
            r#"[{"slide_number": 1, "location": "body", "paragraph_index": 0,
                 "current_content": "a", "modification_suggestion": "a2"},
                {"slide_number": 1, "location": "body", "paragraph_index": 1,
                 "current_content": "b", "modification_suggestion": null}]"#,
        );
        let merged = merge_refined(&original, &refined);
        assert_eq!(merged[0].modification_suggestion.as_deref(), Some("a2"));
        assert_eq!(merged[0].extra.get("reasoning"), Some(&Value::from("kept")));
        assert_eq!(merged[1].modification_suggestion.as_deref(), Some("b1"));
    }
}
