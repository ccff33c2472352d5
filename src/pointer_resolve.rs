/*!
Resolution of a [SnapshotPointer] into a concrete value: look up the
snapshot, narrow by JSON path, then narrow by character span.

Pointer resolution works over a JSON projection of a snapshot's decoded
data (`serde_json::Value`), which lets a single resolver serve any
codec's output — callers that need a typed result re-deserialize the
resolved [serde_json::Value] with [resolve_pointer_as].
*/

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CrateError, Result};
use crate::model::pointer::{SnapshotPointer, Span};

/// A source of decoded snapshot content, projected to JSON, for a given
/// store. Implemented by adapters over a [crate::engine::SnapshotEngine]
/// or any backend whose data is JSON-representable.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the decoded content of `version` as a JSON value.
    async fn get_json(&self, version: &str) -> Result<Value>;
}

/// Maps store ids to the [SnapshotSource] that serves them.
#[derive(Default, Clone)]
pub struct StoreRegistry {
    sources: HashMap<String, Arc<dyn SnapshotSource>>,
}

impl StoreRegistry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source for `store_id`.
    pub fn register(&mut self, store_id: impl Into<String>, source: Arc<dyn SnapshotSource>) {
        self.sources.insert(store_id.into(), source);
    }

    /// Look up the source registered for `store_id`.
    pub fn get(&self, store_id: &str) -> Option<&Arc<dyn SnapshotSource>> {
        self.sources.get(store_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Property(String),
    Index(usize),
}

/// Parse the restricted JSON-path grammar: root `$`, dot property
/// access, bracketed integer index.
///
/// Grammar: `('$' ('.')? | '')? (segment ('.' segment | '[' digits ']')*)?`
/// where `segment` is a non-empty identifier.
fn parse_path(path: &str) -> Result<Vec<PathSegment>> {
    let mut rest = path.trim();
    if let Some(stripped) = rest.strip_prefix('$') {
        rest = stripped.strip_prefix('.').unwrap_or(stripped);
    }
    if rest.is_empty() {
        return Ok(vec![]);
    }

    let mut segments = Vec::new();
    for dot_part in rest.split('.') {
        if dot_part.is_empty() {
            return Err(CrateError::ValidationError(format!(
                "empty path segment in '{path}'"
            )));
        }
        let mut remainder = dot_part;
        // A leading identifier, optionally followed by one or more `[n]` index accessors.
        let ident_len = remainder
            .find('[')
            .unwrap_or(remainder.len());
        let ident = &remainder[..ident_len];
        if ident.is_empty() {
            return Err(CrateError::ValidationError(format!(
                "missing property name before index in '{path}'"
            )));
        }
        segments.push(PathSegment::Property(ident.to_string()));
        remainder = &remainder[ident_len..];
        while !remainder.is_empty() {
            if !remainder.starts_with('[') {
                return Err(CrateError::ValidationError(format!(
                    "malformed path '{path}'"
                )));
            }
            let close = remainder.find(']').ok_or_else(|| {
                CrateError::ValidationError(format!("unterminated index in '{path}'"))
            })?;
            let digits = &remainder[1..close];
            let index: usize = digits
                .parse()
                .map_err(|_| CrateError::ValidationError(format!("invalid index '{digits}' in '{path}'")))?;
            segments.push(PathSegment::Index(index));
            remainder = &remainder[close + 1..];
        }
    }
    Ok(segments)
}

/// Navigate `value` by `segments`. Returns `Ok(None)` when the final
/// segment names a property or index absent on an otherwise navigable
/// container (the "missing property" / undefined-equivalent case).
/// Returns `NotFound` when a non-final segment (or any segment on a
/// non-object/non-array value) cannot be traversed.
fn navigate(value: &Value, segments: &[PathSegment]) -> Result<Option<Value>> {
    let mut current = value.clone();
    for (i, seg) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;
        match seg {
            PathSegment::Property(name) => match current.as_object() {
                Some(obj) => match obj.get(name) {
                    Some(next) => current = next.clone(),
                    None if is_last => return Ok(None),
                    None => {
                        return Err(CrateError::NotFound(format!(
                            "path traverses missing property '{name}'"
                        )))
                    }
                },
                None => {
                    return Err(CrateError::NotFound(format!(
                        "path traverses non-object at property '{name}'"
                    )))
                }
            },
            PathSegment::Index(idx) => match current.as_array() {
                Some(arr) => match arr.get(*idx) {
                    Some(next) => current = next.clone(),
                    None if is_last => return Ok(None),
                    None => {
                        return Err(CrateError::NotFound(format!(
                            "path traverses out-of-range index [{idx}]"
                        )))
                    }
                },
                None => {
                    return Err(CrateError::NotFound(format!(
                        "path traverses non-array at index [{idx}]"
                    )))
                }
            },
        }
    }
    Ok(Some(current))
}

/// Apply a character span to a string value.
///
/// `apply_span("abc", {0,0})` is `""`. Fails with
/// [CrateError::ValidationError] when `start > end` or `end > len`.
pub fn apply_span(value: &str, span: &Span) -> Result<String> {
    let chars: Vec<char> = value.chars().collect();
    if span.start > span.end {
        return Err(CrateError::ValidationError(format!(
            "span start {} is after end {}",
            span.start, span.end
        )));
    }
    if span.end > chars.len() {
        return Err(CrateError::ValidationError(format!(
            "span end {} exceeds length {}",
            span.end,
            chars.len()
        )));
    }
    Ok(chars[span.start..span.end].iter().collect())
}

/// Resolve a pointer to a JSON value, applying `path` and `span` in order.
pub async fn resolve_pointer(registry: &StoreRegistry, pointer: &SnapshotPointer) -> Result<Value> {
    let source = registry
        .get(&pointer.store_id)
        .ok_or_else(|| CrateError::NotFound(format!("no such store '{}'", pointer.store_id)))?;
    let mut value = source.get_json(&pointer.version).await?;

    if let Some(path) = &pointer.path {
        let segments = parse_path(path)?;
        value = navigate(&value, &segments)?.unwrap_or(Value::Null);
    }

    if let Some(span) = &pointer.span {
        if let Value::String(s) = &value {
            value = Value::String(apply_span(s, span)?);
        }
        // Non-string values silently ignore `span`, per design.
    }

    Ok(value)
}

/// Resolve a pointer and deserialize the result into `T`.
pub async fn resolve_pointer_as<T: DeserializeOwned>(
    registry: &StoreRegistry,
    pointer: &SnapshotPointer,
) -> Result<T> {
    let value = resolve_pointer(registry, pointer).await?;
    serde_json::from_value(value).map_err(|e| CrateError::ValidationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path_root_only() {
        assert_eq!(parse_path("$").unwrap(), vec![]);
        assert_eq!(parse_path("").unwrap(), vec![]);
    }

    #[test]
    fn test_parse_path_dotted() {
        assert_eq!(
            parse_path("$.speeches[0].text").unwrap(),
            vec![
                PathSegment::Property("speeches".into()),
                PathSegment::Index(0),
                PathSegment::Property("text".into()),
            ]
        );
    }

    #[test]
    fn test_navigate_full_document() {
        let value = json!({"a": 1});
        assert_eq!(navigate(&value, &[]).unwrap(), Some(value));
    }

    #[test]
    fn test_navigate_missing_leaf_is_absent() {
        let value = json!({"a": 1});
        let segments = parse_path("$.b").unwrap();
        assert_eq!(navigate(&value, &segments).unwrap(), None);
    }

    #[test]
    fn test_navigate_through_non_object_is_not_found() {
        let value = json!({"a": 1});
        let segments = parse_path("$.a.b").unwrap();
        let err = navigate(&value, &segments).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_navigate_nested_path() {
        let value = json!({"speeches": [{"text": "Hello, world!"}]});
        let segments = parse_path("$.speeches[0].text").unwrap();
        assert_eq!(
            navigate(&value, &segments).unwrap(),
            Some(json!("Hello, world!"))
        );
    }

    #[test]
    fn test_apply_span_empty() {
        assert_eq!(apply_span("abc", &Span { start: 0, end: 0 }).unwrap(), "");
    }

    #[test]
    fn test_apply_span_out_of_range() {
        assert!(apply_span("abc", &Span { start: 0, end: 4 }).is_err());
    }

    #[test]
    fn test_apply_span_start_after_end() {
        assert!(apply_span("abc", &Span { start: 2, end: 1 }).is_err());
    }

    #[test]
    fn test_apply_span_extracts_prefix() {
        assert_eq!(apply_span("Hello, world!", &Span { start: 0, end: 5 }).unwrap(), "Hello");
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_valid_span_length_matches_end_minus_start(
            value in "[a-zA-Z ]{0,64}",
            start in 0usize..64,
            len in 0usize..64,
        ) {
            let chars = value.chars().count();
            let start = start.min(chars);
            let end = (start + len).min(chars);
            let result = apply_span(&value, &Span { start, end }).unwrap();
            prop_assert_eq!(result.chars().count(), end - start);
        }

        #[test]
        fn test_end_past_length_is_validation_error(value in "[a-zA-Z ]{0,32}", overshoot in 1usize..16) {
            let chars = value.chars().count();
            let err = apply_span(&value, &Span { start: 0, end: chars + overshoot }).unwrap_err();
            prop_assert_eq!(err.kind(), "validation_error");
        }

        #[test]
        fn test_start_after_end_is_validation_error(value in "[a-zA-Z ]{1,32}", gap in 1usize..8) {
            let chars = value.chars().count();
            let end = chars / 2;
            let start = end + gap;
            let err = apply_span(&value, &Span { start, end }).unwrap_err();
            prop_assert_eq!(err.kind(), "validation_error");
        }
    }
}
