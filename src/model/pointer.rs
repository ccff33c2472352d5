/*!
[SnapshotPointer] identifies a location inside a snapshot: the whole
document, a JSON path into it, or additionally a character span of a
string value at that path.
*/

use serde::{Deserialize, Serialize};

/// A half-open character range, `start ≤ end`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

/// Identifies a location inside a specific snapshot version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotPointer {
    /// Store id of the snapshot being pointed at.
    pub store_id: String,
    /// Version of the snapshot being pointed at.
    pub version: String,
    /// Optional restricted JSON-path expression (see [crate::pointer_resolve]).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub path: Option<String>,
    /// Optional character span, meaningful only when the resolved value
    /// at `path` is a string.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub span: Option<Span>,
}

impl SnapshotPointer {
    /// Point at the whole document of a snapshot version.
    pub fn whole(store_id: impl Into<String>, version: impl Into<String>) -> Self {
        SnapshotPointer {
            store_id: store_id.into(),
            version: version.into(),
            path: None,
            span: None,
        }
    }

    /// Point at a JSON path inside a snapshot version.
    pub fn at_path(
        store_id: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        SnapshotPointer {
            store_id: store_id.into(),
            version: version.into(),
            path: Some(path.into()),
            span: None,
        }
    }

    /// Attach a character span to this pointer.
    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some(Span { start, end });
        self
    }

    /// Encode as the colon-delimited wire key `"store_id:version[:path]"`.
    ///
    /// Spans are resolution-time concerns, not identity, and are never
    /// encoded. Paths containing colons do not round-trip through
    /// [Self::from_key] — this is a documented limitation, not a bug.
    pub fn to_key(&self) -> String {
        match &self.path {
            Some(path) => format!("{}:{}:{}", self.store_id, self.version, path),
            None => format!("{}:{}", self.store_id, self.version),
        }
    }

    /// Decode a key produced by [Self::to_key]. Splits on the first two
    /// colons only; a third field (if present) becomes `path` verbatim,
    /// including any further colons it contains.
    pub fn from_key(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, ':');
        let store_id = parts.next()?.to_string();
        let version = parts.next()?.to_string();
        let path = parts.next().map(|s| s.to_string());
        Some(SnapshotPointer {
            store_id,
            version,
            path,
            span: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_without_path() {
        let p = SnapshotPointer::whole("s", "v1");
        let key = p.to_key();
        assert_eq!(SnapshotPointer::from_key(&key), Some(p));
    }

    #[test]
    fn test_round_trip_with_path() {
        let p = SnapshotPointer::at_path("s", "v1", "$.speeches[0].text");
        let key = p.to_key();
        assert_eq!(SnapshotPointer::from_key(&key), Some(p));
    }

    #[test]
    fn test_span_not_encoded() {
        let p = SnapshotPointer::at_path("s", "v1", "$.a").with_span(0, 5);
        let key = p.to_key();
        let decoded = SnapshotPointer::from_key(&key).unwrap();
        assert_eq!(decoded.span, None);
    }

    #[test]
    fn test_from_key_missing_version() {
        assert_eq!(SnapshotPointer::from_key("only-store"), None);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_to_key_from_key_round_trips_without_colons(
            store_id in "[a-zA-Z0-9_-]{1,16}",
            version in "[a-zA-Z0-9_-]{1,16}",
        ) {
            let p = SnapshotPointer::whole(store_id, version);
            let key = p.to_key();
            prop_assert_eq!(SnapshotPointer::from_key(&key), Some(p));
        }

        #[test]
        fn test_to_key_from_key_round_trips_with_path_without_colons(
            store_id in "[a-zA-Z0-9_-]{1,16}",
            version in "[a-zA-Z0-9_-]{1,16}",
            path in "[a-zA-Z0-9_.\\[\\]$-]{1,32}",
        ) {
            let p = SnapshotPointer::at_path(store_id, version, path);
            let key = p.to_key();
            prop_assert_eq!(SnapshotPointer::from_key(&key), Some(p));
        }
    }
}
