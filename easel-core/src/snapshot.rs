//! Opaque canvas snapshot values.
//!
//! The editor frontend owns the canvas schema; the backend treats a
//! snapshot as an uninterpreted JSON value. The only question the backend
//! ever asks is whether a snapshot is empty, which gates history archival
//! on the first save of a document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A full canvas state, as sent by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Value);

impl Snapshot {
    /// Wrap a raw JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The empty canvas (`{}`) of a never-saved document.
    pub fn empty() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }

    /// True for JSON `null` and for the empty object.
    ///
    /// An empty snapshot is never archived into history.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Borrow the underlying JSON value.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Snapshot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_is_empty() {
        assert!(Snapshot::empty().is_empty());
        assert!(Snapshot::new(json!({})).is_empty());
    }

    #[test]
    fn test_null_is_empty() {
        assert!(Snapshot::new(Value::Null).is_empty());
    }

    #[test]
    fn test_populated_object_not_empty() {
        let snap = Snapshot::new(json!({"layers": [{"id": 1}]}));
        assert!(!snap.is_empty());
    }

    #[test]
    fn test_non_object_not_empty() {
        // Arrays and scalars are unusual payloads but count as content
        assert!(!Snapshot::new(json!([])).is_empty());
        assert!(!Snapshot::new(json!(0)).is_empty());
    }

    #[test]
    fn test_serde_transparent() {
        let snap = Snapshot::new(json!({"layers": []}));
        let text = serde_json::to_string(&snap).unwrap();
        assert_eq!(text, r#"{"layers":[]}"#);

        let back: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snap);
    }
}
