//! Full-value snapshots pushed by subscriptions

use crate::error::StoreError;
use futures::stream::BoxStream;
use serde_json::Value;

/// Live feed of snapshots for one path
pub type SnapshotStream = BoxStream<'static, Result<Snapshot, StoreError>>;

/// Value of a path at one point in time; `None` when nothing is stored there
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    value: Option<Value>,
}

impl Snapshot {
    /// Wrap a value; `Null` counts as absent
    #[must_use]
    pub fn new(value: Option<Value>) -> Self {
        Self {
            value: value.filter(|v| !v.is_null()),
        }
    }

    /// Snapshot of an absent path
    #[inline]
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Check if anything is stored
    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// Stored value
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Keyed children in store enumeration order; empty unless the value is an object
    pub fn children(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.value
            .as_ref()
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_absent() {
        assert!(!Snapshot::new(Some(Value::Null)).exists());
        assert!(!Snapshot::absent().exists());
        assert_eq!(Snapshot::absent().children().count(), 0);
    }

    #[test]
    fn children_of_object() {
        let snapshot = Snapshot::new(Some(json!({"a": 1, "b": 2})));
        let keys: Vec<_> = snapshot.children().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn scalar_has_no_children() {
        assert_eq!(Snapshot::new(Some(json!(5))).children().count(), 0);
    }
}
