//! Holders and display colors
//!
//! A holder owns zero or more markers and carries the color its markers are
//! drawn with. Holder records are read-only here; the color join is a pure
//! lookup against the latest [`HolderSet`] snapshot.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fallback pin color when a marker's holder is unset or unknown
pub const DEFAULT_COLOR: &str = "#3388ff";

/// Display color string (usually `#rrggbb`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Wrap a color string
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the color string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self(DEFAULT_COLOR.to_string())
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Name to color mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holder {
    /// Lookup key matched against `MarkerFields::holder`
    pub name: String,
    /// Color used for this holder's markers
    pub color: Color,
}

/// Stored shape of a holder under the `holders` tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HolderRecord {
    holder_name: String,
    holder_color: String,
}

impl Holder {
    /// Create a holder
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Color::new(color),
        }
    }

    /// Decode a holder from its remote value
    ///
    /// # Errors
    /// Returns [`ModelError::MalformedRecord`] if `holderName` or
    /// `holderColor` is missing or not a string.
    pub fn from_record(key: &str, value: serde_json::Value) -> Result<Self, ModelError> {
        let record: HolderRecord =
            serde_json::from_value(value).map_err(|source| ModelError::MalformedRecord {
                key: key.to_string(),
                source,
            })?;
        Ok(Self::new(record.holder_name, record.holder_color))
    }

    /// Encode this holder as its remote value
    ///
    /// # Errors
    /// Returns [`ModelError::Encode`] if serialization fails.
    pub fn to_record(&self) -> Result<serde_json::Value, ModelError> {
        serde_json::to_value(HolderRecord {
            holder_name: self.name.clone(),
            holder_color: self.color.as_str().to_string(),
        })
        .map_err(ModelError::Encode)
    }
}

/// Immutable snapshot of every known holder
///
/// Cloning is cheap; a new snapshot replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HolderSet(Arc<[Holder]>);

impl HolderSet {
    /// Empty snapshot
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// First holder whose name matches exactly
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Holder> {
        self.0.iter().find(|h| h.name == name)
    }

    /// Color for a marker owned by `holder`, or `default` if unresolved
    #[must_use]
    pub fn resolve_color(&self, holder: Option<&str>, default: &Color) -> Color {
        holder
            .and_then(|name| self.find(name))
            .map_or_else(|| default.clone(), |h| h.color.clone())
    }

    /// Holder names in snapshot order, as offered by the edit form
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|h| h.name.as_str()).collect()
    }

    /// Iterate over holders
    pub fn iter(&self) -> impl Iterator<Item = &Holder> {
        self.0.iter()
    }

    /// Number of holders
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the snapshot is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Holder>> for HolderSet {
    fn from(holders: Vec<Holder>) -> Self {
        Self(holders.into())
    }
}

impl FromIterator<Holder> for HolderSet {
    fn from_iter<I: IntoIterator<Item = Holder>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn acme() -> HolderSet {
        HolderSet::from(vec![
            Holder::new("Acme", "#ff0000"),
            Holder::new("Globex", "#00ff00"),
        ])
    }

    #[test]
    fn resolves_known_holder() {
        let color = acme().resolve_color(Some("Acme"), &Color::default());
        assert_eq!(color, Color::new("#ff0000"));
    }

    #[test]
    fn unknown_or_unset_holder_falls_back() {
        let fallback = Color::new("#123456");
        assert_eq!(acme().resolve_color(Some("Unknown"), &fallback), fallback);
        assert_eq!(acme().resolve_color(None, &fallback), fallback);
        assert_eq!(HolderSet::empty().resolve_color(Some("Acme"), &fallback), fallback);
    }

    #[test]
    fn first_match_wins_on_duplicate_names() {
        let holders = HolderSet::from(vec![
            Holder::new("Acme", "#ff0000"),
            Holder::new("Acme", "#0000ff"),
        ]);
        assert_eq!(holders.find("Acme").unwrap().color.as_str(), "#ff0000");
    }

    #[test]
    fn decodes_wire_record() {
        let holder =
            Holder::from_record("h1", json!({"holderName": "Acme", "holderColor": "#ff0000"}))
                .unwrap();
        assert_eq!(holder, Holder::new("Acme", "#ff0000"));
        assert_eq!(
            holder.to_record().unwrap(),
            json!({"holderName": "Acme", "holderColor": "#ff0000"})
        );
    }

    #[test]
    fn rejects_record_without_color() {
        let err = Holder::from_record("h1", json!({"holderName": "Acme"})).unwrap_err();
        assert!(matches!(err, ModelError::MalformedRecord { ref key, .. } if key == "h1"));
    }

    #[test]
    fn names_follow_snapshot_order() {
        assert_eq!(acme().names(), vec!["Acme", "Globex"]);
        let colors: Vec<_> = acme().iter().map(|h| h.color.as_str().to_string()).collect();
        assert_eq!(colors, vec!["#ff0000", "#00ff00"]);
    }

    proptest! {
        #[test]
        fn prop_resolution_matches_named_holder(
            names in proptest::collection::vec("[a-z]{1,6}", 0..8),
            wanted in "[a-z]{1,6}",
        ) {
            let holders: HolderSet = names
                .iter()
                .enumerate()
                .map(|(i, n)| Holder::new(n.clone(), format!("#{i:06x}")))
                .collect();
            let fallback = Color::default();
            let resolved = holders.resolve_color(Some(&wanted), &fallback);

            match names.iter().position(|n| *n == wanted) {
                Some(i) => prop_assert_eq!(resolved, Color::new(format!("#{i:06x}"))),
                None => prop_assert_eq!(resolved, fallback),
            }
        }
    }
}
