//! Markers
//!
//! A marker is either a client-side draft ([`Marker::Unsaved`]) or a record the
//! store has already keyed ([`Marker::Saved`]). The identifier is never a
//! field of the stored value: it is the remote key itself.

use crate::error::ModelError;
use crate::holder::{Color, HolderSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned marker key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    /// Wrap an existing key
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate a fresh random key (hyphenated UUID v4, 36 characters)
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the key
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Point in the map's image plane (not geographic)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Vertical image coordinate
    pub latitude: f64,
    /// Horizontal image coordinate
    pub longitude: f64,
}

impl Position {
    /// Create a position
    #[inline]
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Everything a marker carries besides its key
///
/// Descriptive attributes are opaque to the engine. `marker_color` is derived
/// from `holder` on every read and write and is never edited by hand.
/// Fields this type does not know about are kept in `extra` so that records
/// written by other clients survive a read-modify-write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerFields {
    /// Vertical image coordinate
    pub latitude: f64,
    /// Horizontal image coordinate
    pub longitude: f64,
    /// Display name, required before any write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Population, stored as written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<serde_json::Value>,
    /// Local chief
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chief: Option<String>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_info: Option<String>,
    /// First inn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inn1: Option<String>,
    /// Second inn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inn2: Option<String>,
    /// Third inn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inn3: Option<String>,
    /// Owning holder's name; may name a holder that does not exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    /// Derived display color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_color: Option<Color>,
    /// Fields written by other clients
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MarkerFields {
    /// Fields with only a position set
    #[inline]
    #[must_use]
    pub fn at(position: Position) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            ..Self::default()
        }
    }

    /// Current position
    #[inline]
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }

    /// Set name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set holder
    #[inline]
    #[must_use]
    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = Some(holder.into());
        self
    }

    /// Reject fields the edit form may not submit
    ///
    /// # Errors
    /// - [`ModelError::MissingName`] if `name` is unset or empty
    /// - [`ModelError::InvalidPosition`] if a coordinate is not finite
    pub fn validate(&self) -> Result<(), ModelError> {
        match self.name.as_deref() {
            None | Some("") => Err(ModelError::MissingName),
            Some(_) => self.check_position(),
        }
    }

    /// Reject coordinates that would not survive encoding
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidPosition`] if a coordinate is NaN or infinite.
    pub fn check_position(&self) -> Result<(), ModelError> {
        if self.latitude.is_finite() && self.longitude.is_finite() {
            Ok(())
        } else {
            Err(ModelError::InvalidPosition {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Re-derive `marker_color` from `holder`
    pub fn recolor(&mut self, holders: &HolderSet, default: &Color) {
        self.marker_color = Some(holders.resolve_color(self.holder.as_deref(), default));
    }

    /// Encode as the value stored under the marker's key
    ///
    /// A stray `id` carried in `extra` is dropped; the key is the id.
    ///
    /// # Errors
    /// Returns [`ModelError::Encode`] if serialization fails.
    pub fn to_record(&self) -> Result<serde_json::Value, ModelError> {
        let mut record = serde_json::to_value(self).map_err(ModelError::Encode)?;
        if let serde_json::Value::Object(map) = &mut record {
            map.remove("id");
        }
        Ok(record)
    }
}

/// A marker, with identity encoded in the variant
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    /// Constructed client-side, not yet written
    Unsaved(MarkerFields),
    /// Persisted under `id`
    Saved {
        /// Remote key, immutable once assigned
        id: MarkerId,
        /// Stored value
        fields: MarkerFields,
    },
}

impl Marker {
    /// Draft at `position` with nothing else set (map click in edit mode)
    #[inline]
    #[must_use]
    pub fn draft(position: Position) -> Self {
        Self::Unsaved(MarkerFields::at(position))
    }

    /// Persisted marker
    #[inline]
    #[must_use]
    pub fn saved(id: impl Into<MarkerId>, fields: MarkerFields) -> Self {
        Self::Saved {
            id: id.into(),
            fields,
        }
    }

    /// Decode the value stored under `key`
    ///
    /// # Errors
    /// Returns [`ModelError::MalformedRecord`] if the value lacks coordinates
    /// or a known field has the wrong type.
    pub fn from_record(key: &str, value: serde_json::Value) -> Result<Self, ModelError> {
        let fields = serde_json::from_value(value).map_err(|source| ModelError::MalformedRecord {
            key: key.to_string(),
            source,
        })?;
        Ok(Self::saved(MarkerId::new(key), fields))
    }

    /// Key, if persisted
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&MarkerId> {
        match self {
            Self::Unsaved(_) => None,
            Self::Saved { id, .. } => Some(id),
        }
    }

    /// Check if the store has keyed this marker
    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// Borrow fields
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &MarkerFields {
        match self {
            Self::Unsaved(fields) | Self::Saved { fields, .. } => fields,
        }
    }

    /// Mutably borrow fields
    #[inline]
    pub fn fields_mut(&mut self) -> &mut MarkerFields {
        match self {
            Self::Unsaved(fields) | Self::Saved { fields, .. } => fields,
        }
    }

    /// Split into key and fields
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Option<MarkerId>, MarkerFields) {
        match self {
            Self::Unsaved(fields) => (None, fields),
            Self::Saved { id, fields } => (Some(id), fields),
        }
    }

    /// Current position
    #[inline]
    #[must_use]
    pub fn position(&self) -> Position {
        self.fields().position()
    }

    /// Same marker at another position
    #[inline]
    #[must_use]
    pub fn moved_to(mut self, position: Position) -> Self {
        let fields = self.fields_mut();
        fields.latitude = position.latitude;
        fields.longitude = position.longitude;
        self
    }
}
