//! Slash-separated paths into the remote tree

use crate::error::StoreError;

/// Characters a key segment may not contain
const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']', '/'];

/// Validated path such as `holdings/3f2a...`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Parse a slash-separated path; leading and trailing slashes are ignored
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidPath`] for an empty path, an empty segment,
    /// or a segment containing `.`, `#`, `$`, `[` or `]`.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        let segments = trimmed
            .split('/')
            .map(|s| validate_segment(s).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| StoreError::InvalidPath(path.to_string()))?;
        Ok(Self { segments })
    }

    /// Path of a direct child
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidPath`] if `key` is not a valid segment.
    pub fn child(&self, key: &str) -> Result<Self, StoreError> {
        validate_segment(key)?;
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    /// Path segments, root first
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Check if `self` equals `other` or lies above it
    #[must_use]
    pub fn is_ancestor_of(&self, other: &StorePath) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl std::fmt::Display for StorePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

fn validate_segment(segment: &str) -> Result<&str, StoreError> {
    if segment.is_empty() || segment.contains(FORBIDDEN) {
        return Err(StoreError::InvalidPath(segment.to_string()));
    }
    Ok(segment)
}
