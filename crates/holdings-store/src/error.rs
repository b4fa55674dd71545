//! Error types for remote store access

/// Remote store error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Store refused a write or remove
    #[error("write rejected at {path}: {reason}")]
    WriteRejected {
        /// Target path
        path: String,
        /// Reason given by the store
        reason: String,
    },

    /// Path is empty or contains a forbidden character
    #[error("invalid path {0:?}")]
    InvalidPath(String),
}

impl StoreError {
    /// Check if the failure is a transport problem rather than a refusal
    #[inline]
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path() {
        let err = StoreError::WriteRejected {
            path: "holdings/k1".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("holdings/k1"));
        assert!(!err.is_unavailable());
        assert!(StoreError::Unavailable("offline".to_string()).is_unavailable());
    }
}
