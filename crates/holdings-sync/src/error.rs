//! Error types for marker commands
//!
//! Only validation failures and remote failures are errors. Referential
//! misses (unknown holder, relocate of a vanished marker) are expected in a
//! multi-writer tree and resolve silently.

use holdings_model::ModelError;
use holdings_store::StoreError;

/// Command error
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Marker failed validation or could not be encoded; nothing was written
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Update or delete of a marker that has never been persisted
    #[error("marker has no id; it must be created first")]
    MissingId,

    /// Remote write or remove failed; not retried
    #[error("remote store error: {0}")]
    Store(#[from] StoreError),
}

impl CommandError {
    /// Check if the command was rejected before reaching the store
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Model(err) => err.is_validation(),
            Self::MissingId => true,
            Self::Store(_) => false,
        }
    }
}
