//! Marker commands
//!
//! Every write re-derives `marker_color` from the holder set current at write
//! time and strips the id from the stored value (the id is the key). Nothing
//! is applied locally: the marker feed is the only source of truth for what
//! appears and disappears.

use crate::error::CommandError;
use crate::feed::Versioned;
use crate::markers::{find_in, MarkerSnapshot};
use holdings_model::{Color, HolderSet, Marker, MarkerFields, MarkerId, Position};
use holdings_store::{RemoteStore, StorePath};
use std::sync::Arc;
use tokio::sync::watch;

/// Outcome of a drag-end relocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    /// Update written for this marker
    Applied(MarkerId),
    /// No live marker carries the pin's id; nothing written
    Dropped,
}

/// Translates user intents into remote writes
#[derive(Clone)]
pub struct CommandHandler {
    store: Arc<dyn RemoteStore>,
    holdings: StorePath,
    holders: watch::Receiver<Versioned<HolderSet>>,
    markers: watch::Receiver<Versioned<MarkerSnapshot>>,
    default_color: Color,
}

impl CommandHandler {
    /// Create a handler writing under `holdings`
    #[must_use]
    pub fn new(
        store: Arc<dyn RemoteStore>,
        holdings: StorePath,
        holders: watch::Receiver<Versioned<HolderSet>>,
        markers: watch::Receiver<Versioned<MarkerSnapshot>>,
        default_color: Color,
    ) -> Self {
        Self {
            store,
            holdings,
            holders,
            markers,
            default_color,
        }
    }

    /// Persist a draft under a freshly generated key
    ///
    /// Any id the draft carries is discarded. The new marker shows up in the
    /// marker feed asynchronously, not necessarily before this returns.
    ///
    /// # Errors
    /// - `CommandError::Model` if the name is empty or unset, or a coordinate
    ///   is not finite (nothing written)
    /// - `CommandError::Store` if the write fails
    pub async fn create(&self, draft: Marker) -> Result<MarkerId, CommandError> {
        let (_, fields) = draft.into_parts();
        fields.validate()?;

        let id = MarkerId::generate();
        self.write(&id, fields).await?;
        tracing::info!(%id, "marker created");
        Ok(id)
    }

    /// Overwrite a persisted marker at its existing key
    ///
    /// # Errors
    /// - `CommandError::MissingId` for an unsaved marker
    /// - `CommandError::Model` if the name is empty or unset (nothing written)
    /// - `CommandError::Store` if the write fails
    pub async fn update(&self, marker: Marker) -> Result<(), CommandError> {
        let Marker::Saved { id, fields } = marker else {
            return Err(CommandError::MissingId);
        };
        fields.validate()?;

        self.write(&id, fields).await?;
        tracing::info!(%id, "marker updated");
        Ok(())
    }

    /// Submit the edit form: create drafts, update persisted markers
    ///
    /// # Errors
    /// Same as [`Self::create`] and [`Self::update`].
    pub async fn save(&self, marker: Marker) -> Result<MarkerId, CommandError> {
        match marker {
            Marker::Unsaved(_) => self.create(marker).await,
            Marker::Saved { ref id, .. } => {
                let id = id.clone();
                self.update(marker).await?;
                Ok(id)
            }
        }
    }

    /// Remove a persisted marker
    ///
    /// # Errors
    /// - `CommandError::MissingId` for an unsaved marker
    /// - `CommandError::Store` if the remove fails
    pub async fn delete(&self, marker: &Marker) -> Result<(), CommandError> {
        let id = marker.id().ok_or(CommandError::MissingId)?;
        let path = self.holdings.child(id.as_str())?;
        self.store.remove(&path).await?;
        tracing::info!(%id, "marker deleted");
        Ok(())
    }

    /// Move the live marker carrying `id` to `to`, keeping every other field
    ///
    /// Resolves `id` against the latest marker snapshot, not against whatever
    /// the pin was rendered from. Records written by other clients may lack a
    /// name; a drag still moves them.
    ///
    /// # Errors
    /// - `CommandError::Model` if `to` is not finite (nothing written)
    /// - `CommandError::Store` if the write fails
    pub async fn relocate(&self, id: &MarkerId, to: Position) -> Result<Relocation, CommandError> {
        let current = find_in(&self.markers.borrow().value, id);
        let Some(current) = current else {
            tracing::warn!(%id, "relocate dropped: marker no longer present");
            return Ok(Relocation::Dropped);
        };

        let (_, fields) = current.moved_to(to).into_parts();
        self.write(id, fields).await?;
        tracing::info!(%id, "marker relocated");
        Ok(Relocation::Applied(id.clone()))
    }

    /// Color `fields` against the current holders and set them at `id`
    async fn write(&self, id: &MarkerId, mut fields: MarkerFields) -> Result<(), CommandError> {
        fields.check_position()?;
        let holders = self.holders.borrow().value.clone();
        fields.recolor(&holders, &self.default_color);

        let path = self.holdings.child(id.as_str())?;
        let record = fields.to_record()?;
        self.store.set(&path, record).await?;
        Ok(())
    }
}
