//! Marker store
//!
//! Projection of the `holdings` tree: each record becomes a saved marker
//! keyed by its remote key, with `marker_color` derived from the holder set
//! current at projection time. Every notification replaces the whole
//! sequence. Order is the store's enumeration order and carries no meaning;
//! use the id for identity.

use crate::feed::{spawn_feed, wait_synced, FeedTask, Versioned};
use crate::holders::HolderRegistry;
use holdings_model::{Color, HolderSet, Marker, MarkerId};
use holdings_store::{RemoteStore, Snapshot, StorePath};
use std::sync::Arc;
use tokio::sync::watch;

/// Immutable marker sequence
pub type MarkerSnapshot = Arc<[Marker]>;

/// Project a `holdings` snapshot into markers colored against `holders`
///
/// Records that do not decode are skipped with a warning.
#[must_use]
pub fn project_markers(snapshot: &Snapshot, holders: &HolderSet, default: &Color) -> MarkerSnapshot {
    if !snapshot.exists() {
        tracing::debug!("no holdings stored");
    }
    snapshot
        .children()
        .filter_map(|(key, value)| match Marker::from_record(key, value.clone()) {
            Ok(mut marker) => {
                marker.fields_mut().recolor(holders, default);
                Some(marker)
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping holding record");
                None
            }
        })
        .collect()
}

/// Live marker sequence
#[derive(Debug)]
pub struct MarkerStore {
    rx: watch::Receiver<Versioned<MarkerSnapshot>>,
    feed: FeedTask,
}

impl MarkerStore {
    /// Subscribe to `path`, coloring each snapshot with the registry's latest holders
    ///
    /// A later holder change does not recolor markers already published; the
    /// next marker notification picks it up.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn<S: RemoteStore + ?Sized>(
        store: &S,
        path: &StorePath,
        holders: &HolderRegistry,
        default_color: Color,
    ) -> Self {
        let (tx, rx) = watch::channel(Versioned {
            revision: 0,
            value: MarkerSnapshot::from(Vec::new()),
        });
        let holders = holders.watch();
        let feed = spawn_feed(store.subscribe(path), path, tx, move |snapshot| {
            let markers = project_markers(snapshot, &holders.borrow().value, &default_color);
            tracing::debug!(count = markers.len(), "holdings updated");
            markers
        });
        Self { rx, feed }
    }

    /// Latest marker sequence
    #[must_use]
    pub fn snapshot(&self) -> MarkerSnapshot {
        Arc::clone(&self.rx.borrow().value)
    }

    /// Latest persisted marker with `id`
    #[must_use]
    pub fn find(&self, id: &MarkerId) -> Option<Marker> {
        find_in(&self.rx.borrow().value, id)
    }

    /// Number of snapshots applied so far
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.rx.borrow().revision
    }

    /// Receiver for every published sequence
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Versioned<MarkerSnapshot>> {
        self.rx.clone()
    }

    /// Wait for the first snapshot
    pub async fn synced(&self) {
        wait_synced(&self.rx).await;
    }

    /// Stop the feed; the last published sequence stays readable
    pub fn shutdown(&self) {
        self.feed.abort();
    }
}

pub(crate) fn find_in(markers: &[Marker], id: &MarkerId) -> Option<Marker> {
    markers.iter().find(|m| m.id() == Some(id)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdings_model::Holder;
    use serde_json::json;

    fn holders() -> HolderSet {
        HolderSet::from(vec![Holder::new("Acme", "#ff0000")])
    }

    #[test]
    fn assigns_ids_from_keys_and_derives_color() {
        let snapshot = Snapshot::new(Some(json!({
            "k1": {"latitude": 1.0, "longitude": 2.0, "holder": "Acme"},
            "k2": {"latitude": 5.0, "longitude": 5.0, "holder": "Unknown", "markerColor": "#abcdef"}
        })));
        let markers = project_markers(&snapshot, &holders(), &Color::new("#999999"));

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].id(), Some(&MarkerId::new("k1")));
        assert_eq!(markers[0].fields().marker_color, Some(Color::new("#ff0000")));
        // stored color is not authoritative
        assert_eq!(markers[1].fields().marker_color, Some(Color::new("#999999")));
    }

    #[test]
    fn absent_tree_is_empty_sequence() {
        assert!(project_markers(&Snapshot::absent(), &holders(), &Color::default()).is_empty());
    }

    #[test]
    fn malformed_records_are_skipped() {
        let snapshot = Snapshot::new(Some(json!({
            "k1": {"latitude": 1.0, "longitude": 2.0},
            "k2": {"name": "no position"}
        })));
        let markers = project_markers(&snapshot, &holders(), &Color::default());
        assert_eq!(markers.len(), 1);
        assert!(find_in(&markers, &MarkerId::new("k2")).is_none());
    }
}
