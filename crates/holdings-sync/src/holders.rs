//! Holder registry
//!
//! Read-only projection of the `holders` tree. Each notification replaces the
//! whole set; an absent or empty tree publishes an empty set.

use crate::feed::{spawn_feed, wait_synced, FeedTask, Versioned};
use holdings_model::{Holder, HolderSet};
use holdings_store::{RemoteStore, Snapshot, StorePath};
use tokio::sync::watch;

/// Project a `holders` snapshot into a holder set
///
/// Records that do not decode are skipped with a warning.
#[must_use]
pub fn project_holders(snapshot: &Snapshot) -> HolderSet {
    if !snapshot.exists() {
        tracing::debug!("no holders stored");
    }
    snapshot
        .children()
        .filter_map(|(key, value)| match Holder::from_record(key, value.clone()) {
            Ok(holder) => Some(holder),
            Err(err) => {
                tracing::warn!(error = %err, "skipping holder record");
                None
            }
        })
        .collect()
}

/// Live holder set
#[derive(Debug)]
pub struct HolderRegistry {
    rx: watch::Receiver<Versioned<HolderSet>>,
    feed: FeedTask,
}

impl HolderRegistry {
    /// Subscribe to `path` and keep the set current
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn<S: RemoteStore + ?Sized>(store: &S, path: &StorePath) -> Self {
        let (tx, rx) = watch::channel(Versioned::default());
        let feed = spawn_feed(store.subscribe(path), path, tx, |snapshot| {
            let holders = project_holders(snapshot);
            tracing::debug!(count = holders.len(), "holders updated");
            holders
        });
        Self { rx, feed }
    }

    /// Latest holder set
    #[must_use]
    pub fn snapshot(&self) -> HolderSet {
        self.rx.borrow().value.clone()
    }

    /// Holder names for the edit form's picker
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.rx
            .borrow()
            .value
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Number of snapshots applied so far
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.rx.borrow().revision
    }

    /// Receiver for every published set
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Versioned<HolderSet>> {
        self.rx.clone()
    }

    /// Wait for the first snapshot
    pub async fn synced(&self) {
        wait_synced(&self.rx).await;
    }

    /// Stop the feed; the last published set stays readable
    pub fn shutdown(&self) {
        self.feed.abort();
    }
}
