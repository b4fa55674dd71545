//! Holdings Store - the remote multi-writer tree the map synchronizes with
//!
//! Provides:
//! - [`RemoteStore`]: subscribe-for-snapshot reads, set-at-key and
//!   remove-at-key writes
//! - [`Snapshot`] and [`SnapshotStream`]: every change pushes the full
//!   current value of the subscribed path
//! - [`MemoryStore`]: an in-process implementation with the same push
//!   semantics, used by the CLI and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use holdings_store::{MemoryStore, RemoteStore, StorePath};
//!
//! let store = MemoryStore::new();
//! let holdings = StorePath::parse("holdings")?;
//! let mut feed = store.subscribe(&holdings);
//!
//! store.set(&holdings.child("k1")?, serde_json::json!({"latitude": 1.0})).await?;
//! while let Some(snapshot) = feed.next().await {
//!     println!("{} markers", snapshot?.children().count());
//! }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod memory;
pub mod path;
pub mod snapshot;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use path::StorePath;
pub use snapshot::{Snapshot, SnapshotStream};

use async_trait::async_trait;

/// Remote key-value tree
///
/// Writes are last-write-wins full overwrites. Implementations deliver
/// subscription snapshots in the order they apply writes.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Live feed of `path`: the current value first, then one snapshot per change
    ///
    /// The feed ends only when the store drops it; callers cancel by dropping
    /// the stream.
    fn subscribe(&self, path: &StorePath) -> SnapshotStream;

    /// Overwrite the value at `path`
    async fn set(&self, path: &StorePath, value: serde_json::Value) -> Result<(), StoreError>;

    /// Delete the value at `path`
    async fn remove(&self, path: &StorePath) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<S> {
    fn subscribe(&self, path: &StorePath) -> SnapshotStream {
        (**self).subscribe(path)
    }

    async fn set(&self, path: &StorePath, value: serde_json::Value) -> Result<(), StoreError> {
        (**self).set(path, value).await
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        (**self).remove(path).await
    }
}
