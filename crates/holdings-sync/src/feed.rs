//! Background tasks that turn a snapshot stream into a published value

use futures::StreamExt;
use holdings_store::{Snapshot, SnapshotStream, StorePath};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Published value tagged with the number of snapshots applied so far
///
/// Revision 0 is the initial empty value published before the first
/// notification arrives.
#[derive(Debug, Clone, Default)]
pub struct Versioned<T> {
    /// Snapshots applied
    pub revision: u64,
    /// Latest projection
    pub value: T,
}

/// Running feed; aborted when dropped
#[derive(Debug)]
pub(crate) struct FeedTask {
    handle: JoinHandle<()>,
}

impl FeedTask {
    pub(crate) fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for FeedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Drive `feed`, replacing the published value with `project(snapshot)` on
/// every notification
///
/// Feed errors are logged and the feed keeps running; there is no retry.
///
/// # Panics
/// Panics if called outside a tokio runtime.
pub(crate) fn spawn_feed<T, F>(
    mut feed: SnapshotStream,
    path: &StorePath,
    tx: watch::Sender<Versioned<T>>,
    mut project: F,
) -> FeedTask
where
    T: Send + Sync + 'static,
    F: FnMut(&Snapshot) -> T + Send + 'static,
{
    let path = path.to_string();
    let handle = tokio::spawn(async move {
        tracing::info!(%path, "feed started");
        while let Some(item) = feed.next().await {
            match item {
                Ok(snapshot) => {
                    let value = project(&snapshot);
                    tx.send_modify(|published| {
                        published.revision += 1;
                        published.value = value;
                    });
                }
                Err(err) => tracing::error!(%path, error = %err, "feed notification failed"),
            }
        }
        tracing::info!(%path, "feed ended");
    });
    FeedTask { handle }
}

/// Wait until `rx` has published at least one snapshot
///
/// Returns early if the feed has stopped.
pub(crate) async fn wait_synced<T>(rx: &watch::Receiver<Versioned<T>>) {
    let mut rx = rx.clone();
    let _ = rx.wait_for(|published| published.revision > 0).await;
}
