//! Synchronization engine
//!
//! Owns both live feeds and exposes the combined view: marker snapshots
//! released only once the map surface has reported ready. After the first
//! release every later marker snapshot passes straight through; readiness
//! never needs to fire again.

use crate::commands::CommandHandler;
use crate::feed::Versioned;
use crate::holders::HolderRegistry;
use crate::markers::{MarkerSnapshot, MarkerStore};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use holdings_model::SyncConfig;
use holdings_store::{RemoteStore, StoreError, StorePath};
use std::sync::Arc;
use tokio::sync::watch;

/// One-shot "view ready" signal; clones share state
#[derive(Debug, Clone)]
pub struct ViewReady {
    tx: Arc<watch::Sender<bool>>,
}

impl ViewReady {
    /// Signal that has not fired
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::channel(false).0),
        }
    }

    /// Mark the view ready; later calls are no-ops
    ///
    /// Returns `true` only for the call that flipped the signal.
    pub fn fire(&self) -> bool {
        let fired = self.tx.send_if_modified(|ready| !std::mem::replace(ready, true));
        if fired {
            tracing::info!("view ready");
        }
        fired
    }

    /// Check if the signal has fired
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal has fired
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for ViewReady {
    fn default() -> Self {
        Self::new()
    }
}

/// Marker snapshot released to the view
#[derive(Debug, Clone)]
pub struct CombinedView {
    /// Markers to render
    pub markers: MarkerSnapshot,
    /// Marker-store revision the snapshot came from
    pub revision: u64,
}

/// Gated marker feed
pub type CombinedStream = BoxStream<'static, CombinedView>;

/// Release `markers` only after `ready` has fired
///
/// Emits the latest sequence as soon as the signal fires, then once per
/// later marker snapshot. Snapshots superseded before the view reads them
/// are skipped; each emission is a complete sequence. The stream ends when
/// the marker feed is torn down.
#[must_use]
pub fn gate(markers: watch::Receiver<Versioned<MarkerSnapshot>>, ready: ViewReady) -> CombinedStream {
    stream::unfold((markers, ready, false), |(mut markers, ready, opened)| async move {
        if opened {
            markers.changed().await.ok()?;
        } else {
            ready.wait().await;
        }
        let view = {
            let published = markers.borrow_and_update();
            CombinedView {
                markers: Arc::clone(&published.value),
                revision: published.revision,
            }
        };
        Some((view, (markers, ready, true)))
    })
    .boxed()
}

/// Live holders, live markers and the ready gate between them and the view
pub struct SyncEngine {
    store: Arc<dyn RemoteStore>,
    holdings_path: StorePath,
    default_color: holdings_model::Color,
    holders: HolderRegistry,
    markers: MarkerStore,
    ready: ViewReady,
}

impl SyncEngine {
    /// Subscribe to both collections named in `config`
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidPath`] if a configured path is invalid.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn start(store: Arc<dyn RemoteStore>, config: &SyncConfig) -> Result<Self, StoreError> {
        let holders_path = StorePath::parse(&config.holders_path)?;
        let holdings_path = StorePath::parse(&config.holdings_path)?;

        let holders = HolderRegistry::spawn(store.as_ref(), &holders_path);
        let markers = MarkerStore::spawn(
            store.as_ref(),
            &holdings_path,
            &holders,
            config.default_color.clone(),
        );
        tracing::info!(holders = %holders_path, holdings = %holdings_path, "sync engine started");

        Ok(Self {
            store,
            holdings_path,
            default_color: config.default_color.clone(),
            holders,
            markers,
            ready: ViewReady::new(),
        })
    }

    /// Holder registry
    #[inline]
    #[must_use]
    pub fn holders(&self) -> &HolderRegistry {
        &self.holders
    }

    /// Marker store
    #[inline]
    #[must_use]
    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    /// Ready signal to fire once the map surface can take layer changes
    #[must_use]
    pub fn view_ready(&self) -> ViewReady {
        self.ready.clone()
    }

    /// Marker snapshots gated behind the ready signal
    #[must_use]
    pub fn combined(&self) -> CombinedStream {
        gate(self.markers.watch(), self.ready.clone())
    }

    /// Command handler writing to the same store and reading the same feeds
    #[must_use]
    pub fn commands(&self) -> CommandHandler {
        CommandHandler::new(
            Arc::clone(&self.store),
            self.holdings_path.clone(),
            self.holders.watch(),
            self.markers.watch(),
            self.default_color.clone(),
        )
    }

    /// Wait until both feeds have applied their first snapshot
    pub async fn synced(&self) {
        self.holders.synced().await;
        self.markers.synced().await;
    }

    /// Tear down both feeds; combined streams end after their next poll
    pub fn shutdown(&self) {
        self.holders.shutdown();
        self.markers.shutdown();
        tracing::info!("sync engine stopped");
    }
}
