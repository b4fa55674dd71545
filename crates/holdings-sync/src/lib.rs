//! Holdings Sync - keeps markers and holders consistent with the remote tree
//!
//! Data flow:
//! - [`HolderRegistry`] and [`MarkerStore`] each own one live feed and
//!   replace their snapshot wholesale on every notification
//! - [`SyncEngine`] owns both feeds and gates the marker snapshots behind the
//!   one-shot [`ViewReady`] signal
//! - [`CommandHandler`] turns create/update/delete/relocate intents into
//!   remote writes, re-deriving the marker color at write time
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use holdings_model::SyncConfig;
//! use holdings_store::MemoryStore;
//! use holdings_sync::SyncEngine;
//! use std::sync::Arc;
//!
//! let engine = SyncEngine::start(Arc::new(MemoryStore::new()), &SyncConfig::default())?;
//! let mut view = engine.combined();
//! engine.view_ready().fire();
//!
//! while let Some(combined) = view.next().await {
//!     println!("{} markers", combined.markers.len());
//! }
//! ```

#![warn(unreachable_pub)]

pub mod commands;
pub mod engine;
pub mod error;
pub mod feed;
pub mod holders;
pub mod markers;

pub use commands::{CommandHandler, Relocation};
pub use engine::{gate, CombinedStream, CombinedView, SyncEngine, ViewReady};
pub use error::CommandError;
pub use feed::Versioned;
pub use holders::{project_holders, HolderRegistry};
pub use markers::{project_markers, MarkerSnapshot, MarkerStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
