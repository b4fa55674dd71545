//! Holdings Model - entities shared by every layer of the holdings map
//!
//! Provides:
//! - [`Marker`], a point of interest that is either an unsaved draft or a
//!   persisted record with a store-assigned [`MarkerId`]
//! - [`Holder`] and [`HolderSet`], the name to color mapping used to derive
//!   each marker's display color
//! - Wire encoding of both collections as stored under the remote tree
//! - [`HoldingsConfig`], loadable from TOML
//!
//! # Example
//!
//! ```rust
//! use holdings_model::{Color, Holder, HolderSet, Marker, Position};
//!
//! let holders = HolderSet::from(vec![Holder::new("Acme", "#ff0000")]);
//! let mut draft = Marker::draft(Position::new(10.0, 20.0));
//! draft.fields_mut().holder = Some("Acme".to_string());
//!
//! let color = holders.resolve_color(draft.fields().holder.as_deref(), &Color::default());
//! assert_eq!(color.as_str(), "#ff0000");
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod holder;
pub mod marker;

pub use config::{Bounds, HoldingsConfig, MapConfig, PinAppearance, SyncConfig};
pub use error::ModelError;
pub use holder::{Color, Holder, HolderSet};
pub use marker::{Marker, MarkerFields, MarkerId, Position};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
