//! Holdings Map - draws the live markers as pins over a fixed image
//!
//! Components:
//! - [`SpatialProjection`]: marker to pin, click to draft, drag end to
//!   relocation target
//! - [`SpatialSurface`]: the drawing surface the binder talks to, with the
//!   in-memory [`HeadlessSurface`]
//! - [`ViewBinder`]: keeps the surface in step with the combined snapshot and
//!   routes gestures to commands or [`ViewEvent`]s
//!
//! # Example
//!
//! ```rust,ignore
//! use holdings_map::{HeadlessSurface, SurfaceEvent, ViewBinder};
//!
//! let (binder, mut events) = ViewBinder::attach(HeadlessSurface::new(), &engine, &config);
//! let surface = binder.run(surface_events, engine.combined(), edit_mode_rx).await;
//! ```

#![warn(unreachable_pub)]

pub mod binder;
pub mod projection;
pub mod surface;

pub use binder::{ViewBinder, ViewEvent};
pub use projection::{Pin, PinIcon, SpatialProjection};
pub use surface::{
    HeadlessSurface, Overlay, PinHandle, Propagation, SpatialSurface, SurfaceEvent, Viewport,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
