//! Map surface abstraction
//!
//! The binder only ever talks to a [`SpatialSurface`]; the drawing library
//! behind it is an adapter concern. [`HeadlessSurface`] keeps every pin and
//! viewport change in memory for the CLI and for tests.

use crate::projection::Pin;
use holdings_model::{Bounds, MapConfig, Position};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Surface-assigned pin handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PinHandle(pub u64);

/// Gesture or lifecycle notification raised by the surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Surface can take layer changes
    Ready,
    /// Click on the map background
    BackgroundClick(Position),
    /// Click on a pin
    PinClick(PinHandle),
    /// A pin drag finished at `position`
    PinDragEnd {
        /// Dragged pin
        pin: PinHandle,
        /// Where it was dropped
        position: Position,
    },
}

/// Whether the surface should still run its default action for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Default action proceeds
    Continue,
    /// Default action suppressed
    Stop,
}

/// Drawing surface for pins over a fixed image
pub trait SpatialSurface: Send {
    /// Draw the background image over `config.bounds` and apply zoom limits
    fn mount(&mut self, config: &MapConfig);

    /// Add a pin and return its handle
    fn add_pin(&mut self, pin: Pin) -> PinHandle;

    /// Remove a pin; unknown handles are ignored
    fn remove_pin(&mut self, handle: PinHandle);

    /// Enable or disable dragging on one pin
    fn set_draggable(&mut self, handle: PinHandle, draggable: bool);

    /// Every pin currently drawn
    fn pin_handles(&self) -> Vec<PinHandle>;

    /// Recompute the surface size after layout settles
    fn invalidate_size(&mut self);

    /// Center the viewport
    fn set_view(&mut self, center: Position, zoom: i32);
}

/// Image overlay state recorded by [`HeadlessSurface::mount`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    /// Background image
    pub image_url: String,
    /// Extent it covers
    pub bounds: Bounds,
    /// Zoom limits
    pub zoom_range: (i32, i32),
}

/// Viewport after a `set_view`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Center
    pub center: Position,
    /// Zoom, clamped to the mounted range
    pub zoom: i32,
}

#[derive(Debug, Default)]
struct HeadlessState {
    overlay: Option<Overlay>,
    pins: BTreeMap<PinHandle, Pin>,
    next_handle: u64,
    added: usize,
    removed: usize,
    invalidations: usize,
    viewport: Option<Viewport>,
}

/// In-memory surface; clones share state
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessSurface {
    /// Create an empty, unmounted surface
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins currently drawn, in handle order
    #[must_use]
    pub fn pins(&self) -> Vec<(PinHandle, Pin)> {
        self.state
            .lock()
            .pins
            .iter()
            .map(|(handle, pin)| (*handle, pin.clone()))
            .collect()
    }

    /// Pin by handle
    #[must_use]
    pub fn pin(&self, handle: PinHandle) -> Option<Pin> {
        self.state.lock().pins.get(&handle).cloned()
    }

    /// Mounted overlay, if any
    #[must_use]
    pub fn overlay(&self) -> Option<Overlay> {
        self.state.lock().overlay.clone()
    }

    /// Last viewport set
    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.state.lock().viewport
    }

    /// Total pins added and removed since creation
    #[must_use]
    pub fn churn(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.added, state.removed)
    }

    /// Number of size invalidations
    #[must_use]
    pub fn invalidations(&self) -> usize {
        self.state.lock().invalidations
    }
}

impl SpatialSurface for HeadlessSurface {
    fn mount(&mut self, config: &MapConfig) {
        self.state.lock().overlay = Some(Overlay {
            image_url: config.image_url.clone(),
            bounds: config.bounds,
            zoom_range: (config.min_zoom, config.max_zoom),
        });
    }

    fn add_pin(&mut self, pin: Pin) -> PinHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = PinHandle(state.next_handle);
        state.pins.insert(handle, pin);
        state.added += 1;
        handle
    }

    fn remove_pin(&mut self, handle: PinHandle) {
        let mut state = self.state.lock();
        if state.pins.remove(&handle).is_some() {
            state.removed += 1;
        }
    }

    fn set_draggable(&mut self, handle: PinHandle, draggable: bool) {
        if let Some(pin) = self.state.lock().pins.get_mut(&handle) {
            pin.draggable = draggable;
        }
    }

    fn pin_handles(&self) -> Vec<PinHandle> {
        self.state.lock().pins.keys().copied().collect()
    }

    fn invalidate_size(&mut self) {
        self.state.lock().invalidations += 1;
    }

    fn set_view(&mut self, center: Position, zoom: i32) {
        let mut state = self.state.lock();
        let zoom = match &state.overlay {
            Some(overlay) => zoom.clamp(overlay.zoom_range.0, overlay.zoom_range.1),
            None => zoom,
        };
        state.viewport = Some(Viewport { center, zoom });
    }
}
