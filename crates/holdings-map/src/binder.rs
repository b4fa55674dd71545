//! View binder
//!
//! Keeps the drawn pin set equal to the latest combined snapshot and turns
//! surface gestures into view events or commands:
//!
//! - every snapshot clears the surface and redraws all pins
//! - edit mode flips dragging on the pins already drawn, nothing else
//! - a drag end relocates the marker behind the pin; the write runs in the
//!   background and failures come back as [`ViewEvent::CommandFailed`]
//! - a background click in edit mode proposes a draft at that spot
//! - the first `Ready` opens the gate and frames the viewport once the
//!   surface has had time to settle

use crate::projection::{Pin, SpatialProjection};
use crate::surface::{PinHandle, Propagation, SpatialSurface, SurfaceEvent};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, Stream, StreamExt};
use holdings_model::{Color, HoldingsConfig, MapConfig, Marker, MarkerId, Position};
use holdings_sync::{CombinedStream, CommandError, CommandHandler, Relocation, SyncEngine, ViewReady};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Notification for whatever hosts the map
#[derive(Debug)]
pub enum ViewEvent {
    /// A pin was clicked, or the background was clicked in edit mode
    MarkerSelected(Marker),
    /// A gesture-triggered command failed
    CommandFailed(CommandError),
}

#[derive(Debug, Clone)]
struct Rendered {
    pin: Pin,
    marker: Marker,
}

/// Binds one map surface to the sync engine
pub struct ViewBinder<S> {
    surface: S,
    projection: SpatialProjection,
    commands: CommandHandler,
    ready: ViewReady,
    settle_delay: Duration,
    initial_center: Position,
    initial_zoom: i32,
    edit_mode: bool,
    rendered: HashMap<PinHandle, Rendered>,
    framing_at: Option<Instant>,
    in_flight: FuturesUnordered<BoxFuture<'static, ()>>,
    events: mpsc::UnboundedSender<ViewEvent>,
}

impl<S: SpatialSurface> ViewBinder<S> {
    /// Mount `surface` and bind it
    ///
    /// Returns the binder and the receiving end of its view events.
    #[must_use]
    pub fn new(
        mut surface: S,
        map: &MapConfig,
        default_color: Color,
        commands: CommandHandler,
        ready: ViewReady,
    ) -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        surface.mount(map);
        let (events, rx) = mpsc::unbounded_channel();
        let binder = Self {
            surface,
            projection: SpatialProjection::new(map.pin.clone(), default_color),
            commands,
            ready,
            settle_delay: map.settle_delay(),
            initial_center: map.initial_center,
            initial_zoom: map.initial_zoom,
            edit_mode: false,
            rendered: HashMap::new(),
            framing_at: None,
            in_flight: FuturesUnordered::new(),
            events,
        };
        (binder, rx)
    }

    /// Bind `surface` to a running engine
    #[must_use]
    pub fn attach(
        surface: S,
        engine: &SyncEngine,
        config: &HoldingsConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        Self::new(
            surface,
            &config.map,
            config.sync.default_color.clone(),
            engine.commands(),
            engine.view_ready(),
        )
    }

    /// Bound surface
    #[inline]
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Check if pins are draggable
    #[inline]
    #[must_use]
    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Marker a drawn pin was rendered from
    #[must_use]
    pub fn marker_for(&self, handle: PinHandle) -> Option<&Marker> {
        self.rendered.get(&handle).map(|rendered| &rendered.marker)
    }

    /// Replace every drawn pin with one pin per marker
    pub fn reconcile(&mut self, markers: &[Marker]) {
        for handle in self.surface.pin_handles() {
            self.surface.remove_pin(handle);
        }
        self.rendered.clear();

        for marker in markers {
            let pin = self.projection.project(marker, self.edit_mode);
            let handle = self.surface.add_pin(pin.clone());
            self.rendered.insert(
                handle,
                Rendered {
                    pin,
                    marker: marker.clone(),
                },
            );
        }
        debug!(pins = markers.len(), "pins redrawn");
    }

    /// Enable or disable dragging on every drawn pin
    pub fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
        for handle in self.surface.pin_handles() {
            self.surface.set_draggable(handle, enabled);
            if let Some(rendered) = self.rendered.get_mut(&handle) {
                rendered.pin.draggable = enabled;
            }
        }
        debug!(enabled, "edit mode");
    }

    /// React to one surface event
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Propagation {
        match event {
            SurfaceEvent::Ready => {
                if self.ready.fire() {
                    self.framing_at = Some(Instant::now() + self.settle_delay);
                } else {
                    debug!("surface reported ready again");
                }
                Propagation::Continue
            }
            SurfaceEvent::BackgroundClick(position) => {
                if self.edit_mode {
                    self.emit(ViewEvent::MarkerSelected(self.projection.draft_at(position)));
                }
                Propagation::Continue
            }
            SurfaceEvent::PinClick(handle) => {
                match self.rendered.get(&handle) {
                    Some(rendered) => {
                        self.emit(ViewEvent::MarkerSelected(rendered.marker.clone()));
                    }
                    None => debug!(?handle, "click on a pin that is no longer drawn"),
                }
                Propagation::Stop
            }
            SurfaceEvent::PinDragEnd { pin, position } => {
                let target = self
                    .rendered
                    .get(&pin)
                    .and_then(|rendered| self.projection.decode_drag_end(&rendered.pin, position));
                match target {
                    Some((id, to)) => self.dispatch_relocation(id, to),
                    None => warn!(?pin, "drag ended on a pin without a marker"),
                }
                Propagation::Continue
            }
        }
    }

    /// Resize the surface and center it on the initial view
    pub fn frame(&mut self) {
        self.framing_at = None;
        self.surface.invalidate_size();
        self.surface.set_view(self.initial_center, self.initial_zoom);
    }

    /// Wait for every relocation dispatched so far
    pub async fn settle(&mut self) {
        while self.in_flight.next().await.is_some() {}
    }

    /// Drive the binder until the surface or the combined feed goes away
    ///
    /// Pending relocations are finished before the surface is handed back.
    pub async fn run<E>(
        mut self,
        mut surface_events: E,
        mut combined: CombinedStream,
        mut edit_mode: watch::Receiver<bool>,
    ) -> S
    where
        E: Stream<Item = SurfaceEvent> + Unpin,
    {
        let initial = *edit_mode.borrow_and_update();
        self.set_edit_mode(initial);
        let mut edit_open = true;

        loop {
            tokio::select! {
                event = surface_events.next() => {
                    match event {
                        Some(event) => {
                            self.handle_event(event);
                        }
                        None => break,
                    }
                }
                view = combined.next() => {
                    match view {
                        Some(view) => self.reconcile(&view.markers),
                        None => break,
                    }
                }
                changed = edit_mode.changed(), if edit_open => {
                    match changed {
                        Ok(()) => {
                            let enabled = *edit_mode.borrow_and_update();
                            self.set_edit_mode(enabled);
                        }
                        Err(_) => edit_open = false,
                    }
                }
                () = until(self.framing_at) => self.frame(),
                Some(()) = self.in_flight.next(), if !self.in_flight.is_empty() => {}
            }
        }

        self.settle().await;
        debug!("view binder stopped");
        self.surface
    }

    fn dispatch_relocation(&mut self, id: MarkerId, to: Position) {
        let commands = self.commands.clone();
        let events = self.events.clone();
        self.in_flight.push(
            async move {
                match commands.relocate(&id, to).await {
                    Ok(Relocation::Applied(id)) => debug!(%id, "marker relocated"),
                    Ok(Relocation::Dropped) => {}
                    Err(err) => {
                        error!(%id, error = %err, "relocation failed");
                        let _ = events.send(ViewEvent::CommandFailed(err));
                    }
                }
            }
            .boxed(),
        );
    }

    fn emit(&self, event: ViewEvent) {
        if self.events.send(event).is_err() {
            debug!("view event dropped, no listener");
        }
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
