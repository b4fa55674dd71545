//! View binder tests
//!
//! Reconciliation, edit mode, gestures and framing against a headless surface
//! bound to a live engine over a memory store.

use futures::channel::mpsc as surface_channel;
use futures::StreamExt;
use holdings_map::{HeadlessSurface, PinHandle, Propagation, SurfaceEvent, ViewBinder, ViewEvent};
use holdings_model::{Color, HoldingsConfig, HolderSet, MapConfig, Marker, MarkerId, Position};
use holdings_store::{MemoryStore, RemoteStore, StoreError, StorePath};
use holdings_sync::{
    CombinedStream, CommandError, CommandHandler, MarkerSnapshot, SyncEngine, Versioned, ViewReady,
};
use holdings_test_utils::{acme_seed, fields, owned_fields, RecordingStore, Seed};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

type Bound = (
    ViewBinder<HeadlessSurface>,
    HeadlessSurface,
    mpsc::UnboundedReceiver<ViewEvent>,
);

async fn start(store: impl RemoteStore + 'static) -> SyncEngine {
    let engine = SyncEngine::start(Arc::new(store), &HoldingsConfig::default().sync).unwrap();
    engine.synced().await;
    engine
}

fn bind(engine: &SyncEngine) -> Bound {
    let surface = HeadlessSurface::new();
    let (binder, events) = ViewBinder::attach(surface.clone(), engine, &HoldingsConfig::default());
    (binder, surface, events)
}

/// Report the surface ready and draw the first released snapshot
async fn open(engine: &SyncEngine, binder: &mut ViewBinder<HeadlessSurface>) -> CombinedStream {
    let mut combined = engine.combined();
    binder.handle_event(SurfaceEvent::Ready);
    let view = combined.next().await.unwrap();
    binder.reconcile(&view.markers);
    combined
}

fn tokens(surface: &HeadlessSurface) -> BTreeSet<String> {
    surface
        .pins()
        .into_iter()
        .filter_map(|(_, pin)| pin.token.map(|id| id.to_string()))
        .collect()
}

fn handle_of(surface: &HeadlessSurface, id: &str) -> PinHandle {
    surface
        .pins()
        .into_iter()
        .find(|(_, pin)| pin.token == Some(MarkerId::new(id)))
        .map(|(handle, _)| handle)
        .unwrap()
}

fn three_markers() -> Seed {
    acme_seed()
        .marker("k1", &owned_fields("Mill", 5.0, 5.0, "Acme"))
        .marker("k2", &fields("Barn", 10.0, 10.0))
        .marker("k3", &owned_fields("Silo", 15.0, 15.0, "Globex"))
}

async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_surface_is_mounted_with_image_overlay() {
    let engine = start(MemoryStore::new()).await;
    let (_binder, surface, _events) = bind(&engine);

    let overlay = surface.overlay().unwrap();
    assert_eq!(overlay.image_url, MapConfig::default().image_url);
    assert_eq!(overlay.zoom_range, (-2, 1));
}

#[tokio::test]
async fn test_pins_track_every_snapshot_exactly() {
    let store = three_markers().into_store();
    let engine = start(store.clone()).await;
    let (mut binder, surface, _events) = bind(&engine);

    let mut combined = open(&engine, &mut binder).await;
    assert_eq!(tokens(&surface), BTreeSet::from(["k1".into(), "k2".into(), "k3".into()]));

    store
        .remove(&StorePath::parse("holdings/k2").unwrap())
        .await
        .unwrap();
    let view = combined.next().await.unwrap();
    binder.reconcile(&view.markers);

    assert_eq!(tokens(&surface), BTreeSet::from(["k1".into(), "k3".into()]));
    assert_eq!(surface.churn(), (5, 3));
}

#[tokio::test]
async fn test_empty_snapshot_clears_the_surface() {
    let store = Seed::new().marker("k1", &fields("Mill", 1.0, 1.0)).into_store();
    let engine = start(store.clone()).await;
    let (mut binder, surface, _events) = bind(&engine);
    let mut combined = open(&engine, &mut binder).await;
    assert_eq!(surface.pins().len(), 1);

    store
        .remove(&StorePath::parse("holdings").unwrap())
        .await
        .unwrap();
    let view = combined.next().await.unwrap();
    binder.reconcile(&view.markers);

    assert!(surface.pins().is_empty());
}

#[tokio::test]
async fn test_edit_mode_toggles_dragging_without_writes_or_redraw() {
    let store = RecordingStore::new(three_markers().into_store());
    let engine = start(store.clone()).await;
    let (mut binder, surface, _events) = bind(&engine);
    let _combined = open(&engine, &mut binder).await;
    assert!(surface.pins().iter().all(|(_, pin)| !pin.draggable));
    let churn = surface.churn();

    binder.set_edit_mode(true);

    assert!(binder.edit_mode());
    assert_eq!(surface.pins().len(), 3);
    assert!(surface.pins().iter().all(|(_, pin)| pin.draggable));
    assert_eq!(surface.churn(), churn);
    assert!(store.ops().is_empty());

    binder.set_edit_mode(false);
    assert!(surface.pins().iter().all(|(_, pin)| !pin.draggable));
}

#[tokio::test]
async fn test_pins_redrawn_in_edit_mode_stay_draggable() {
    let store = three_markers().into_store();
    let engine = start(store.clone()).await;
    let (mut binder, surface, _events) = bind(&engine);
    let mut combined = open(&engine, &mut binder).await;
    binder.set_edit_mode(true);

    store
        .set(
            &StorePath::parse("holdings/k4").unwrap(),
            fields("Well", 2.0, 2.0).to_record().unwrap(),
        )
        .await
        .unwrap();
    let view = combined.next().await.unwrap();
    binder.reconcile(&view.markers);

    assert_eq!(surface.pins().len(), 4);
    assert!(surface.pins().iter().all(|(_, pin)| pin.draggable));
}

#[tokio::test]
async fn test_drag_end_writes_exactly_one_relocation() {
    let store = RecordingStore::new(three_markers().into_store());
    let engine = start(store.clone()).await;
    let (mut binder, surface, _events) = bind(&engine);
    let _combined = open(&engine, &mut binder).await;
    binder.set_edit_mode(true);

    let propagation = binder.handle_event(SurfaceEvent::PinDragEnd {
        pin: handle_of(&surface, "k1"),
        position: Position::new(7.0, 7.0),
    });
    binder.settle().await;

    assert_eq!(propagation, Propagation::Continue);
    assert_eq!(
        store.sets(),
        vec![(
            "holdings/k1".to_string(),
            json!({
                "latitude": 7.0,
                "longitude": 7.0,
                "name": "Mill",
                "holder": "Acme",
                "markerColor": "#ff0000"
            })
        )]
    );
}

#[tokio::test]
async fn test_drag_moves_unnamed_marker() {
    let store = RecordingStore::new(
        Seed::new()
            .raw_marker(
                "k1",
                json!({"latitude": 5.0, "longitude": 5.0, "holder": "Unknown"}),
            )
            .into_store(),
    );
    let engine = start(store.clone()).await;
    let (mut binder, surface, mut events) = bind(&engine);
    let _combined = open(&engine, &mut binder).await;
    binder.set_edit_mode(true);

    binder.handle_event(SurfaceEvent::PinDragEnd {
        pin: handle_of(&surface, "k1"),
        position: Position::new(7.0, 7.0),
    });
    binder.settle().await;

    let sets = store.sets();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].0, "holdings/k1");
    assert_eq!(sets[0].1["latitude"], json!(7.0));
    assert!(sets[0].1.get("name").is_none());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_drag_of_marker_deleted_meanwhile_writes_nothing() {
    let store = RecordingStore::new(three_markers().into_store());
    let engine = start(store.clone()).await;
    let (mut binder, surface, _events) = bind(&engine);
    let _combined = open(&engine, &mut binder).await;
    let pin = handle_of(&surface, "k1");

    let mut markers = engine.markers().watch();
    store
        .inner()
        .remove(&StorePath::parse("holdings/k1").unwrap())
        .await
        .unwrap();
    markers
        .wait_for(|published| published.value.iter().all(|m| m.id() != Some(&MarkerId::new("k1"))))
        .await
        .unwrap();

    binder.handle_event(SurfaceEvent::PinDragEnd {
        pin,
        position: Position::new(7.0, 7.0),
    });
    binder.settle().await;

    assert!(store.ops().is_empty());
}

#[tokio::test]
async fn test_failed_relocation_is_reported() {
    let store = three_markers().into_store();
    let engine = start(store.clone()).await;
    let (mut binder, surface, mut events) = bind(&engine);
    let _combined = open(&engine, &mut binder).await;

    store.set_offline(Some("offline"));
    binder.handle_event(SurfaceEvent::PinDragEnd {
        pin: handle_of(&surface, "k2"),
        position: Position::new(1.0, 1.0),
    });
    binder.settle().await;

    assert!(matches!(
        events.try_recv(),
        Ok(ViewEvent::CommandFailed(CommandError::Store(StoreError::Unavailable(_))))
    ));
}

#[tokio::test]
async fn test_background_click_proposes_draft_only_in_edit_mode() {
    let engine = start(MemoryStore::new()).await;
    let (mut binder, _surface, mut events) = bind(&engine);

    binder.handle_event(SurfaceEvent::BackgroundClick(Position::new(3.0, 4.0)));
    assert!(events.try_recv().is_err());

    binder.set_edit_mode(true);
    binder.handle_event(SurfaceEvent::BackgroundClick(Position::new(3.0, 4.0)));

    let Ok(ViewEvent::MarkerSelected(draft)) = events.try_recv() else {
        panic!("expected a draft");
    };
    assert!(!draft.is_persisted());
    assert_eq!(draft.position(), Position::new(3.0, 4.0));
    assert_eq!(draft.fields().name, None);
}

#[tokio::test]
async fn test_pin_click_selects_full_marker() {
    let mut extended = owned_fields("Mill", 5.0, 5.0, "Acme");
    extended.chief = Some("J. Doe".to_string());
    let store = acme_seed().marker("k1", &extended).into_store();
    let engine = start(store).await;
    let (mut binder, surface, mut events) = bind(&engine);
    let _combined = open(&engine, &mut binder).await;

    let handle = handle_of(&surface, "k1");
    assert_eq!(
        binder.marker_for(handle).and_then(Marker::id),
        Some(&MarkerId::new("k1"))
    );
    let propagation = binder.handle_event(SurfaceEvent::PinClick(handle));

    assert_eq!(propagation, Propagation::Stop);
    let Ok(ViewEvent::MarkerSelected(marker)) = events.try_recv() else {
        panic!("expected the clicked marker");
    };
    assert_eq!(marker.id(), Some(&MarkerId::new("k1")));
    assert_eq!(marker.fields().chief.as_deref(), Some("J. Doe"));
    assert_eq!(marker.fields().holder.as_deref(), Some("Acme"));
}

#[tokio::test(start_paused = true)]
async fn test_ready_frames_viewport_after_settle_delay() {
    let engine = start(Seed::new().marker("k1", &fields("Mill", 1.0, 1.0)).into_store()).await;
    let (binder, surface, _events) = bind(&engine);
    let (surface_tx, surface_rx) = surface_channel::unbounded();
    let (_edit_tx, edit_rx) = watch::channel(false);

    let running = tokio::spawn(binder.run(surface_rx, engine.combined(), edit_rx));
    surface_tx.unbounded_send(SurfaceEvent::Ready).unwrap();

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(surface.viewport(), None);
    assert_eq!(surface.invalidations(), 0);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let viewport = surface.viewport().unwrap();
    assert_eq!(viewport.center, Position::new(500.0, 500.0));
    assert_eq!(viewport.zoom, 0);
    assert_eq!(surface.invalidations(), 1);
    assert_eq!(tokens(&surface), BTreeSet::from(["k1".into()]));

    drop(surface_tx);
    running.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_repeated_ready_frames_only_once() {
    let engine = start(MemoryStore::new()).await;
    let (binder, surface, _events) = bind(&engine);
    let (surface_tx, surface_rx) = surface_channel::unbounded();
    let (_edit_tx, edit_rx) = watch::channel(false);

    let running = tokio::spawn(binder.run(surface_rx, engine.combined(), edit_rx));
    surface_tx.unbounded_send(SurfaceEvent::Ready).unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(surface.invalidations(), 1);

    surface_tx.unbounded_send(SurfaceEvent::Ready).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(surface.invalidations(), 1);

    drop(surface_tx);
    running.await.unwrap();
}

#[tokio::test]
async fn test_run_follows_snapshots_and_edit_mode() {
    let store = three_markers().into_store();
    let engine = start(store.clone()).await;
    let (binder, surface, _events) = bind(&engine);
    let (surface_tx, surface_rx) = surface_channel::unbounded();
    let (edit_tx, edit_rx) = watch::channel(false);

    let running = tokio::spawn(binder.run(surface_rx, engine.combined(), edit_rx));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(surface.pins().is_empty(), "pins drawn before the surface was ready");

    surface_tx.unbounded_send(SurfaceEvent::Ready).unwrap();
    eventually(|| surface.pins().len() == 3).await;

    edit_tx.send(true).unwrap();
    eventually(|| surface.pins().iter().all(|(_, pin)| pin.draggable)).await;

    store
        .remove(&StorePath::parse("holdings/k3").unwrap())
        .await
        .unwrap();
    eventually(|| tokens(&surface) == BTreeSet::from(["k1".into(), "k2".into()])).await;

    engine.shutdown();
    let surface_back = running.await.unwrap();
    assert_eq!(surface_back.pins().len(), 2);
}

fn detached_binder() -> (ViewBinder<HeadlessSurface>, HeadlessSurface) {
    let (_, holders) = watch::channel(Versioned::<HolderSet>::default());
    let (_, markers) = watch::channel(Versioned {
        revision: 0,
        value: MarkerSnapshot::from(Vec::new()),
    });
    let commands = CommandHandler::new(
        Arc::new(MemoryStore::new()),
        StorePath::parse("holdings").unwrap(),
        holders,
        markers,
        Color::default(),
    );
    let surface = HeadlessSurface::new();
    let (binder, _events) = ViewBinder::new(
        surface.clone(),
        &MapConfig::default(),
        Color::default(),
        commands,
        ViewReady::new(),
    );
    (binder, surface)
}

proptest! {
    #[test]
    fn prop_reconcile_draws_exactly_the_snapshot(
        first in prop::collection::btree_set("[a-z0-9]{1,8}", 0..12),
        second in prop::collection::btree_set("[a-z0-9]{1,8}", 0..12),
    ) {
        let (mut binder, surface) = detached_binder();
        let snapshot = |ids: &BTreeSet<String>| -> Vec<Marker> {
            ids.iter()
                .map(|id| Marker::saved(id.as_str(), fields("M", 1.0, 1.0)))
                .collect()
        };

        binder.reconcile(&snapshot(&first));
        prop_assert_eq!(tokens(&surface), first);

        binder.reconcile(&snapshot(&second));
        prop_assert_eq!(tokens(&surface), second.clone());
        prop_assert_eq!(surface.pins().len(), second.len());
    }
}
