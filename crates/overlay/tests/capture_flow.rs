//! Tests for the draw-region -> capture-comment flow, region clicks,
//! deletion, and the bulk wipe.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use uuid::Uuid;

use common::{MemoryStore, MockSurface};
use rubric_core::competency::Competency;
use rubric_core::error::CoreError;
use rubric_core::status::OriginTable;
use rubric_overlay::session::{
    ImageInfo, OverlaySession, RegionClick, SessionError, SessionSignal, SurfaceMode,
};
use rubric_overlay::surface::OverlaySurface;

const IMAGE: ImageInfo = ImageInfo { width: 1000, height: 2000 };

async fn edit_session(surface: &Arc<MockSurface>, store: &Arc<MemoryStore>) -> OverlaySession {
    OverlaySession::start(
        Arc::clone(surface) as Arc<dyn OverlaySurface>,
        Arc::clone(store) as _,
        1,
        OriginTable::Regular,
        7,
        IMAGE,
        SurfaceMode::Edit,
    )
    .await
    .unwrap()
}

fn temp_shape_id() -> String {
    Uuid::new_v4().to_string()
}

/// Simulate a full user drawing gesture and hand it to the session.
async fn draw(
    surface: &MockSurface,
    session: &mut OverlaySession,
    selector: &str,
) -> Result<String, SessionError> {
    let id = temp_shape_id();
    surface.draw(&id, selector);
    session.shape_drawn(id.clone(), selector).await?;
    Ok(id)
}

#[tokio::test]
async fn draw_and_submit_persists_annotation() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());
    let mut session = edit_session(&surface, &store).await;

    session.set_active_competency(Competency::C3);
    let drawn = draw(&surface, &mut session, "xywh=percent:10,5,20,10")
        .await
        .unwrap();
    assert!(session.has_pending_capture());

    let created = session.submit_capture("Weak cohesion").await.unwrap();
    assert_eq!(created.competency, 3);
    assert_eq!(created.sequence_number, 1);
    assert_eq!(created.comment, "Weak cohesion");
    // Pixel rectangle derived from the natural dimensions.
    assert_eq!((created.x_start, created.y_start), (100, 100));
    assert_eq!((created.x_end, created.y_end), (300, 300));
    assert_eq!((created.image_width, created.image_height), (1000, 2000));

    // The temporary drawn shape was swapped for the persisted one.
    assert!(surface.shape(&drawn).is_none());
    let persisted_id = created.id.to_string();
    assert!(surface.shape(&persisted_id).is_some());
    assert_eq!(surface.badge_of(&persisted_id), Some(1));
    assert!(!session.has_pending_capture());
    assert_eq!(session.next_sequence(), 2);

    session.shutdown().await;
}

#[tokio::test]
async fn empty_comment_blocks_submission_locally() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());
    let mut session = edit_session(&surface, &store).await;

    let drawn = draw(&surface, &mut session, "xywh=pixel:10,10,50,50")
        .await
        .unwrap();

    let err = session.submit_capture("   ").await.unwrap_err();
    assert_matches!(err, SessionError::Core(CoreError::EmptyComment));

    // No persisted record; the drawn shape stays, awaiting a comment or
    // an explicit cancel.
    assert!(store.is_empty());
    assert!(session.has_pending_capture());
    assert!(surface.shape(&drawn).is_some());

    // Cancelling discards the shape entirely.
    session.cancel_capture().await.unwrap();
    assert!(surface.shape(&drawn).is_none());
    assert!(!session.has_pending_capture());

    session.shutdown().await;
}

#[tokio::test]
async fn invalid_region_leaves_no_orphan_shape() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());
    let mut session = edit_session(&surface, &store).await;

    let err = draw(&surface, &mut session, "xywh=pixel:10,10,0,50")
        .await
        .unwrap_err();
    assert_matches!(err, SessionError::Core(CoreError::InvalidRegion(_)));

    assert_eq!(surface.shape_count(), 0, "orphan shape must be removed");
    assert!(!session.has_pending_capture());
    assert!(store.is_empty());

    session.shutdown().await;
}

#[tokio::test]
async fn transient_store_failure_is_retried_once() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());
    let mut session = edit_session(&surface, &store).await;

    draw(&surface, &mut session, "xywh=pixel:10,10,50,50")
        .await
        .unwrap();

    // One transient failure: the automatic retry succeeds.
    store.inject_transient_failures(1);
    let created = session.submit_capture("Run-on sentence").await.unwrap();
    assert_eq!(created.sequence_number, 1);
    assert_eq!(store.len(), 1);

    session.shutdown().await;
}

#[tokio::test]
async fn persistent_failure_discards_the_drawn_shape() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());
    let mut session = edit_session(&surface, &store).await;

    let drawn = draw(&surface, &mut session, "xywh=pixel:10,10,50,50")
        .await
        .unwrap();

    // Two transient failures: the single retry also fails.
    store.inject_transient_failures(2);
    let err = session.submit_capture("Lost comment").await.unwrap_err();
    assert_matches!(err, SessionError::Persistence(_));

    // A failed creation must not leave a phantom shape on the surface.
    assert!(surface.shape(&drawn).is_none());
    assert!(store.is_empty());
    assert!(!session.has_pending_capture());

    session.shutdown().await;
}

#[tokio::test]
async fn read_only_mode_rejects_drawing_and_shows_comments() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());

    // Seed one annotation through an edit session.
    let mut editor = edit_session(&surface, &store).await;
    editor.set_active_competency(Competency::C2);
    draw(&surface, &mut editor, "xywh=percent:10,5,20,10")
        .await
        .unwrap();
    let created = editor.submit_capture("Agreement error").await.unwrap();
    editor.shutdown().await;

    let reader_surface = Arc::new(MockSurface::new());
    let mut reader = OverlaySession::start(
        Arc::clone(&reader_surface) as Arc<dyn OverlaySurface>,
        Arc::clone(&store) as _,
        1,
        OriginTable::Regular,
        8,
        IMAGE,
        SurfaceMode::ReadOnly,
    )
    .await
    .unwrap();

    // Drawing is not part of the read-only capability set; the gesture's
    // shape is discarded.
    let err = draw(&reader_surface, &mut reader, "xywh=pixel:10,10,50,50")
        .await
        .unwrap_err();
    assert_matches!(err, SessionError::ReadOnly);
    assert_eq!(reader_surface.shape_count(), 1, "only the persisted region remains");

    // Clicking shows the competency and comment, with no mutation.
    let click = reader.shape_clicked(&created.id.to_string()).await.unwrap();
    assert_eq!(
        click,
        RegionClick::View { competency: Competency::C2, comment: "Agreement error".into() }
    );
    assert_eq!(store.len(), 1);

    // Deletion is likewise rejected.
    let err = reader.confirm_delete(created.id).await.unwrap_err();
    assert_matches!(err, SessionError::ReadOnly);

    reader.shutdown().await;
}

#[tokio::test]
async fn edit_click_requests_confirmation_then_deletes() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());
    let mut session = edit_session(&surface, &store).await;

    draw(&surface, &mut session, "xywh=pixel:10,10,50,50")
        .await
        .unwrap();
    let first = session.submit_capture("First").await.unwrap();
    draw(&surface, &mut session, "xywh=pixel:100,100,50,50")
        .await
        .unwrap();
    let second = session.submit_capture("Second").await.unwrap();

    let click = session.shape_clicked(&first.id.to_string()).await.unwrap();
    assert_eq!(click, RegionClick::DeleteRequested { annotation_id: first.id });

    session.confirm_delete(first.id).await.unwrap();
    assert_eq!(store.len(), 1);
    assert!(surface.shape(&first.id.to_string()).is_none());

    // The surviving annotation keeps its number; nothing is renumbered.
    assert_eq!(surface.badge_of(&second.id.to_string()), Some(2));
    // And the next annotation continues the sequence.
    draw(&surface, &mut session, "xywh=pixel:200,200,50,50")
        .await
        .unwrap();
    let third = session.submit_capture("Third").await.unwrap();
    assert_eq!(third.sequence_number, 3);

    session.shutdown().await;
}

#[tokio::test]
async fn clear_all_strips_badges_and_resets_numbering() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());
    let mut session = edit_session(&surface, &store).await;

    for selector in ["xywh=pixel:10,10,50,50", "xywh=pixel:100,100,50,50"] {
        draw(&surface, &mut session, selector).await.unwrap();
        session.submit_capture("note").await.unwrap();
    }
    assert_eq!(surface.badge_count(), 2);

    let removed = session.clear_all().await.unwrap();
    assert_eq!(removed, 2);

    // Zero annotations, zero numbering artifacts.
    assert!(store.is_empty());
    assert_eq!(surface.shape_count(), 0);
    assert_eq!(surface.badge_count(), 0, "no ghost badges may survive");
    assert_eq!(session.annotation_count(), 0);

    // Repopulation starts numbering from 1 again.
    draw(&surface, &mut session, "xywh=pixel:10,10,50,50")
        .await
        .unwrap();
    let fresh = session.submit_capture("fresh start").await.unwrap();
    assert_eq!(fresh.sequence_number, 1);
    assert_eq!(surface.badge_of(&fresh.id.to_string()), Some(1));

    session.shutdown().await;
}

#[tokio::test]
async fn surface_events_drive_the_session() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());
    let mut session = edit_session(&surface, &store).await;

    let mut events = surface.subscribe();
    surface.draw(&temp_shape_id(), "xywh=percent:10,5,20,10");

    let event = events.recv().await.unwrap();
    let signal = session.handle_event(event).await.unwrap();
    assert_eq!(signal, SessionSignal::CaptureStarted);
    assert!(session.has_pending_capture());

    let created = session.submit_capture("From the event path").await.unwrap();
    assert_eq!(created.sequence_number, 1);

    session.shutdown().await;
}

#[tokio::test]
async fn new_drawing_replaces_a_stale_pending_capture() {
    let surface = Arc::new(MockSurface::new());
    let store = Arc::new(MemoryStore::new());
    let mut session = edit_session(&surface, &store).await;

    let first = draw(&surface, &mut session, "xywh=pixel:10,10,50,50")
        .await
        .unwrap();

    // Drawing again before commenting discards the first shape.
    draw(&surface, &mut session, "xywh=pixel:200,200,80,80")
        .await
        .unwrap();
    assert!(surface.shape(&first).is_none());

    let created = session.submit_capture("Second region wins").await.unwrap();
    assert_eq!((created.x_start, created.y_start), (200, 200));

    session.shutdown().await;
}
