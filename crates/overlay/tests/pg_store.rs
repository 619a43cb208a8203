//! End-to-end overlay session tests against the real Postgres store.
//!
//! The same scenarios the in-memory harness covers, but through
//! `PgAnnotationStore`, so the session's contract holds against the
//! actual persistence boundary.

mod common;

use std::sync::Arc;

use sqlx::PgPool;

use common::MockSurface;
use rubric_core::competency::Competency;
use rubric_core::status::OriginTable;
use rubric_overlay::session::{ImageInfo, OverlaySession, SurfaceMode};
use rubric_overlay::store::PgAnnotationStore;
use rubric_overlay::surface::OverlaySurface;

const IMAGE: ImageInfo = ImageInfo { width: 1000, height: 2000 };

async fn edit_session(pool: &PgPool, surface: &Arc<MockSurface>) -> OverlaySession {
    OverlaySession::start(
        Arc::clone(surface) as Arc<dyn OverlaySurface>,
        Arc::new(PgAnnotationStore::new(pool.clone())),
        1,
        OriginTable::Regular,
        7,
        IMAGE,
        SurfaceMode::Edit,
    )
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn capture_persists_through_postgres(pool: PgPool) {
    let surface = Arc::new(MockSurface::new());
    let mut session = edit_session(&pool, &surface).await;

    session.set_active_competency(Competency::C3);
    surface.draw("tmp-1", "xywh=percent:10,5,20,10");
    session
        .shape_drawn("tmp-1".into(), "xywh=percent:10,5,20,10")
        .await
        .unwrap();
    let created = session.submit_capture("Weak cohesion").await.unwrap();

    assert_eq!(created.sequence_number, 1);
    assert_eq!((created.x_start, created.y_start), (100, 100));
    assert_eq!((created.x_end, created.y_end), (300, 300));
    session.shutdown().await;

    // A fresh session on a fresh surface reloads the same region with
    // the same number and a visible badge.
    let fresh = Arc::new(MockSurface::new());
    let reloaded = edit_session(&pool, &fresh).await;

    let shape_id = created.id.to_string();
    let shape = fresh.shape(&shape_id).expect("shape must reappear");
    assert_eq!(shape.competency, Competency::C3);
    assert_eq!(fresh.badge_of(&shape_id), Some(1));
    assert_eq!(reloaded.next_sequence(), 2);

    reloaded.shutdown().await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn clear_all_round_trips_through_postgres(pool: PgPool) {
    let surface = Arc::new(MockSurface::new());
    let mut session = edit_session(&pool, &surface).await;

    for selector in ["xywh=pixel:10,10,50,50", "xywh=pixel:100,100,50,50"] {
        surface.draw("tmp", selector);
        session.shape_drawn("tmp".into(), selector).await.unwrap();
        session.submit_capture("note").await.unwrap();
    }

    let removed = session.clear_all().await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(surface.shape_count(), 0);
    assert_eq!(surface.badge_count(), 0);

    // Numbering restarts at 1 against the database counter as well.
    surface.draw("tmp", "xywh=pixel:10,10,50,50");
    session
        .shape_drawn("tmp".into(), "xywh=pixel:10,10,50,50")
        .await
        .unwrap();
    let fresh = session.submit_capture("fresh").await.unwrap();
    assert_eq!(fresh.sequence_number, 1);

    session.shutdown().await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_keeps_remaining_numbers(pool: PgPool) {
    let surface = Arc::new(MockSurface::new());
    let mut session = edit_session(&pool, &surface).await;

    surface.draw("tmp", "xywh=pixel:10,10,50,50");
    session
        .shape_drawn("tmp".into(), "xywh=pixel:10,10,50,50")
        .await
        .unwrap();
    let first = session.submit_capture("first").await.unwrap();

    surface.draw("tmp", "xywh=pixel:100,100,50,50");
    session
        .shape_drawn("tmp".into(), "xywh=pixel:100,100,50,50")
        .await
        .unwrap();
    let second = session.submit_capture("second").await.unwrap();

    session.confirm_delete(first.id).await.unwrap();

    surface.draw("tmp", "xywh=pixel:200,200,50,50");
    session
        .shape_drawn("tmp".into(), "xywh=pixel:200,200,50,50")
        .await
        .unwrap();
    let third = session.submit_capture("third").await.unwrap();

    // Deleted numbers are never reused.
    assert_eq!(second.sequence_number, 2);
    assert_eq!(third.sequence_number, 3);

    session.shutdown().await;
}
