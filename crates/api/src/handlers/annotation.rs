//! Handlers for coordinate-based essay markup.
//!
//! Provides endpoints for listing, creating, and deleting annotations,
//! plus the destructive bulk wipe. Geometry and comment validation run
//! before anything touches the store.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use rubric_core::annotation::validate_annotation;
use rubric_core::error::CoreError;
use rubric_core::status::OriginTable;
use rubric_core::types::DbId;
use rubric_db::models::annotation::CreateAnnotation;
use rubric_db::repositories::AnnotationRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Result payload for the bulk wipe.
#[derive(Debug, Serialize)]
pub struct ClearResult {
    pub removed: u64,
}

/// GET /essays/{origin}/{id}/annotations
///
/// List annotations in creation order (the authoritative ordering).
pub async fn list_annotations(
    State(state): State<AppState>,
    Path((origin, essay_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let origin = OriginTable::parse(&origin)?;
    let annotations = AnnotationRepo::list(&state.pool, essay_id, origin).await?;
    Ok(Json(DataResponse { data: annotations }))
}

/// POST /essays/{origin}/{id}/annotations
///
/// Create an annotation. The store assigns the id and the next sequence
/// number for the essay atomically.
pub async fn create_annotation(
    State(state): State<AppState>,
    Path((origin, essay_id)): Path<(String, DbId)>,
    Json(input): Json<CreateAnnotation>,
) -> AppResult<impl IntoResponse> {
    let origin = OriginTable::parse(&origin)?;

    validate_annotation(
        input.competency,
        &input.comment,
        &input.rect(),
        input.image_width,
        input.image_height,
    )?;

    let annotation = AnnotationRepo::create(&state.pool, essay_id, origin, &input).await?;

    tracing::info!(
        essay_id,
        origin = %origin,
        corrector_id = input.corrector_id,
        annotation_id = annotation.id,
        sequence_number = annotation.sequence_number,
        "Annotation created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: annotation })))
}

/// DELETE /essays/{origin}/{id}/annotations/{ann_id}
///
/// Hard delete. Remaining annotations are never renumbered.
pub async fn delete_annotation(
    State(state): State<AppState>,
    Path((origin, essay_id, ann_id)): Path<(String, DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    OriginTable::parse(&origin)?;

    let deleted = AnnotationRepo::delete(&state.pool, ann_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Annotation",
            id: ann_id,
        }));
    }

    tracing::info!(essay_id, annotation_id = ann_id, "Annotation deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /essays/{origin}/{id}/annotations
///
/// Bulk wipe: deletes every annotation for the essay and resets its
/// sequence counter. Destructive and non-reversible; the client asks
/// for confirmation before calling this.
pub async fn clear_annotations(
    State(state): State<AppState>,
    Path((origin, essay_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let origin = OriginTable::parse(&origin)?;

    let removed = AnnotationRepo::clear_all(&state.pool, essay_id, origin).await?;

    tracing::info!(essay_id, origin = %origin, removed, "All annotations cleared");

    Ok(Json(DataResponse { data: ClearResult { removed } }))
}
