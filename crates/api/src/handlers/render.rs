//! Handlers for the essay rendering workflow.
//!
//! Typed essays go through the external rendering gateway and are polled
//! until ready; handwritten essays bypass the gateway entirely with
//! their pre-existing image reference. When a render becomes ready the
//! natural image dimensions are probed from the header bytes, since the
//! whole coordinate space is anchored to them.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use rubric_core::status::{OriginTable, RenderStatus};
use rubric_core::types::DbId;
use rubric_db::repositories::EssayRenderRepo;
use rubric_render::probe::probe_dimensions;
use rubric_render::{poll_render, PollConfig, PollOutcome, RenderGateway, RenderRequest};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for requesting a render.
#[derive(Debug, Deserialize, Validate)]
pub struct RenderEssayRequest {
    /// Essay text to render. Required unless the essay is handwritten.
    #[validate(length(max = 50_000))]
    pub text: Option<String>,
    /// Pre-existing image reference for handwritten essays.
    #[validate(url)]
    pub handwritten_image_url: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// POST /essays/{origin}/{id}/render
///
/// Start (or retry) a render. Handwritten essays are recorded as ready
/// immediately, without touching the gateway.
pub async fn request_render(
    State(state): State<AppState>,
    Path((origin, essay_id)): Path<(String, DbId)>,
    Json(request): Json<RenderEssayRequest>,
) -> AppResult<impl IntoResponse> {
    let origin = OriginTable::parse(&origin)?;

    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if let Some(image_url) = &request.handwritten_image_url {
        let dimensions = probe_image(state.render.as_ref(), image_url).await;
        let render =
            EssayRenderRepo::mark_ready(&state.pool, essay_id, origin, image_url, dimensions)
                .await?;

        tracing::info!(essay_id, origin = %origin, "Handwritten essay image registered");
        return Ok((StatusCode::OK, Json(DataResponse { data: render })));
    }

    let text = request
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            AppError::BadRequest(
                "text is required unless a handwritten image is supplied".to_string(),
            )
        })?;

    let ticket = state
        .render
        .request_render(&RenderRequest {
            essay_id,
            origin,
            text: text.to_string(),
            metadata: request.metadata.clone(),
        })
        .await?;

    let render =
        EssayRenderRepo::upsert_status(&state.pool, essay_id, origin, RenderStatus::Rendering, None)
            .await?;

    spawn_render_poll(&state, essay_id, origin);

    tracing::info!(
        essay_id,
        origin = %origin,
        job_id = %ticket.job_id,
        "Render requested"
    );

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: render })))
}

/// GET /essays/{origin}/{id}/render
///
/// Report the current render state, refreshing it from the gateway when
/// it is not terminal yet. A ready render with known dimensions is
/// served from the cache without a gateway round trip.
pub async fn check_render(
    State(state): State<AppState>,
    Path((origin, essay_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let origin = OriginTable::parse(&origin)?;

    if let Some(cached) = EssayRenderRepo::get(&state.pool, essay_id, origin).await? {
        if cached.status()? == RenderStatus::Ready && cached.image_width.is_some() {
            return Ok(Json(DataResponse { data: cached }));
        }
    }

    let observed = state.render.check_status(essay_id, origin).await?;
    if !observed.is_for(essay_id, origin) {
        return Err(AppError::InternalError(
            "gateway returned a state for a different essay".to_string(),
        ));
    }

    let render = match (observed.status, observed.image_url.as_deref()) {
        (RenderStatus::Ready, Some(image_url)) => {
            let dimensions = probe_image(state.render.as_ref(), image_url).await;
            EssayRenderRepo::mark_ready(&state.pool, essay_id, origin, image_url, dimensions)
                .await?
        }
        _ => {
            EssayRenderRepo::upsert_status(
                &state.pool,
                essay_id,
                origin,
                observed.status,
                observed.image_url.as_deref(),
            )
            .await?
        }
    };

    Ok(Json(DataResponse { data: render }))
}

/// Follow a requested render in the background until it settles, then
/// record the outcome. The poll is a child of the server's shutdown
/// token; its result names the essay it was issued for, so an update
/// can never land on a different essay's row.
fn spawn_render_poll(state: &AppState, essay_id: DbId, origin: OriginTable) {
    let pool = state.pool.clone();
    let gateway = Arc::clone(&state.render);
    let cancel = state.shutdown.child_token();

    tokio::spawn(async move {
        let outcome =
            poll_render(gateway.as_ref(), essay_id, origin, &PollConfig::default(), &cancel).await;
        match outcome {
            Ok(PollOutcome::Ready(observed)) => {
                let Some(image_url) = observed.image_url.as_deref() else {
                    tracing::warn!(essay_id, origin = %origin, "Ready render without an image URL");
                    return;
                };
                let dimensions = probe_image(gateway.as_ref(), image_url).await;
                if let Err(e) =
                    EssayRenderRepo::mark_ready(&pool, essay_id, origin, image_url, dimensions)
                        .await
                {
                    tracing::error!(essay_id, origin = %origin, error = %e, "Failed to record ready render");
                }
            }
            Ok(PollOutcome::Failed(_)) => {
                if let Err(e) =
                    EssayRenderRepo::upsert_status(&pool, essay_id, origin, RenderStatus::Error, None)
                        .await
                {
                    tracing::error!(essay_id, origin = %origin, error = %e, "Failed to record render error");
                }
            }
            // Still in flight; manual status checks keep the cache fresh.
            Ok(PollOutcome::Exhausted(_)) | Ok(PollOutcome::Cancelled) => {}
            Err(e) => {
                tracing::warn!(essay_id, origin = %origin, error = %e, "Render poll failed");
            }
        }
    });
}

/// Fetch the image and read its natural dimensions from the header.
/// Best effort: a probe failure degrades to unknown dimensions.
async fn probe_image(gateway: &dyn RenderGateway, image_url: &str) -> Option<(i32, i32)> {
    let bytes = match gateway.fetch_image(image_url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(image_url, error = %e, "Could not fetch image for probing");
            return None;
        }
    };
    match probe_dimensions(&bytes) {
        Ok((width, height)) => Some((width as i32, height as i32)),
        Err(e) => {
            tracing::warn!(image_url, error = %e, "Could not read image dimensions");
            None
        }
    }
}
