//! Handlers for correction records and the grading state machine.
//!
//! A save is one atomic write of the full payload: five scores, the
//! recomputed total, five comments, summary, and the status derived by
//! the state machine. The current row is read under a lock inside the
//! same transaction, so concurrent saves of a slot serialize.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use rubric_core::correction::{
    self, CorrectionAction, EssayCorrectionState, MAX_COMPETENCY_COMMENT_LENGTH,
    MAX_SUMMARY_LENGTH,
};
use rubric_core::error::CoreError;
use rubric_core::status::{CorrectionStatus, CorrectorSlot, OriginTable};
use rubric_core::types::DbId;
use rubric_db::models::correction::{Correction, SaveCorrection};
use rubric_db::repositories::CorrectionRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
   Request / response payloads
   -------------------------------------------------------------------------- */

/// Body of the atomic save operation. The action drives the state
/// machine; any client-supplied total is ignored.
#[derive(Debug, Deserialize)]
pub struct SaveCorrectionRequest {
    pub corrector_id: DbId,
    pub scores: [i16; 5],
    pub comments: [String; 5],
    #[serde(default)]
    pub summary: String,
    pub audio_url: Option<String>,
    #[serde(flatten)]
    pub action: CorrectionAction,
}

/// Externally visible correction state of an essay.
#[derive(Debug, Serialize)]
pub struct EssayStatusView {
    pub state: EssayCorrectionState,
    pub published_grade: Option<i16>,
    pub corrections: Vec<Correction>,
}

fn validate_comment_lengths(request: &SaveCorrectionRequest) -> Result<(), CoreError> {
    for comment in &request.comments {
        if comment.len() > MAX_COMPETENCY_COMMENT_LENGTH {
            return Err(CoreError::Validation(format!(
                "Competency comment exceeds maximum length of {MAX_COMPETENCY_COMMENT_LENGTH} characters"
            )));
        }
    }
    if request.summary.len() > MAX_SUMMARY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Summary exceeds maximum length of {MAX_SUMMARY_LENGTH} characters"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /essays/{origin}/{id}/corrections/{slot}
///
/// Fetch a corrector slot's record. `data` is null when the slot has
/// never been saved.
pub async fn get_correction(
    State(state): State<AppState>,
    Path((origin, essay_id, slot)): Path<(String, DbId, i16)>,
) -> AppResult<impl IntoResponse> {
    let origin = OriginTable::parse(&origin)?;
    let slot = CorrectorSlot::from_id(slot)?;

    let correction = CorrectionRepo::find_by_slot(&state.pool, essay_id, origin, slot).await?;
    Ok(Json(DataResponse { data: correction }))
}

/// PUT /essays/{origin}/{id}/corrections/{slot}
///
/// Atomic save: runs the state machine against the currently stored
/// status, recomputes the total server-side, derives the summary (a
/// devolution stamps its justification with the return-notice prefix),
/// and upserts everything in one transaction.
pub async fn save_correction(
    State(state): State<AppState>,
    Path((origin, essay_id, slot)): Path<(String, DbId, i16)>,
    Json(request): Json<SaveCorrectionRequest>,
) -> AppResult<impl IntoResponse> {
    let origin = OriginTable::parse(&origin)?;
    let slot = CorrectorSlot::from_id(slot)?;

    correction::validate_scores(&request.scores)?;
    validate_comment_lengths(&request)?;
    let total = correction::total(&request.scores);

    let mut tx = state.pool.begin().await?;

    let current = CorrectionRepo::find_by_slot_for_update(&mut tx, essay_id, origin, slot)
        .await?
        .map(|row| row.status())
        .transpose()?
        .unwrap_or(CorrectionStatus::Draft);

    let next = correction::transition(current, &request.action)?;

    let summary = match &request.action {
        CorrectionAction::Return { justification } => {
            correction::devolution_summary(justification)?
        }
        _ => request.summary.clone(),
    };

    let input = SaveCorrection {
        corrector_id: request.corrector_id,
        scores: request.scores,
        comments: request.comments.clone(),
        summary: summary.clone(),
        audio_url: request.audio_url.clone(),
    };

    let saved =
        CorrectionRepo::upsert(&mut tx, essay_id, origin, slot, &input, total, &summary, next)
            .await?;

    tx.commit().await?;

    tracing::info!(
        essay_id,
        origin = %origin,
        slot = %slot,
        corrector_id = request.corrector_id,
        status = %next,
        total,
        "Correction saved"
    );

    Ok(Json(DataResponse { data: saved }))
}

/// GET /essays/{origin}/{id}/status
///
/// Derive the essay's externally visible correction state and published
/// grade from its corrector slots. Derived at read time; nothing is
/// stored.
pub async fn essay_status(
    State(state): State<AppState>,
    Path((origin, essay_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let origin = OriginTable::parse(&origin)?;

    let corrections = CorrectionRepo::list_for_essay(&state.pool, essay_id, origin).await?;

    let mut statuses: [Option<CorrectionStatus>; 2] = [None, None];
    let mut totals: [Option<(CorrectionStatus, i16)>; 2] = [None, None];
    for row in &corrections {
        let status = row.status()?;
        let index = (row.corrector_slot - 1) as usize;
        statuses[index] = Some(status);
        totals[index] = Some((status, row.total));
    }

    let view = EssayStatusView {
        state: correction::essay_visible_state(&statuses),
        published_grade: correction::published_grade(&totals),
        corrections,
    };

    Ok(Json(DataResponse { data: view }))
}
