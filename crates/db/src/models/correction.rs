//! Correction record row model and DTOs.

use rubric_core::error::CoreError;
use rubric_core::status::CorrectionStatus;
use rubric_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `corrections` table: one corrector slot's full grading
/// state for an essay.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Correction {
    pub id: DbId,
    pub essay_id: DbId,
    pub origin_id: i16,
    pub corrector_id: DbId,
    pub corrector_slot: i16,
    pub score_c1: i16,
    pub score_c2: i16,
    pub score_c3: i16,
    pub score_c4: i16,
    pub score_c5: i16,
    pub total: i16,
    pub comment_c1: String,
    pub comment_c2: String,
    pub comment_c3: String,
    pub comment_c4: String,
    pub comment_c5: String,
    pub summary: String,
    pub audio_url: Option<String>,
    pub status_id: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Correction {
    pub fn scores(&self) -> [i16; 5] {
        [self.score_c1, self.score_c2, self.score_c3, self.score_c4, self.score_c5]
    }

    pub fn status(&self) -> Result<CorrectionStatus, CoreError> {
        CorrectionStatus::from_id(self.status_id)
    }
}

/// Full field payload for the atomic save operation. Status and total
/// are computed server-side, never taken from this payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveCorrection {
    pub corrector_id: DbId,
    pub scores: [i16; 5],
    pub comments: [String; 5],
    pub summary: String,
    pub audio_url: Option<String>,
}
