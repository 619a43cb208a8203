//! Repository for the `corrections` table.
//!
//! Saves are atomic: the handler opens a transaction, reads the current
//! row with a row lock, runs the state machine, and upserts the full
//! payload. A failure anywhere leaves the stored record unchanged.

use sqlx::{PgConnection, PgPool};

use rubric_core::status::{CorrectionStatus, CorrectorSlot, OriginTable};
use rubric_core::types::DbId;

use crate::error::PersistenceError;
use crate::models::correction::{Correction, SaveCorrection};

/// Column list for corrections queries.
const COLUMNS: &str = "id, essay_id, origin_id, corrector_id, corrector_slot, \
    score_c1, score_c2, score_c3, score_c4, score_c5, total, \
    comment_c1, comment_c2, comment_c3, comment_c4, comment_c5, \
    summary, audio_url, status_id, created_at, updated_at";

/// Provides the correction persistence contract, keyed by
/// `(essay_id, origin, corrector_slot)`.
pub struct CorrectionRepo;

impl CorrectionRepo {
    /// Fetch a corrector slot's record, if one exists.
    pub async fn find_by_slot(
        pool: &PgPool,
        essay_id: DbId,
        origin: OriginTable,
        slot: CorrectorSlot,
    ) -> Result<Option<Correction>, PersistenceError> {
        let query = format!(
            "SELECT {COLUMNS} FROM corrections
             WHERE essay_id = $1 AND origin_id = $2 AND corrector_slot = $3"
        );
        let correction = sqlx::query_as::<_, Correction>(&query)
            .bind(essay_id)
            .bind(origin.id())
            .bind(slot.id())
            .fetch_optional(pool)
            .await?;
        Ok(correction)
    }

    /// Fetch a slot's record inside a transaction, locking the row so a
    /// concurrent save of the same slot serializes behind this one.
    pub async fn find_by_slot_for_update(
        conn: &mut PgConnection,
        essay_id: DbId,
        origin: OriginTable,
        slot: CorrectorSlot,
    ) -> Result<Option<Correction>, PersistenceError> {
        let query = format!(
            "SELECT {COLUMNS} FROM corrections
             WHERE essay_id = $1 AND origin_id = $2 AND corrector_slot = $3
             FOR UPDATE"
        );
        let correction = sqlx::query_as::<_, Correction>(&query)
            .bind(essay_id)
            .bind(origin.id())
            .bind(slot.id())
            .fetch_optional(conn)
            .await?;
        Ok(correction)
    }

    /// Upsert the full correction payload in one statement. `total`,
    /// `summary`, and `status` have already been derived server-side.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        conn: &mut PgConnection,
        essay_id: DbId,
        origin: OriginTable,
        slot: CorrectorSlot,
        input: &SaveCorrection,
        total: i16,
        summary: &str,
        status: CorrectionStatus,
    ) -> Result<Correction, PersistenceError> {
        let query = format!(
            "INSERT INTO corrections
                (essay_id, origin_id, corrector_id, corrector_slot,
                 score_c1, score_c2, score_c3, score_c4, score_c5, total,
                 comment_c1, comment_c2, comment_c3, comment_c4, comment_c5,
                 summary, audio_url, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                     $11, $12, $13, $14, $15, $16, $17, $18)
             ON CONFLICT ON CONSTRAINT uq_corrections_slot
             DO UPDATE SET
                corrector_id = EXCLUDED.corrector_id,
                score_c1 = EXCLUDED.score_c1,
                score_c2 = EXCLUDED.score_c2,
                score_c3 = EXCLUDED.score_c3,
                score_c4 = EXCLUDED.score_c4,
                score_c5 = EXCLUDED.score_c5,
                total = EXCLUDED.total,
                comment_c1 = EXCLUDED.comment_c1,
                comment_c2 = EXCLUDED.comment_c2,
                comment_c3 = EXCLUDED.comment_c3,
                comment_c4 = EXCLUDED.comment_c4,
                comment_c5 = EXCLUDED.comment_c5,
                summary = EXCLUDED.summary,
                audio_url = EXCLUDED.audio_url,
                status_id = EXCLUDED.status_id,
                updated_at = now()
             RETURNING {COLUMNS}"
        );
        let correction = sqlx::query_as::<_, Correction>(&query)
            .bind(essay_id)
            .bind(origin.id())
            .bind(input.corrector_id)
            .bind(slot.id())
            .bind(input.scores[0])
            .bind(input.scores[1])
            .bind(input.scores[2])
            .bind(input.scores[3])
            .bind(input.scores[4])
            .bind(total)
            .bind(&input.comments[0])
            .bind(&input.comments[1])
            .bind(&input.comments[2])
            .bind(&input.comments[3])
            .bind(&input.comments[4])
            .bind(summary)
            .bind(&input.audio_url)
            .bind(status.id())
            .fetch_one(conn)
            .await?;
        Ok(correction)
    }

    /// List every corrector slot's record for an essay, slot order.
    pub async fn list_for_essay(
        pool: &PgPool,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<Vec<Correction>, PersistenceError> {
        let query = format!(
            "SELECT {COLUMNS} FROM corrections
             WHERE essay_id = $1 AND origin_id = $2
             ORDER BY corrector_slot ASC"
        );
        let corrections = sqlx::query_as::<_, Correction>(&query)
            .bind(essay_id)
            .bind(origin.id())
            .fetch_all(pool)
            .await?;
        Ok(corrections)
    }
}
