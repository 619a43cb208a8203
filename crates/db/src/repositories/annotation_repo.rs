//! Repository for the `annotations` table.

use sqlx::PgPool;

use rubric_core::status::OriginTable;
use rubric_core::types::DbId;

use crate::error::PersistenceError;
use crate::models::annotation::{Annotation, CreateAnnotation};

/// Column list for annotations queries.
const COLUMNS: &str = "id, essay_id, origin_id, corrector_id, competency, comment, \
    x_start, y_start, x_end, y_end, image_width, image_height, sequence_number, created_at";

/// Provides the annotation store contract: ordered listing, creation
/// with atomic sequence allocation, hard deletes, and bulk wipe.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Create an annotation, allocating the next sequence number for the
    /// essay in the same statement.
    ///
    /// The counter upsert and the insert commit atomically, so two
    /// correctors annotating the same essay concurrently can never
    /// observe the same number. Numbers are never reused: deletes do not
    /// decrement the counter.
    pub async fn create(
        pool: &PgPool,
        essay_id: DbId,
        origin: OriginTable,
        input: &CreateAnnotation,
    ) -> Result<Annotation, PersistenceError> {
        let query = format!(
            "WITH seq AS (
                INSERT INTO annotation_sequences (essay_id, origin_id, next_value)
                VALUES ($1, $2, 1)
                ON CONFLICT (essay_id, origin_id)
                DO UPDATE SET next_value = annotation_sequences.next_value + 1
                RETURNING next_value
             )
             INSERT INTO annotations
                (essay_id, origin_id, corrector_id, competency, comment,
                 x_start, y_start, x_end, y_end, image_width, image_height,
                 sequence_number)
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, seq.next_value
             FROM seq
             RETURNING {COLUMNS}"
        );
        let annotation = sqlx::query_as::<_, Annotation>(&query)
            .bind(essay_id)
            .bind(origin.id())
            .bind(input.corrector_id)
            .bind(input.competency)
            .bind(&input.comment)
            .bind(input.x_start)
            .bind(input.y_start)
            .bind(input.x_end)
            .bind(input.y_end)
            .bind(input.image_width)
            .bind(input.image_height)
            .fetch_one(pool)
            .await?;
        Ok(annotation)
    }

    /// List all annotations for an essay, ordered by creation time.
    ///
    /// `created_at` is the authoritative ordering key; sequence numbers
    /// are a display artifact, never a sort key.
    pub async fn list(
        pool: &PgPool,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<Vec<Annotation>, PersistenceError> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotations
             WHERE essay_id = $1 AND origin_id = $2
             ORDER BY created_at ASC, id ASC"
        );
        let annotations = sqlx::query_as::<_, Annotation>(&query)
            .bind(essay_id)
            .bind(origin.id())
            .fetch_all(pool)
            .await?;
        Ok(annotations)
    }

    /// Find an annotation by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Annotation>, PersistenceError> {
        let query = format!("SELECT {COLUMNS} FROM annotations WHERE id = $1");
        let annotation = sqlx::query_as::<_, Annotation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(annotation)
    }

    /// Highest sequence number currently persisted for an essay.
    pub async fn max_sequence(
        pool: &PgPool,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<i32, PersistenceError> {
        let row: (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM annotations
             WHERE essay_id = $1 AND origin_id = $2",
        )
        .bind(essay_id)
        .bind(origin.id())
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Hard delete. Remaining annotations keep their numbers.
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, PersistenceError> {
        let result = sqlx::query("DELETE FROM annotations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bulk delete for an essay and reset its sequence counter so the
    /// next annotation is numbered 1. Destructive; confirmation is the
    /// caller's responsibility. Returns the number of deleted rows.
    pub async fn clear_all(
        pool: &PgPool,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<u64, PersistenceError> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM annotations WHERE essay_id = $1 AND origin_id = $2")
            .bind(essay_id)
            .bind(origin.id())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE annotation_sequences SET next_value = 0
             WHERE essay_id = $1 AND origin_id = $2",
        )
        .bind(essay_id)
        .bind(origin.id())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            essay_id,
            origin = %origin,
            removed = result.rows_affected(),
            "Annotations wiped and sequence counter reset"
        );
        Ok(result.rows_affected())
    }
}
