//! Repository for the `essay_renders` cache table.

use sqlx::PgPool;

use rubric_core::status::{OriginTable, RenderStatus};
use rubric_core::types::DbId;

use crate::error::PersistenceError;
use crate::models::essay_render::EssayRender;

/// Column list for essay_renders queries.
const COLUMNS: &str =
    "essay_id, origin_id, status_id, image_url, image_width, image_height, updated_at";

/// Tracks the last known render state per `(essay_id, origin)`.
pub struct EssayRenderRepo;

impl EssayRenderRepo {
    /// Last known render state for an essay.
    pub async fn get(
        pool: &PgPool,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<Option<EssayRender>, PersistenceError> {
        let query = format!(
            "SELECT {COLUMNS} FROM essay_renders
             WHERE essay_id = $1 AND origin_id = $2"
        );
        let render = sqlx::query_as::<_, EssayRender>(&query)
            .bind(essay_id)
            .bind(origin.id())
            .fetch_optional(pool)
            .await?;
        Ok(render)
    }

    /// Record a status observation. Keeps any previously stored image
    /// URL when the new observation has none.
    pub async fn upsert_status(
        pool: &PgPool,
        essay_id: DbId,
        origin: OriginTable,
        status: RenderStatus,
        image_url: Option<&str>,
    ) -> Result<EssayRender, PersistenceError> {
        let query = format!(
            "INSERT INTO essay_renders (essay_id, origin_id, status_id, image_url)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (essay_id, origin_id)
             DO UPDATE SET
                status_id = EXCLUDED.status_id,
                image_url = COALESCE(EXCLUDED.image_url, essay_renders.image_url),
                updated_at = now()
             RETURNING {COLUMNS}"
        );
        let render = sqlx::query_as::<_, EssayRender>(&query)
            .bind(essay_id)
            .bind(origin.id())
            .bind(status.id())
            .bind(image_url)
            .fetch_one(pool)
            .await?;
        Ok(render)
    }

    /// Record a completed render: image URL plus the natural dimensions
    /// probed from the image header.
    pub async fn mark_ready(
        pool: &PgPool,
        essay_id: DbId,
        origin: OriginTable,
        image_url: &str,
        dimensions: Option<(i32, i32)>,
    ) -> Result<EssayRender, PersistenceError> {
        let query = format!(
            "INSERT INTO essay_renders
                (essay_id, origin_id, status_id, image_url, image_width, image_height)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (essay_id, origin_id)
             DO UPDATE SET
                status_id = EXCLUDED.status_id,
                image_url = EXCLUDED.image_url,
                image_width = EXCLUDED.image_width,
                image_height = EXCLUDED.image_height,
                updated_at = now()
             RETURNING {COLUMNS}"
        );
        let render = sqlx::query_as::<_, EssayRender>(&query)
            .bind(essay_id)
            .bind(origin.id())
            .bind(RenderStatus::Ready.id())
            .bind(image_url)
            .bind(dimensions.map(|(w, _)| w))
            .bind(dimensions.map(|(_, h)| h))
            .fetch_one(pool)
            .await?;
        Ok(render)
    }
}
