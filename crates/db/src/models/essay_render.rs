//! Cached render state for an essay image.

use rubric_core::error::CoreError;
use rubric_core::status::RenderStatus;
use rubric_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `essay_renders` table: the last known render status
/// and image reference for an essay, plus the natural dimensions probed
/// when the render became ready.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EssayRender {
    pub essay_id: DbId,
    pub origin_id: i16,
    pub status_id: i16,
    pub image_url: Option<String>,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
    pub updated_at: Timestamp,
}

impl EssayRender {
    pub fn status(&self) -> Result<RenderStatus, CoreError> {
        RenderStatus::from_id(self.status_id)
    }
}
