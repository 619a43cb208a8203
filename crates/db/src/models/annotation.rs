//! Annotation row model and DTOs.

use rubric_core::geometry::PixelRect;
use rubric_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `annotations` table.
///
/// The rectangle is stored in pixel space of the image at capture time,
/// together with the natural dimensions at that moment, so reloads can
/// re-derive percent coordinates regardless of current display scaling.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Annotation {
    pub id: DbId,
    pub essay_id: DbId,
    pub origin_id: i16,
    pub corrector_id: DbId,
    pub competency: i16,
    pub comment: String,
    pub x_start: i32,
    pub y_start: i32,
    pub x_end: i32,
    pub y_end: i32,
    pub image_width: i32,
    pub image_height: i32,
    pub sequence_number: i32,
    pub created_at: Timestamp,
}

impl Annotation {
    /// Rectangle in pixel space of the image at capture time.
    pub fn rect(&self) -> PixelRect {
        PixelRect::from_corners(self.x_start, self.y_start, self.x_end, self.y_end)
    }
}

/// DTO for creating a new annotation. `id` and `sequence_number` are
/// assigned by the store on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAnnotation {
    pub corrector_id: DbId,
    pub competency: i16,
    pub comment: String,
    pub x_start: i32,
    pub y_start: i32,
    pub x_end: i32,
    pub y_end: i32,
    pub image_width: i32,
    pub image_height: i32,
}

impl CreateAnnotation {
    pub fn rect(&self) -> PixelRect {
        PixelRect::from_corners(self.x_start, self.y_start, self.x_end, self.y_end)
    }
}
