//! Coordinate transforms between pixel and percent-of-image space.
//!
//! The overlay surface works in percent coordinates so regions survive
//! display scaling; annotations are persisted in pixel space together
//! with the natural image dimensions at capture time. These conversions
//! must stay consistent across save/reload cycles: a pixel -> percent ->
//! pixel round trip recovers the original rectangle within 1px per edge.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Integer rounding tolerance for a full conversion round trip, in pixels.
pub const ROUND_TRIP_TOLERANCE_PX: i32 = 1;

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    /// Build a rectangle from the stored corner representation.
    pub fn from_corners(x_start: i32, y_start: i32, x_end: i32, y_end: i32) -> Self {
        Self {
            x: x_start,
            y: y_start,
            width: x_end - x_start,
            height: y_end - y_start,
        }
    }

    pub fn x_end(&self) -> i32 {
        self.x + self.width
    }

    pub fn y_end(&self) -> i32 {
        self.y + self.height
    }
}

/// Axis-aligned rectangle in percent-of-image space (0.0..=100.0 per axis).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Validate a pixel rectangle before it may reach the store.
///
/// Accepted only if `width > 0 && height > 0 && x >= 0 && y >= 0`.
/// Degenerate or negative-origin rectangles produce
/// [`CoreError::InvalidRegion`].
pub fn validate_region(rect: &PixelRect) -> Result<(), CoreError> {
    if rect.width <= 0 || rect.height <= 0 {
        return Err(CoreError::InvalidRegion(format!(
            "degenerate rectangle {}x{}",
            rect.width, rect.height
        )));
    }
    if rect.x < 0 || rect.y < 0 {
        return Err(CoreError::InvalidRegion(format!(
            "negative origin ({}, {})",
            rect.x, rect.y
        )));
    }
    Ok(())
}

/// Validate that natural image dimensions are usable for conversions.
pub fn validate_dimensions(image_width: i32, image_height: i32) -> Result<(), CoreError> {
    if image_width <= 0 || image_height <= 0 {
        return Err(CoreError::InvalidRegion(format!(
            "image dimensions {image_width}x{image_height} must be positive"
        )));
    }
    Ok(())
}

/// Convert a pixel rectangle into percent-of-image space.
pub fn to_percent_rect(
    rect: &PixelRect,
    image_width: i32,
    image_height: i32,
) -> Result<PercentRect, CoreError> {
    validate_dimensions(image_width, image_height)?;
    let w = f64::from(image_width);
    let h = f64::from(image_height);
    Ok(PercentRect {
        x: f64::from(rect.x) / w * 100.0,
        y: f64::from(rect.y) / h * 100.0,
        width: f64::from(rect.width) / w * 100.0,
        height: f64::from(rect.height) / h * 100.0,
    })
}

/// Convert a percent rectangle back into pixel space, rounded to the
/// nearest integer pixel.
pub fn to_pixel_rect(
    rect: &PercentRect,
    image_width: i32,
    image_height: i32,
) -> Result<PixelRect, CoreError> {
    validate_dimensions(image_width, image_height)?;
    let w = f64::from(image_width);
    let h = f64::from(image_height);
    Ok(PixelRect {
        x: (rect.x / 100.0 * w).round() as i32,
        y: (rect.y / 100.0 * h).round() as i32,
        width: (rect.width / 100.0 * w).round() as i32,
        height: (rect.height / 100.0 * h).round() as i32,
    })
}
