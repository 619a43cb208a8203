//! Annotation validation helpers.
//!
//! Geometry and comment checks run locally, before any store call is
//! made; an input that fails here never produces a network request.

use crate::competency::Competency;
use crate::error::CoreError;
use crate::geometry::{validate_region, PixelRect};

/// Maximum length of an annotation comment.
pub const MAX_COMMENT_LENGTH: usize = 2_000;

/// Validate an annotation comment.
///
/// The trimmed comment must be non-empty ([`CoreError::EmptyComment`])
/// and within [`MAX_COMMENT_LENGTH`].
pub fn validate_comment(comment: &str) -> Result<(), CoreError> {
    if comment.trim().is_empty() {
        return Err(CoreError::EmptyComment);
    }
    if comment.len() > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment exceeds maximum length of {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate the full set of fields required to persist an annotation.
pub fn validate_annotation(
    competency: i16,
    comment: &str,
    rect: &PixelRect,
    image_width: i32,
    image_height: i32,
) -> Result<(), CoreError> {
    Competency::from_id(competency)?;
    validate_comment(comment)?;
    validate_region(rect)?;
    crate::geometry::validate_dimensions(image_width, image_height)?;
    if rect.x_end() > image_width || rect.y_end() > image_height {
        return Err(CoreError::InvalidRegion(format!(
            "rectangle exceeds image bounds {image_width}x{image_height}"
        )));
    }
    Ok(())
}
