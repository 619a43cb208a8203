//! Header-only image dimension probing.
//!
//! The coordinate space of every annotation is anchored to the natural
//! dimensions of the rendered image, so they are read once when a render
//! becomes ready and stored alongside the image reference. Only the
//! image header is decoded, never the full pixel data.

use std::io::Cursor;

use image::ImageReader;

use crate::gateway::RenderError;

/// Read natural `(width, height)` from image header bytes.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), RenderError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RenderError::Probe(e.to_string()))?;
    reader
        .into_dimensions()
        .map_err(|e| RenderError::Probe(e.to_string()))
}
