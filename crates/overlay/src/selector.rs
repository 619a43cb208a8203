//! Parsing of the surface's native region selectors.
//!
//! Drawn regions arrive as W3C media-fragment strings:
//! `xywh=pixel:x,y,w,h` or `xywh=percent:x,y,w,h` (a missing unit means
//! pixel). The parsed rectangle is validated before it can reach the
//! store.

use rubric_core::error::CoreError;
use rubric_core::geometry::{to_pixel_rect, validate_region, PercentRect, PixelRect};

/// Parse a media-fragment selector into a validated pixel rectangle,
/// using the image's natural dimensions for percent selectors.
pub fn parse_selector(
    selector: &str,
    image_width: i32,
    image_height: i32,
) -> Result<PixelRect, CoreError> {
    let value = selector.strip_prefix("xywh=").ok_or_else(|| {
        CoreError::InvalidRegion(format!("selector '{selector}' is not an xywh fragment"))
    })?;

    let (unit, coords) = match value.split_once(':') {
        Some((unit, coords)) => (unit, coords),
        None => ("pixel", value),
    };

    let parts: Vec<&str> = coords.split(',').collect();
    if parts.len() != 4 {
        return Err(CoreError::InvalidRegion(format!(
            "selector '{selector}' must have exactly 4 coordinates"
        )));
    }

    let mut numbers = [0f64; 4];
    for (i, part) in parts.iter().enumerate() {
        numbers[i] = part.trim().parse::<f64>().map_err(|_| {
            CoreError::InvalidRegion(format!("selector coordinate '{part}' is not a number"))
        })?;
    }
    let [x, y, w, h] = numbers;

    let rect = match unit {
        "pixel" => PixelRect {
            x: x.round() as i32,
            y: y.round() as i32,
            width: w.round() as i32,
            height: h.round() as i32,
        },
        "percent" => to_pixel_rect(
            &PercentRect { x, y, width: w, height: h },
            image_width,
            image_height,
        )?,
        other => {
            return Err(CoreError::InvalidRegion(format!(
                "unsupported selector unit '{other}'"
            )))
        }
    };

    validate_region(&rect)?;
    Ok(rect)
}
