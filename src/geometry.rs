//! Placement of the user photo inside its target box.
//!
//! Every input mode resolves to a layer of exactly `target.width x target.height` pixels. Areas
//! the source does not cover are transparent; out-of-range crop windows are never an error.

use crate::foundation::core::MAX_RASTER_DIM;
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::pixels::PixelBuffer;

/// Crop window in source-photo pixels. May start before the origin or extend past the far edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Destination rectangle of the photo layer in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl TargetRect {
    /// Round a fractional rectangle to whole pixels.
    pub fn from_f64(x: f64, y: f64, width: f64, height: f64) -> CardResult<Self> {
        ensure_finite("target", &[x, y, width, height])?;
        let w = width.round();
        let h = height.round();
        if w < 1.0 || h < 1.0 {
            return Err(CardError::geometry(format!(
                "target must be at least 1x1, got {width}x{height}"
            )));
        }
        Ok(Self {
            x: origin_px("target x", x)?,
            y: origin_px("target y", y)?,
            width: dim_u32("target width", w)?,
            height: dim_u32("target height", h)?,
        })
    }
}

/// How the photo maps into the target box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeometryInput {
    /// Extract a window of the source, then stretch it to the target.
    CropWindow(CropRect),
    /// Scale the whole source uniformly and place its top-left corner at the translation.
    ScaleTranslate {
        scale: f64,
        translate_x: f64,
        translate_y: f64,
    },
    /// Resize the source to its displayed size and place it at the offset.
    RealSizeOffset {
        width: f64,
        height: f64,
        x: f64,
        y: f64,
    },
}

/// Produce the target-sized photo layer for `input`.
#[tracing::instrument(skip(src), fields(src_w = src.width(), src_h = src.height()))]
pub fn resolve_photo_layer(
    src: &PixelBuffer,
    input: &GeometryInput,
    target: TargetRect,
) -> CardResult<PixelBuffer> {
    match *input {
        GeometryInput::CropWindow(crop) => {
            let window = extract_crop_window(src, crop)?;
            window.resized(target.width, target.height)
        }
        GeometryInput::ScaleTranslate {
            scale,
            translate_x,
            translate_y,
        } => {
            ensure_finite("transform", &[scale, translate_x, translate_y])?;
            if scale <= 0.0 {
                return Err(CardError::geometry(format!(
                    "transform scale must be > 0, got {scale}"
                )));
            }
            let w = scaled_dim("scaled width", f64::from(src.width()) * scale)?;
            let h = scaled_dim("scaled height", f64::from(src.height()) * scale)?;
            place(src, w, h, translate_x, translate_y, target)
        }
        GeometryInput::RealSizeOffset {
            width,
            height,
            x,
            y,
        } => {
            ensure_finite("realSize/offset", &[width, height, x, y])?;
            if width <= 0.0 || height <= 0.0 {
                return Err(CardError::geometry(format!(
                    "realSize must be positive, got {width}x{height}"
                )));
            }
            let w = scaled_dim("realSize width", width)?;
            let h = scaled_dim("realSize height", height)?;
            place(src, w, h, x, y, target)
        }
    }
}

/// Extract `crop` from `src` without clamping its origin.
///
/// Values are rounded to whole pixels and the size clamped to at least 1x1. Source pixel
/// `(sx, sy)` lands at `(sx - crop.x, sy - crop.y)` in the result; everything the source does not
/// cover is transparent.
pub fn extract_crop_window(src: &PixelBuffer, crop: CropRect) -> CardResult<PixelBuffer> {
    ensure_finite("crop", &[crop.x, crop.y, crop.width, crop.height])?;
    let cx = origin_px("crop x", crop.x)?;
    let cy = origin_px("crop y", crop.y)?;
    let cw = dim_u32("crop width", crop.width.round().max(1.0))?;
    let ch = dim_u32("crop height", crop.height.round().max(1.0))?;

    let mut out = PixelBuffer::transparent(cw, ch)?;
    out.copy_from(src, -cx, -cy);
    tracing::debug!(cx, cy, cw, ch, "extracted crop window");
    Ok(out)
}

fn place(
    src: &PixelBuffer,
    w: u32,
    h: u32,
    x: f64,
    y: f64,
    target: TargetRect,
) -> CardResult<PixelBuffer> {
    let (x, y) = (origin_px("offset x", x)?, origin_px("offset y", y)?);
    let resized = src.resized(w, h)?;
    let mut layer = PixelBuffer::transparent(target.width, target.height)?;
    layer.copy_from(&resized, x, y);
    Ok(layer)
}

fn ensure_finite(what: &str, values: &[f64]) -> CardResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        return Ok(());
    }
    Err(CardError::geometry(format!(
        "{what} values must be finite, got {values:?}"
    )))
}

/// Round a position to whole pixels, rejecting values outside the `i32` range.
fn origin_px(what: &str, v: f64) -> CardResult<i64> {
    let r = v.round();
    if !r.is_finite() || r.abs() > f64::from(i32::MAX) {
        return Err(CardError::geometry(format!("{what} {v} is out of range")));
    }
    Ok(r as i64)
}

fn scaled_dim(what: &str, v: f64) -> CardResult<u32> {
    dim_u32(what, v.round().max(1.0))
}

fn dim_u32(what: &str, v: f64) -> CardResult<u32> {
    if v > f64::from(MAX_RASTER_DIM) {
        return Err(CardError::geometry(format!(
            "{what} {v} exceeds the {MAX_RASTER_DIM} px limit"
        )));
    }
    Ok(v as u32)
}

#[cfg(test)]
#[path = "../tests/unit/geometry.rs"]
mod tests;
