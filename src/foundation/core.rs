use crate::foundation::error::{CardError, CardResult};

pub use kurbo::{Affine, BezPath, Vec2};

/// Largest accepted width or height of any raster the compositor allocates.
///
/// `vello_cpu` surfaces are addressed with `u16`, and print cards never come close.
pub const MAX_RASTER_DIM: u32 = 16_384;

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas (`1..=MAX_RASTER_DIM` on both axes).
    pub fn new(width: u32, height: u32) -> CardResult<Self> {
        check_raster_dims(width, height).map_err(CardError::payload)?;
        Ok(Self { width, height })
    }

    /// Horizontal midpoint, the axis every text line is centered on.
    pub fn center_x(self) -> f32 {
        self.width as f32 * 0.5
    }
}

pub(crate) fn check_raster_dims(width: u32, height: u32) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err(format!("raster size must be non-zero, got {width}x{height}"));
    }
    if width > MAX_RASTER_DIM || height > MAX_RASTER_DIM {
        return Err(format!(
            "raster size too large: {width}x{height} (max {MAX_RASTER_DIM}x{MAX_RASTER_DIM})"
        ));
    }
    Ok(())
}
