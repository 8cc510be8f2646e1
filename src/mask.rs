//! Vector cutout masks for the user photo layer.

use crate::foundation::core::{Affine, BezPath, Vec2};
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::pixels::PixelBuffer;
use crate::render::cpu::{CpuSurface, affine_to_cpu, bezpath_to_cpu};

/// Winding rule used when filling the mask path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    #[serde(alias = "nonZero")]
    NonZero,
    #[serde(alias = "evenOdd")]
    EvenOdd,
}

/// Local coordinate system of the mask path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parse `"min-x min-y width height"`; separators may be spaces and/or commas.
    pub fn parse(s: &str) -> CardResult<Self> {
        let nums = s
            .split(|c: char| c.is_ascii_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<f64>()
                    .map_err(|_| CardError::mask_parse(format!("invalid viewBox number \"{p}\"")))
            })
            .collect::<CardResult<Vec<_>>>()?;
        match nums.as_slice() {
            [x, y, w, h] => Self::from_numbers([*x, *y, *w, *h]),
            _ => Err(CardError::mask_parse(format!(
                "viewBox needs 4 numbers, got {}",
                nums.len()
            ))),
        }
    }

    pub fn from_numbers([min_x, min_y, width, height]: [f64; 4]) -> CardResult<Self> {
        if ![min_x, min_y, width, height].iter().all(|v| v.is_finite()) {
            return Err(CardError::mask_parse("viewBox values must be finite"));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(CardError::mask_parse(format!(
                "viewBox size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            min_x,
            min_y,
            width,
            height,
        })
    }

    /// Map viewBox coordinates onto a `width x height` raster, stretching each axis.
    pub fn to_raster(self, width: u32, height: u32) -> Affine {
        Affine::scale_non_uniform(
            f64::from(width) / self.width,
            f64::from(height) / self.height,
        ) * Affine::translate(Vec2::new(-self.min_x, -self.min_y))
    }
}

/// A parsed, validated mask.
#[derive(Clone, Debug)]
pub struct MaskSpec {
    pub view_box: ViewBox,
    pub path: BezPath,
    pub fill_rule: FillRule,
}

impl MaskSpec {
    /// Validate the mask type and parse its path data.
    pub fn parse(kind: &str, view_box: ViewBox, path_d: &str, fill_rule: FillRule) -> CardResult<Self> {
        if !kind.trim().eq_ignore_ascii_case("svg") {
            return Err(CardError::mask_parse(format!(
                "unsupported mask type \"{kind}\" (expected \"svg\")"
            )));
        }
        let d = path_d.trim();
        if d.is_empty() {
            return Err(CardError::mask_parse("mask path is empty"));
        }
        let path = BezPath::from_svg(d)
            .map_err(|e| CardError::mask_parse(format!("invalid mask path: {e}")))?;
        if path.elements().is_empty() {
            return Err(CardError::mask_parse("mask path has no segments"));
        }
        Ok(Self {
            view_box,
            path,
            fill_rule,
        })
    }
}

/// Single-channel coverage raster, 255 = fully inside the mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaBuffer {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
}

impl AlphaBuffer {
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.alpha[(y as usize) * (self.width as usize) + (x as usize)]
    }
}

/// Rasterize `spec` at `width x height` with antialiasing.
#[tracing::instrument(skip(spec))]
pub fn rasterize(spec: &MaskSpec, width: u32, height: u32) -> CardResult<AlphaBuffer> {
    let mut surface = CpuSurface::new(width, height)?;
    let ctx = &mut surface.ctx;
    ctx.set_transform(affine_to_cpu(spec.view_box.to_raster(width, height)));
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    ctx.set_fill_rule(match spec.fill_rule {
        FillRule::NonZero => vello_cpu::peniko::Fill::NonZero,
        FillRule::EvenOdd => vello_cpu::peniko::Fill::EvenOdd,
    });
    ctx.fill_path(&bezpath_to_cpu(&spec.path));
    let rendered = surface.finish()?;

    let alpha = rendered.data().chunks_exact(4).map(|px| px[3]).collect();
    Ok(AlphaBuffer {
        width,
        height,
        alpha,
    })
}

/// Keep only the overlap of `layer` and `mask`: alpha becomes `min(layer, mask)` and the straight
/// color is preserved.
pub fn apply_destination_in(layer: &mut PixelBuffer, mask: &AlphaBuffer) -> CardResult<()> {
    if layer.width() != mask.width || layer.height() != mask.height {
        return Err(CardError::render(format!(
            "mask {}x{} does not match layer {}x{}",
            mask.width,
            mask.height,
            layer.width(),
            layer.height()
        )));
    }
    for (px, &ma) in layer.data_mut().chunks_exact_mut(4).zip(mask.alpha.iter()) {
        let pa = px[3];
        if ma >= pa {
            continue;
        }
        if ma == 0 {
            px.fill(0);
            continue;
        }
        // Premultiplied channels scale by the alpha ratio.
        let (pa32, ma32) = (u32::from(pa), u32::from(ma));
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * ma32 + pa32 / 2) / pa32).min(ma32) as u8;
        }
        px[3] = ma;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/mask.rs"]
mod tests;
