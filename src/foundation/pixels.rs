use crate::foundation::core::check_raster_dims;
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::{mul_div255_u8, unpremultiply_rgba8_in_place};
use image::imageops::FilterType;

/// Raster in premultiplied RGBA8, row-major, tightly packed.
///
/// Every stage of the pipeline exchanges pixels in this form. Resampling runs on the premultiplied
/// bytes so transparent padding never bleeds color into visible edges.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    rgba8_premul: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba8_premul.len())
            .finish()
    }
}

impl PixelBuffer {
    /// Allocate a fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> CardResult<Self> {
        check_raster_dims(width, height).map_err(CardError::geometry)?;
        Ok(Self {
            width,
            height,
            rgba8_premul: vec![0; (width as usize) * (height as usize) * 4],
        })
    }

    /// Allocate a buffer filled with one premultiplied color.
    pub fn filled(width: u32, height: u32, px: [u8; 4]) -> CardResult<Self> {
        let mut out = Self::transparent(width, height)?;
        for c in out.rgba8_premul.chunks_exact_mut(4) {
            c.copy_from_slice(&px);
        }
        Ok(out)
    }

    /// Wrap existing premultiplied bytes.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> CardResult<Self> {
        check_raster_dims(width, height).map_err(CardError::geometry)?;
        let expected = (width as usize) * (height as usize) * 4;
        if rgba8_premul.len() != expected {
            return Err(CardError::render(format!(
                "pixel byte len mismatch: expected {expected}, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.rgba8_premul
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.rgba8_premul
    }

    pub fn into_data(self) -> Vec<u8> {
        self.rgba8_premul
    }

    /// Premultiplied pixel at `(x, y)`; out-of-bounds reads are transparent.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 4] {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return [0, 0, 0, 0];
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[idx..idx + 4];
        [p[0], p[1], p[2], p[3]]
    }

    /// Straight-alpha copy of the pixels.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Resample to `width x height` with a bilinear (triangle) filter.
    pub fn resized(&self, width: u32, height: u32) -> CardResult<Self> {
        check_raster_dims(width, height).map_err(CardError::geometry)?;
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let img = self.as_image()?;
        let out = image::imageops::resize(&img, width, height, FilterType::Triangle);
        Self::from_premul(width, height, out.into_raw())
    }

    /// Copy a `width x height` window starting at `(x, y)`. The window must lie inside the buffer.
    pub fn cropped(&self, x: u32, y: u32, width: u32, height: u32) -> CardResult<Self> {
        if u64::from(x) + u64::from(width) > u64::from(self.width)
            || u64::from(y) + u64::from(height) > u64::from(self.height)
        {
            return Err(CardError::render(format!(
                "crop {width}x{height}+{x}+{y} outside {}x{} buffer",
                self.width, self.height
            )));
        }
        let mut out = Self::transparent(width, height)?;
        let row = (width as usize) * 4;
        for r in 0..height as usize {
            let src = ((y as usize + r) * self.width as usize + x as usize) * 4;
            let dst = r * row;
            out.rgba8_premul[dst..dst + row].copy_from_slice(&self.rgba8_premul[src..src + row]);
        }
        Ok(out)
    }

    /// Overwrite the pixels under `src` placed at `(x, y)`, clipping to this buffer.
    pub fn copy_from(&mut self, src: &PixelBuffer, x: i64, y: i64) {
        self.for_each_overlap(src, x, y, |dst_row, src_row| dst_row.copy_from_slice(src_row));
    }

    /// Source-over composite `src` placed at `(x, y)`, clipping to this buffer.
    pub fn draw_over(&mut self, src: &PixelBuffer, x: i64, y: i64) {
        self.for_each_overlap(src, x, y, |dst_row, src_row| {
            for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                let out = premul_over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&out);
            }
        });
    }

    pub(crate) fn as_image(&self) -> CardResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.rgba8_premul.clone())
            .ok_or_else(|| CardError::render("pixel buffer does not match its dimensions"))
    }

    fn for_each_overlap(
        &mut self,
        src: &PixelBuffer,
        x: i64,
        y: i64,
        mut f: impl FnMut(&mut [u8], &[u8]),
    ) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(i64::from(src.width)).min(i64::from(self.width));
        let y1 = y.saturating_add(i64::from(src.height)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let span = ((x1 - x0) as usize) * 4;
        for dy in y0..y1 {
            let sy = (dy - y) as usize;
            let sx = (x0 - x) as usize;
            let s = (sy * src.width as usize + sx) * 4;
            let d = ((dy as usize) * self.width as usize + x0 as usize) * 4;
            f(
                &mut self.rgba8_premul[d..d + span],
                &src.rgba8_premul[s..s + span],
            );
        }
    }
}

pub(crate) fn premul_over_px(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }
    let inv = 255u16 - sa;
    let mut out = [0u8; 4];
    out[3] = src[3].saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for c in 0..3 {
        let dc = mul_div255_u8(u16::from(dst[c]), inv);
        out[c] = src[c].saturating_add(dc);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/pixels.rs"]
mod tests;
