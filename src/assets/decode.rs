use crate::foundation::core::check_raster_dims;
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::foundation::pixels::PixelBuffer;

/// Decode encoded image bytes (any format enabled in `image`) into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> CardResult<PixelBuffer> {
    if bytes.is_empty() {
        return Err(CardError::decode("image payload is empty"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| CardError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    check_raster_dims(width, height).map_err(CardError::decode)?;

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    PixelBuffer::from_premul(width, height, rgba8_premul)
}

/// Scale `src` to fully cover `width x height` preserving aspect ratio, then center-crop the
/// overflow.
pub fn cover_fit(src: &PixelBuffer, width: u32, height: u32) -> CardResult<PixelBuffer> {
    check_raster_dims(width, height).map_err(CardError::geometry)?;
    if src.width() == width && src.height() == height {
        return Ok(src.clone());
    }

    let sw = f64::from(src.width());
    let sh = f64::from(src.height());
    let scale = (f64::from(width) / sw).max(f64::from(height) / sh);
    let scaled_w = ((sw * scale).round() as u32).max(width);
    let scaled_h = ((sh * scale).round() as u32).max(height);

    let scaled = src.resized(scaled_w, scaled_h)?;
    let x = (scaled_w - width) / 2;
    let y = (scaled_h - height) / 2;
    scaled.cropped(x, y, width, height)
}
