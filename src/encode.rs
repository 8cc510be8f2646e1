//! Serialization of the final canvas.

use image::ImageEncoder as _;

use crate::foundation::error::{CardError, CardResult};
use crate::foundation::pixels::PixelBuffer;

/// Output container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Baseline JPEG, alpha flattened over black.
    #[default]
    Jpeg,
    /// PNG with straight alpha.
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(format!("unknown output format \"{other}\" (expected jpeg or png)")),
        }
    }
}

/// Encode `canvas` as `format`. `jpeg_quality` is on the `1..=100` scale and ignored for PNG.
pub fn encode_canvas(
    canvas: &PixelBuffer,
    format: OutputFormat,
    jpeg_quality: u8,
) -> CardResult<Vec<u8>> {
    let (w, h) = (canvas.width(), canvas.height());
    let mut out = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            if !(1..=100).contains(&jpeg_quality) {
                return Err(CardError::encode(format!(
                    "jpeg quality must be in 1..=100, got {jpeg_quality}"
                )));
            }
            // Premultiplied color is the composite over black.
            let rgb: Vec<u8> = canvas
                .data()
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            let mut enc =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, jpeg_quality);
            enc.encode(&rgb, w, h, image::ExtendedColorType::Rgb8)
                .map_err(|e| CardError::encode(format!("jpeg: {e}")))?;
        }
        OutputFormat::Png => {
            let rgba = canvas.to_straight_rgba8();
            image::codecs::png::PngEncoder::new(&mut out)
                .write_image(&rgba, w, h, image::ExtendedColorType::Rgba8)
                .map_err(|e| CardError::encode(format!("png: {e}")))?;
        }
    }
    tracing::debug!(?format, bytes = out.len(), "encoded canvas");
    Ok(out)
}
