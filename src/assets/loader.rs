use std::sync::Arc;
use std::time::Duration;

use crate::assets::decode::{cover_fit, decode_image};
use crate::assets::fetch::{ByteFetcher, decode_data_url, fetch_with_timeout, is_data_url};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::Canvas;
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::pixels::PixelBuffer;

/// Where the user photo's bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhotoSource {
    /// Embedded `data:` URL.
    DataUrl(String),
    /// Reference resolved through the [`ByteFetcher`].
    Remote(String),
}

impl PhotoSource {
    /// Classify a reference by its scheme.
    pub fn from_reference(s: impl Into<String>) -> Self {
        let s = s.into();
        if is_data_url(&s) {
            Self::DataUrl(s)
        } else {
            Self::Remote(s)
        }
    }

    fn describe(&self) -> &str {
        match self {
            Self::DataUrl(_) => "data url",
            Self::Remote(url) => url,
        }
    }
}

/// Turns asset references into decoded premultiplied buffers.
#[derive(Clone)]
pub struct AssetLoader {
    fetcher: Arc<dyn ByteFetcher>,
    fetch_timeout: Duration,
    max_asset_bytes: usize,
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("max_asset_bytes", &self.max_asset_bytes)
            .finish_non_exhaustive()
    }
}

impl AssetLoader {
    pub fn new(
        fetcher: Arc<dyn ByteFetcher>,
        fetch_timeout: Duration,
        max_asset_bytes: usize,
    ) -> Self {
        Self {
            fetcher,
            fetch_timeout,
            max_asset_bytes,
        }
    }

    /// Resolve `reference` to raw bytes: `data:` URLs are decoded in place, everything else is
    /// fetched under the configured timeout.
    pub fn load_bytes(&self, reference: &str, cancel: &CancelToken) -> CardResult<Vec<u8>> {
        let bytes = if is_data_url(reference) {
            decode_data_url(reference)?
        } else {
            fetch_with_timeout(
                Arc::clone(&self.fetcher),
                reference,
                self.fetch_timeout,
                cancel,
            )?
        };
        if bytes.len() > self.max_asset_bytes {
            return Err(CardError::decode(format!(
                "asset is {} bytes, limit is {}",
                bytes.len(),
                self.max_asset_bytes
            )));
        }
        Ok(bytes)
    }

    /// Load the background and cover-fit it to the canvas.
    #[tracing::instrument(skip(self, cancel), fields(w = canvas.width, h = canvas.height))]
    pub fn load_background(
        &self,
        url: &str,
        canvas: Canvas,
        cancel: &CancelToken,
    ) -> CardResult<PixelBuffer> {
        let bytes = self.load_bytes(url, cancel)?;
        cancel.check()?;
        let img = decode_image(&bytes)?;
        tracing::debug!(src_w = img.width(), src_h = img.height(), "decoded background");
        cancel.check()?;
        cover_fit(&img, canvas.width, canvas.height)
    }

    /// Load the user photo at its intrinsic size.
    pub fn load_photo(&self, source: &PhotoSource, cancel: &CancelToken) -> CardResult<PixelBuffer> {
        let bytes = match source {
            PhotoSource::DataUrl(s) | PhotoSource::Remote(s) => self.load_bytes(s, cancel)?,
        };
        cancel.check()?;
        let img = decode_image(&bytes)?;
        tracing::debug!(
            source = source.describe(),
            w = img.width(),
            h = img.height(),
            "decoded user photo"
        );
        Ok(img)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
