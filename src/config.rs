use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::encode::OutputFormat;
use crate::foundation::error::{CardError, CardResult};
use crate::text::layout::LayoutParams;

/// Process-level compositor configuration.
///
/// Every field has a default, so an empty JSON object is a valid options file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositorOpts {
    /// Directory scanned for `.ttf` / `.otf` / `.ttc` files. `None` disables family matching.
    pub font_dir: Option<PathBuf>,
    /// Font file used when no family matches.
    pub fallback_font: Option<PathBuf>,
    pub jpeg_quality: u8,
    pub output_format: OutputFormat,
    /// Wrap width as a fraction of canvas width.
    pub text_max_width_frac: f32,
    /// Line gap as a fraction of font size.
    pub line_gap_frac: f32,
    pub fetch_timeout_ms: u64,
    pub font_read_timeout_ms: u64,
    /// Upper bound on a fetched or embedded asset.
    pub max_asset_bytes: usize,
    /// Worker threads for [`crate::Compositor::render_batch`]. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            font_dir: None,
            fallback_font: None,
            jpeg_quality: 92,
            output_format: OutputFormat::Jpeg,
            text_max_width_frac: 0.86,
            line_gap_frac: 0.22,
            fetch_timeout_ms: 15_000,
            font_read_timeout_ms: 5_000,
            max_asset_bytes: 32 * 1024 * 1024,
            threads: None,
        }
    }
}

impl CompositorOpts {
    /// Read options from a JSON file and validate them.
    pub fn from_path(path: impl AsRef<Path>) -> CardResult<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .map_err(|e| CardError::payload(format!("open options '{}': {e}", path.display())))?;
        let opts: Self = serde_json::from_reader(std::io::BufReader::new(f))
            .map_err(|e| CardError::payload(format!("parse options '{}': {e}", path.display())))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = Some(dir.into());
        self
    }

    pub fn with_fallback_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_font = Some(path.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn validate(&self) -> CardResult<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(CardError::payload(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if !self.text_max_width_frac.is_finite()
            || self.text_max_width_frac <= 0.0
            || self.text_max_width_frac > 1.0
        {
            return Err(CardError::payload(format!(
                "text_max_width_frac must be in (0, 1], got {}",
                self.text_max_width_frac
            )));
        }
        if !self.line_gap_frac.is_finite() || self.line_gap_frac < 0.0 {
            return Err(CardError::payload(format!(
                "line_gap_frac must be >= 0, got {}",
                self.line_gap_frac
            )));
        }
        if self.fetch_timeout_ms == 0 || self.font_read_timeout_ms == 0 {
            return Err(CardError::payload("timeouts must be > 0 ms"));
        }
        if self.max_asset_bytes == 0 {
            return Err(CardError::payload("max_asset_bytes must be > 0"));
        }
        if self.threads == Some(0) {
            return Err(CardError::payload("threads must be >= 1 when set"));
        }
        Ok(())
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            max_width_frac: self.text_max_width_frac,
            line_gap_frac: self.line_gap_frac,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn font_read_timeout(&self) -> Duration {
        Duration::from_millis(self.font_read_timeout_ms)
    }
}
