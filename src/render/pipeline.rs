use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::assets::fetch::ByteFetcher;
use crate::assets::loader::AssetLoader;
use crate::config::CompositorOpts;
use crate::encode::{OutputFormat, encode_canvas};
use crate::fingerprint::{Fingerprint, fingerprint_render};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::pixels::PixelBuffer;
use crate::geometry::resolve_photo_layer;
use crate::mask::{apply_destination_in, rasterize};
use crate::render::composite::{PlacedLayer, flatten_layers};
use crate::render::glyphs::draw_text_layer;
use crate::scene::payload::RenderPayload;
use crate::scene::validate::{CardScene, PhotoPlan};
use crate::text::fonts::{DirFontSource, FontRegistry, FontResolution, FontSource};
use crate::text::layout::{LayoutParams, TextRun, layout_field};
use crate::text::shaping::TextShaper;

/// A non-fatal condition hit while rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderWarning {
    /// `family` had no match; the field was drawn with the fallback font `used`.
    FontFallback {
        field: String,
        family: String,
        used: String,
    },
    /// No font at all was available; the field was not drawn.
    FontUnavailable { field: String, family: String },
}

impl std::fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FontFallback {
                field,
                family,
                used,
            } => write!(f, "texts.{field}: font '{family}' not found, used '{used}'"),
            Self::FontUnavailable { field, family } => {
                write!(f, "texts.{field}: font '{family}' not found and no fallback, skipped")
            }
        }
    }
}

/// An encoded card.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    /// Encoded image bytes in `format`.
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub fingerprint: Fingerprint,
    pub warnings: Vec<RenderWarning>,
}

/// Shared, thread-safe card renderer.
///
/// One instance serves every render in the process; per-render state lives on the stack of the
/// calling thread.
#[derive(Debug)]
pub struct Compositor {
    opts: CompositorOpts,
    loader: AssetLoader,
    fonts: Arc<FontRegistry>,
}

impl Compositor {
    /// Build a compositor that resolves asset references through `fetcher`.
    pub fn new(opts: CompositorOpts, fetcher: Arc<dyn ByteFetcher>) -> CardResult<Self> {
        opts.validate()?;
        let source = opts
            .font_dir
            .as_ref()
            .map(|dir| Arc::new(DirFontSource::new(dir.clone())) as Arc<dyn FontSource>);
        let fonts = Arc::new(FontRegistry::new(
            source,
            opts.fallback_font.clone(),
            opts.font_read_timeout(),
        ));
        let loader = AssetLoader::new(fetcher, opts.fetch_timeout(), opts.max_asset_bytes);
        Ok(Self {
            opts,
            loader,
            fonts,
        })
    }

    /// Replace the font registry, e.g. to share one cache between compositors.
    pub fn with_fonts(mut self, fonts: Arc<FontRegistry>) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    pub fn fonts(&self) -> &Arc<FontRegistry> {
        &self.fonts
    }

    /// Render and encode `payload`.
    pub fn render(&self, payload: &RenderPayload) -> CardResult<RenderOutput> {
        self.render_with_cancel(payload, &CancelToken::new())
    }

    /// Like [`Compositor::render`], stopping with [`CardError::Cancelled`] once `cancel` fires.
    #[tracing::instrument(skip_all, fields(w = payload.dimensions().0, h = payload.dimensions().1))]
    pub fn render_with_cancel(
        &self,
        payload: &RenderPayload,
        cancel: &CancelToken,
    ) -> CardResult<RenderOutput> {
        let started = Instant::now();
        let fingerprint =
            fingerprint_render(payload, self.opts.output_format, self.opts.jpeg_quality)?;
        let (canvas, warnings) = self.render_canvas(payload, cancel)?;
        cancel.check()?;

        let buffer = encode_canvas(&canvas, self.opts.output_format, self.opts.jpeg_quality)?;
        tracing::info!(
            %fingerprint,
            bytes = buffer.len(),
            warnings = warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rendered card"
        );
        Ok(RenderOutput {
            buffer,
            width: canvas.width(),
            height: canvas.height(),
            format: self.opts.output_format,
            fingerprint,
            warnings,
        })
    }

    /// Render `payload` to its flattened premultiplied canvas without encoding.
    pub fn render_canvas(
        &self,
        payload: &RenderPayload,
        cancel: &CancelToken,
    ) -> CardResult<(PixelBuffer, Vec<RenderWarning>)> {
        let scene = payload.resolve()?;
        cancel.check()?;

        let (background, photo) = rayon::join(
            || {
                self.loader
                    .load_background(&scene.background_url, scene.canvas, cancel)
            },
            || {
                scene
                    .photo
                    .as_ref()
                    .map(|plan| self.build_photo_layer(plan, cancel))
                    .transpose()
            },
        );
        // The background decides the outcome first; a card never renders without it.
        let background = background?;
        let photo = photo?;
        cancel.check()?;

        let mut warnings = Vec::new();
        let runs = self.layout_texts(&scene, self.opts.layout_params(), &mut warnings, cancel)?;
        cancel.check()?;
        let text = draw_text_layer(&runs, scene.canvas)?;
        cancel.check()?;

        let canvas = flatten_layers(background, photo.as_ref(), text.as_ref())?;
        Ok((canvas, warnings))
    }

    /// Render many payloads on a pool sized by `threads`, preserving input order.
    ///
    /// Each payload succeeds or fails on its own; only pool construction fails the batch.
    #[tracing::instrument(skip_all, fields(payloads = payloads.len()))]
    pub fn render_batch(
        &self,
        payloads: &[RenderPayload],
    ) -> CardResult<Vec<CardResult<RenderOutput>>> {
        let pool = build_thread_pool(self.opts.threads)?;
        Ok(pool.install(|| payloads.par_iter().map(|p| self.render(p)).collect()))
    }

    fn build_photo_layer(&self, plan: &PhotoPlan, cancel: &CancelToken) -> CardResult<PlacedLayer> {
        let src = self.loader.load_photo(&plan.source, cancel)?;
        cancel.check()?;
        let mut pixels = resolve_photo_layer(&src, &plan.geometry, plan.target)?;
        if let Some(mask) = &plan.mask {
            cancel.check()?;
            let alpha = rasterize(mask, pixels.width(), pixels.height())?;
            apply_destination_in(&mut pixels, &alpha)?;
        }
        Ok(PlacedLayer {
            pixels,
            target: plan.target,
        })
    }

    fn layout_texts(
        &self,
        scene: &CardScene,
        params: LayoutParams,
        warnings: &mut Vec<RenderWarning>,
        cancel: &CancelToken,
    ) -> CardResult<Vec<TextRun>> {
        if scene.texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut shaper = TextShaper::new();
        let mut runs = Vec::new();
        for field in &scene.texts {
            cancel.check()?;
            let font = match self.fonts.resolve(&field.family, field.weight, cancel)? {
                FontResolution::Matched(f) => f,
                FontResolution::Fallback(f) => {
                    tracing::warn!(
                        field = %field.name,
                        family = %field.family,
                        used = %f.name,
                        "font not found, using fallback"
                    );
                    warnings.push(RenderWarning::FontFallback {
                        field: field.name.clone(),
                        family: field.family.clone(),
                        used: f.name.clone(),
                    });
                    f
                }
                FontResolution::Unavailable => {
                    tracing::warn!(
                        field = %field.name,
                        family = %field.family,
                        "no font available, skipping field"
                    );
                    warnings.push(RenderWarning::FontUnavailable {
                        field: field.name.clone(),
                        family: field.family.clone(),
                    });
                    continue;
                }
            };
            runs.extend(layout_field(&mut shaper, &font, field, scene.canvas, params)?);
        }
        Ok(runs)
    }
}

fn build_thread_pool(threads: Option<usize>) -> CardResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CardError::payload("'threads' must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("cardpress-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CardError::render(format!("failed to build rayon thread pool: {e}")))
}
