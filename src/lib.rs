//! cardpress composites personalized image cards.
//!
//! A card is a background image, an optional user photo cropped or transformed into a target
//! rectangle and clipped by a vector mask, and centered wrapped text fields. Each render is
//! deterministic: equal payloads, assets and fonts produce identical pixels.
//!
//! - Parse a [`RenderPayload`]
//! - Create one [`Compositor`] per process
//! - Call [`Compositor::render`] (or [`Compositor::render_batch`]) to get a [`RenderOutput`]
#![forbid(unsafe_code)]

mod foundation;

pub mod assets;
pub mod config;
pub mod encode;
pub mod fingerprint;
pub mod geometry;
pub mod mask;
pub mod render;
pub mod scene;
pub mod text;

pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{Affine, BezPath, Canvas, Vec2};
pub use crate::foundation::error::{CardError, CardResult, ErrorClass, FetchFailure};
pub use crate::foundation::pixels::PixelBuffer;

pub use crate::assets::color::TextColor;
pub use crate::assets::fetch::{ByteFetcher, FsFetcher, MemoryFetcher};
pub use crate::assets::loader::{AssetLoader, PhotoSource};
pub use crate::config::CompositorOpts;
pub use crate::encode::{OutputFormat, encode_canvas};
pub use crate::fingerprint::{Fingerprint, fingerprint_payload};
pub use crate::geometry::{CropRect, GeometryInput, TargetRect};
pub use crate::mask::{AlphaBuffer, FillRule, MaskSpec, ViewBox};
pub use crate::render::pipeline::{Compositor, RenderOutput, RenderWarning};
pub use crate::scene::payload::RenderPayload;
pub use crate::text::fonts::{DirFontSource, FontFile, FontRegistry, FontResolution, FontSource};
pub use crate::text::layout::{LayoutParams, TextAnchor};
