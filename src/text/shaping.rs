use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::foundation::error::{CardError, CardResult};
use crate::text::fonts::FontFile;
use crate::text::wrap::MeasureText;

/// Glyph positioned relative to the line origin: `x` from the line start, `y` from the baseline
/// (positive down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapedGlyph {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// One shaped line with the metrics of the font that actually shaped it.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapedLine {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    /// Face within the font file that shaped the glyphs.
    pub face_index: u32,
    pub glyphs: Vec<ShapedGlyph>,
}

/// A font context holding exactly one registered font file.
struct IsolatedFont {
    ctx: parley::FontContext,
    family: String,
}

/// Parley-backed shaper for single lines of text.
///
/// Each font file gets its own font context with system fonts disabled, so a family name can
/// only ever select the file it was registered from.
pub struct TextShaper {
    fonts: HashMap<u64, IsolatedFont>,
    layout_ctx: parley::LayoutContext<[u8; 4]>,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    fn isolated(font: &FontFile) -> CardResult<IsolatedFont> {
        let mut ctx = parley::FontContext {
            collection: parley::fontique::Collection::new(parley::fontique::CollectionOptions {
                shared: false,
                system_fonts: false,
            }),
            source_cache: parley::fontique::SourceCache::default(),
        };
        let families = ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CardError::render(format!("no font families registered from '{}'", font.name))
        })?;
        let family = ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CardError::render("registered font family has no name"))?
            .to_string();
        Ok(IsolatedFont { ctx, family })
    }

    /// Shape `text` as one unbroken line.
    pub fn shape_line(
        &mut self,
        font: &FontFile,
        text: &str,
        size_px: f32,
        weight: u16,
    ) -> CardResult<ShapedLine> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CardError::render("text size_px must be finite and > 0"));
        }
        let isolated = match self.fonts.entry(font.id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(Self::isolated(font)?),
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut isolated.ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::FontStack::Single(parley::FontFamily::Named(Cow::Borrowed(
                isolated.family.as_str(),
            ))),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::FontWeight::new(f32::from(weight)),
        ));

        let mut layout: parley::Layout<[u8; 4]> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );

        let mut out = ShapedLine {
            width: layout.width(),
            ascent: 0.0,
            descent: 0.0,
            face_index: 0,
            glyphs: Vec::new(),
        };
        let mut origin = None;
        for line in layout.lines() {
            let m = line.metrics();
            let baseline = *origin.get_or_insert(m.baseline);
            out.ascent = out.ascent.max(m.ascent);
            out.descent = out.descent.max(m.descent);
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                out.face_index = run.run().font().index;
                let mut x = run.offset();
                let y = run.baseline() - baseline;
                for g in run.glyphs() {
                    out.glyphs.push(ShapedGlyph {
                        id: g.id,
                        x: x + g.x,
                        y: y - g.y,
                    });
                    x += g.advance;
                }
            }
        }
        if out.ascent <= 0.0 && out.descent <= 0.0 {
            return Err(CardError::render(format!(
                "'{}' produced no line metrics for {text:?}",
                font.name
            )));
        }
        Ok(out)
    }
}

/// Measures candidate lines with one font at one size.
pub struct LineMeasurer<'a> {
    pub shaper: &'a mut TextShaper,
    pub font: &'a FontFile,
    pub size_px: f32,
    pub weight: u16,
}

impl MeasureText for LineMeasurer<'_> {
    fn measure(&mut self, text: &str) -> CardResult<f32> {
        Ok(self
            .shaper
            .shape_line(self.font, text, self.size_px, self.weight)?
            .width)
    }
}
