use std::sync::Arc;

use crate::assets::color::TextColor;
use crate::foundation::core::Canvas;
use crate::foundation::error::CardResult;
use crate::text::fonts::FontFile;
use crate::text::shaping::{LineMeasurer, ShapedGlyph, TextShaper};
use crate::text::wrap::wrap_greedy;

/// What the field's `y` fraction points at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    /// Top of the first line; its baseline sits one ascent below.
    #[default]
    Top,
    /// Baseline of the first line.
    Baseline,
    /// Vertical center of the whole wrapped block.
    Middle,
}

/// A validated text field ready for layout.
#[derive(Clone, Debug, PartialEq)]
pub struct TextField {
    pub name: String,
    pub value: String,
    /// Fraction of canvas height, `0..=1`.
    pub y: f64,
    pub family: String,
    pub size_px: f32,
    pub weight: u16,
    pub color: TextColor,
    /// Per-line top-of-line overrides in canvas pixels.
    pub baselines_y: Option<Vec<f32>>,
    pub anchor: TextAnchor,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    /// Wrap width as a fraction of canvas width.
    pub max_width_frac: f32,
    /// Gap between stacked lines as a fraction of font size.
    pub line_gap_frac: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            max_width_frac: 0.86,
            line_gap_frac: 0.22,
        }
    }
}

/// Vertical extent of one line around its baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineExtent {
    pub ascent: f32,
    pub descent: f32,
}

/// One line of text with resolved canvas position, ready to draw.
#[derive(Clone, Debug)]
pub struct TextRun {
    pub field: String,
    pub text: String,
    /// Left edge of the line.
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    pub font: Arc<FontFile>,
    pub face_index: u32,
    pub size_px: f32,
    pub color: TextColor,
    pub glyphs: Vec<ShapedGlyph>,
}

/// Baseline y for every line.
///
/// Explicit `baselines_y` entries put line `i` at `baselines_y[i] + ascent(i)`. Lines without an
/// entry stack below the previous one at `ascent(i) + descent(i - 1) + line_gap`.
pub fn place_baselines(
    lines: &[LineExtent],
    anchor_px: f32,
    anchor: TextAnchor,
    line_gap: f32,
    baselines_y: Option<&[f32]>,
) -> Vec<f32> {
    let explicit = baselines_y.unwrap_or(&[]);
    let mut out: Vec<f32> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let b = if let Some(top) = explicit.get(i) {
            top + line.ascent
        } else if let Some(prev) = out.last() {
            prev + line.ascent + lines[i - 1].descent + line_gap
        } else {
            match anchor {
                TextAnchor::Top => anchor_px + line.ascent,
                TextAnchor::Baseline => anchor_px,
                TextAnchor::Middle => {
                    let block: f32 = lines.iter().map(|l| l.ascent + l.descent).sum::<f32>()
                        + line_gap * lines.len().saturating_sub(1) as f32;
                    anchor_px - block * 0.5 + line.ascent
                }
            }
        };
        out.push(b);
    }
    out
}

/// Wrap, shape and position one field with `font`.
#[tracing::instrument(skip_all, fields(field = %field.name, font = %font.name))]
pub fn layout_field(
    shaper: &mut TextShaper,
    font: &Arc<FontFile>,
    field: &TextField,
    canvas: Canvas,
    params: LayoutParams,
) -> CardResult<Vec<TextRun>> {
    let max_width = params.max_width_frac * canvas.width as f32;
    let lines = {
        let mut measurer = LineMeasurer {
            shaper: &mut *shaper,
            font,
            size_px: field.size_px,
            weight: field.weight,
        };
        wrap_greedy(&field.value, max_width, &mut measurer)?
    };

    let mut shaped = Vec::with_capacity(lines.len());
    for line in &lines {
        shaped.push(shaper.shape_line(font, line, field.size_px, field.weight)?);
    }

    let extents: Vec<LineExtent> = shaped
        .iter()
        .map(|s| LineExtent {
            ascent: s.ascent,
            descent: s.descent,
        })
        .collect();
    let anchor_px = (field.y * f64::from(canvas.height)).round() as f32;
    let baselines = place_baselines(
        &extents,
        anchor_px,
        field.anchor,
        params.line_gap_frac * field.size_px,
        field.baselines_y.as_deref(),
    );
    tracing::debug!(lines = lines.len(), max_width, "laid out text field");

    let center = canvas.center_x();
    Ok(lines
        .into_iter()
        .zip(shaped)
        .zip(baselines)
        .map(|((text, s), baseline)| TextRun {
            field: field.name.clone(),
            text,
            x: center - s.width * 0.5,
            baseline,
            width: s.width,
            ascent: s.ascent,
            descent: s.descent,
            font: Arc::clone(font),
            face_index: s.face_index,
            size_px: field.size_px,
            color: field.color,
            glyphs: s.glyphs,
        })
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
