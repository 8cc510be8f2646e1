use std::collections::HashMap;

use crate::foundation::core::{Affine, Canvas, Vec2};
use crate::foundation::error::CardResult;
use crate::foundation::pixels::PixelBuffer;
use crate::render::cpu::{CpuSurface, affine_to_cpu};
use crate::text::layout::TextRun;

/// Rasterize `runs` onto a transparent canvas-sized layer.
///
/// Returns `None` when there is nothing to draw.
#[tracing::instrument(skip(runs), fields(runs = runs.len()))]
pub fn draw_text_layer(runs: &[TextRun], canvas: Canvas) -> CardResult<Option<PixelBuffer>> {
    if runs.iter().all(|r| r.glyphs.is_empty()) {
        return Ok(None);
    }

    let mut surface = CpuSurface::new(canvas.width, canvas.height)?;
    let mut fonts: HashMap<(u64, u32), vello_cpu::peniko::FontData> = HashMap::new();
    for run in runs {
        if run.glyphs.is_empty() {
            continue;
        }
        let font = fonts
            .entry((run.font.id, run.face_index))
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(run.font.bytes.as_ref().clone()),
                    run.face_index,
                )
            });
        let [r, g, b, a] = run.color.to_rgba8();
        let ctx = &mut surface.ctx;
        ctx.set_transform(affine_to_cpu(Affine::translate(Vec2::new(
            f64::from(run.x),
            f64::from(run.baseline),
        ))));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        let glyphs = run.glyphs.iter().map(|g| vello_cpu::Glyph {
            id: g.id,
            x: g.x,
            y: g.y,
        });
        ctx.glyph_run(font).font_size(run.size_px).fill_glyphs(glyphs);
    }
    surface.finish().map(Some)
}
