use crate::foundation::core::{Affine, BezPath};
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::pixels::PixelBuffer;

/// A `vello_cpu` context paired with the pixmap it renders into.
pub(crate) struct CpuSurface {
    pub(crate) ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl CpuSurface {
    pub(crate) fn new(width: u32, height: u32) -> CardResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| CardError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| CardError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(CardError::render("surface size must be non-zero"));
        }
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.reset();
        Ok(Self {
            ctx,
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Rasterize the recorded commands and return the premultiplied result.
    pub(crate) fn finish(mut self) -> CardResult<PixelBuffer> {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        let w = u32::from(self.pixmap.width());
        let h = u32::from(self.pixmap.height());
        PixelBuffer::from_premul(w, h, self.pixmap.data_as_u8_slice().to_vec())
    }
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
