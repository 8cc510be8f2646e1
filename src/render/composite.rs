use crate::foundation::error::{CardError, CardResult};
use crate::foundation::pixels::PixelBuffer;
use crate::geometry::TargetRect;

/// The user photo after geometry and masking, with its canvas placement.
#[derive(Clone, Debug)]
pub struct PlacedLayer {
    pub pixels: PixelBuffer,
    pub target: TargetRect,
}

/// Stack the card layers bottom to top: background, photo, text.
///
/// The background fixes the canvas size; the text layer must match it.
pub fn flatten_layers(
    background: PixelBuffer,
    photo: Option<&PlacedLayer>,
    text: Option<&PixelBuffer>,
) -> CardResult<PixelBuffer> {
    let mut canvas = background;
    if let Some(p) = photo {
        canvas.draw_over(&p.pixels, p.target.x, p.target.y);
    }
    if let Some(t) = text {
        if t.width() != canvas.width() || t.height() != canvas.height() {
            return Err(CardError::render(format!(
                "text layer {}x{} does not match canvas {}x{}",
                t.width(),
                t.height(),
                canvas.width(),
                canvas.height()
            )));
        }
        canvas.draw_over(t, 0, 0);
    }
    Ok(canvas)
}
