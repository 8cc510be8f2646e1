use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> PixelBuffer {
    PixelBuffer::filled(w, h, px).unwrap()
}

#[test]
fn rejects_empty_and_mismatched_buffers() {
    assert!(PixelBuffer::transparent(0, 4).is_err());
    assert!(PixelBuffer::from_premul(2, 2, vec![0; 15]).is_err());
    assert!(PixelBuffer::from_premul(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn out_of_bounds_pixel_reads_are_transparent() {
    let b = solid(2, 2, [255, 0, 0, 255]);
    assert_eq!(b.pixel(1, 1), [255, 0, 0, 255]);
    assert_eq!(b.pixel(-1, 0), [0, 0, 0, 0]);
    assert_eq!(b.pixel(0, 2), [0, 0, 0, 0]);
}

#[test]
fn copy_from_clips_negative_offsets() {
    let mut dst = PixelBuffer::transparent(4, 4).unwrap();
    let src = solid(3, 3, [0, 0, 255, 255]);
    dst.copy_from(&src, -1, -1);
    assert_eq!(dst.pixel(0, 0), [0, 0, 255, 255]);
    assert_eq!(dst.pixel(1, 1), [0, 0, 255, 255]);
    assert_eq!(dst.pixel(2, 2), [0, 0, 0, 0]);
}

#[test]
fn copy_from_ignores_disjoint_sources() {
    let mut dst = PixelBuffer::transparent(4, 4).unwrap();
    dst.copy_from(&solid(2, 2, [9, 9, 9, 255]), 10, 0);
    assert!(dst.data().iter().all(|&b| b == 0));
}

#[test]
fn copy_from_saturates_extreme_offsets() {
    let mut dst = PixelBuffer::transparent(4, 4).unwrap();
    dst.copy_from(&solid(2, 2, [9, 9, 9, 255]), i64::MAX, i64::MAX);
    dst.draw_over(&solid(2, 2, [9, 9, 9, 255]), i64::MIN, 0);
    assert!(dst.data().iter().all(|&b| b == 0));
}

#[test]
fn draw_over_blends_half_alpha() {
    let mut dst = solid(1, 1, [0, 0, 255, 255]);
    dst.draw_over(&solid(1, 1, [128, 0, 0, 128]), 0, 0);
    let px = dst.pixel(0, 0);
    assert_eq!(px[3], 255);
    assert_eq!(px[0], 128);
    assert!(px[2].abs_diff(127) <= 1);
}

#[test]
fn cropped_extracts_window_and_rejects_overflow() {
    let mut b = PixelBuffer::transparent(4, 4).unwrap();
    b.copy_from(&solid(1, 1, [7, 7, 7, 255]), 2, 1);
    let c = b.cropped(2, 1, 2, 2).unwrap();
    assert_eq!((c.width(), c.height()), (2, 2));
    assert_eq!(c.pixel(0, 0), [7, 7, 7, 255]);
    assert!(b.cropped(3, 3, 2, 2).is_err());
}

#[test]
fn resized_keeps_uniform_color() {
    let b = solid(10, 10, [40, 80, 120, 255]);
    let r = b.resized(25, 7).unwrap();
    assert_eq!((r.width(), r.height()), (25, 7));
    assert_eq!(r.pixel(12, 3), [40, 80, 120, 255]);
}

#[test]
fn straight_conversion_unpremultiplies() {
    let b = solid(1, 1, [64, 0, 0, 128]);
    let s = b.to_straight_rgba8();
    assert_eq!(s[3], 128);
    assert!(s[0].abs_diff(128) <= 1);
}
