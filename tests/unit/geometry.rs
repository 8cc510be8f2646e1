use super::*;

const RED: [u8; 4] = [255, 0, 0, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn red(w: u32, h: u32) -> PixelBuffer {
    PixelBuffer::filled(w, h, RED).unwrap()
}

fn crop(x: f64, y: f64, width: f64, height: f64) -> CropRect {
    CropRect {
        x,
        y,
        width,
        height,
    }
}

#[test]
fn negative_origin_pads_left_and_top() {
    let out = extract_crop_window(&red(400, 400), crop(-50.0, -20.0, 300.0, 300.0)).unwrap();
    assert_eq!((out.width(), out.height()), (300, 300));
    assert_eq!(out.pixel(49, 100), CLEAR);
    assert_eq!(out.pixel(50, 100), RED);
    assert_eq!(out.pixel(100, 19), CLEAR);
    assert_eq!(out.pixel(100, 20), RED);
}

#[test]
fn window_past_far_edge_pads_right_and_bottom() {
    let out = extract_crop_window(&red(400, 300), crop(350.0, 250.0, 100.0, 100.0)).unwrap();
    assert_eq!(out.pixel(49, 49), RED);
    assert_eq!(out.pixel(50, 10), CLEAR);
    assert_eq!(out.pixel(10, 50), CLEAR);
}

#[test]
fn wide_window_with_small_origin_keeps_content_offset() {
    // Window wider than the source starting inside it.
    let out = extract_crop_window(&red(400, 400), crop(50.0, 0.0, 1000.0, 10.0)).unwrap();
    assert_eq!(out.width(), 1000);
    assert_eq!(out.pixel(349, 5), RED);
    assert_eq!(out.pixel(350, 5), CLEAR);
}

#[test]
fn content_position_matches_origin_offset_for_many_windows() {
    let mut src = PixelBuffer::transparent(50, 40).unwrap();
    src.copy_from(&PixelBuffer::filled(1, 1, [0, 0, 255, 255]).unwrap(), 10, 7);
    for (cx, cy) in [(-30i64, -5i64), (0, 0), (5, 3), (-1, 20), (9, 6)] {
        let out =
            extract_crop_window(&src, crop(cx as f64, cy as f64, 64.0, 64.0)).unwrap();
        for y in 0..64i64 {
            for x in 0..64i64 {
                let want = if (x + cx, y + cy) == (10, 7) {
                    [0, 0, 255, 255]
                } else {
                    CLEAR
                };
                assert_eq!(out.pixel(x, y), want, "window ({cx},{cy}) at ({x},{y})");
            }
        }
    }
}

#[test]
fn window_fully_outside_is_transparent() {
    let out = extract_crop_window(&red(10, 10), crop(100.0, 100.0, 5.0, 5.0)).unwrap();
    assert!(out.data().iter().all(|&b| b == 0));
}

#[test]
fn crop_values_round_and_clamp_to_one_pixel() {
    let out = extract_crop_window(&red(10, 10), crop(0.4, 0.6, 0.2, -3.0)).unwrap();
    assert_eq!((out.width(), out.height()), (1, 1));
    let out = extract_crop_window(&red(10, 10), crop(1.5, 0.0, 3.5, 2.4)).unwrap();
    assert_eq!((out.width(), out.height()), (4, 2));
}

#[test]
fn non_finite_crop_is_a_geometry_error() {
    assert!(matches!(
        extract_crop_window(&red(4, 4), crop(f64::NAN, 0.0, 2.0, 2.0)),
        Err(CardError::Geometry(_))
    ));
    assert!(matches!(
        extract_crop_window(&red(4, 4), crop(0.0, 0.0, 1e9, 2.0)),
        Err(CardError::Geometry(_))
    ));
}

#[test]
fn crop_window_layer_is_stretched_to_target() {
    let target = TargetRect::from_f64(100.0, 100.0, 300.0, 300.0).unwrap();
    let input = GeometryInput::CropWindow(crop(-50.0, 0.0, 300.0, 300.0));
    let layer = resolve_photo_layer(&red(400, 400), &input, target).unwrap();
    assert_eq!((layer.width(), layer.height()), (300, 300));
    assert_eq!(layer.pixel(10, 150), CLEAR);
    assert_eq!(layer.pixel(150, 150), RED);
}

#[test]
fn scale_translate_places_and_clips() {
    let target = TargetRect::from_f64(0.0, 0.0, 100.0, 100.0).unwrap();
    let input = GeometryInput::ScaleTranslate {
        scale: 2.0,
        translate_x: 80.0,
        translate_y: -10.0,
    };
    let layer = resolve_photo_layer(&red(20, 20), &input, target).unwrap();
    assert_eq!((layer.width(), layer.height()), (100, 100));
    assert_eq!(layer.pixel(79, 5), CLEAR);
    assert_eq!(layer.pixel(85, 5), RED);
    assert_eq!(layer.pixel(85, 29), RED);
    assert_eq!(layer.pixel(85, 31), CLEAR);
}

#[test]
fn scale_must_be_positive() {
    let target = TargetRect::from_f64(0.0, 0.0, 10.0, 10.0).unwrap();
    for scale in [0.0, -1.0, f64::INFINITY] {
        let input = GeometryInput::ScaleTranslate {
            scale,
            translate_x: 0.0,
            translate_y: 0.0,
        };
        assert!(matches!(
            resolve_photo_layer(&red(4, 4), &input, target),
            Err(CardError::Geometry(_))
        ));
    }
}

#[test]
fn real_size_offset_resizes_per_axis() {
    let target = TargetRect::from_f64(0.0, 0.0, 50.0, 50.0).unwrap();
    let input = GeometryInput::RealSizeOffset {
        width: 30.0,
        height: 10.0,
        x: 5.0,
        y: 20.0,
    };
    let layer = resolve_photo_layer(&red(8, 8), &input, target).unwrap();
    assert_eq!(layer.pixel(4, 25), CLEAR);
    assert_eq!(layer.pixel(5, 20), RED);
    assert_eq!(layer.pixel(34, 29), RED);
    assert_eq!(layer.pixel(35, 25), CLEAR);
    assert_eq!(layer.pixel(20, 30), CLEAR);
}

#[test]
fn target_rounds_and_rejects_empty() {
    let t = TargetRect::from_f64(10.4, -2.6, 99.5, 50.2).unwrap();
    assert_eq!(
        t,
        TargetRect {
            x: 10,
            y: -3,
            width: 100,
            height: 50
        }
    );
    assert!(TargetRect::from_f64(0.0, 0.0, 0.4, 10.0).is_err());
    assert!(TargetRect::from_f64(0.0, 0.0, f64::NAN, 10.0).is_err());
}

#[test]
fn huge_offsets_are_geometry_errors() {
    let target = TargetRect {
        x: 0,
        y: 0,
        width: 10,
        height: 10,
    };
    for input in [
        GeometryInput::ScaleTranslate {
            scale: 1.0,
            translate_x: 1e30,
            translate_y: 0.0,
        },
        GeometryInput::RealSizeOffset {
            width: 4.0,
            height: 4.0,
            x: 0.0,
            y: -1e30,
        },
        GeometryInput::CropWindow(crop(1e12, 0.0, 4.0, 4.0)),
    ] {
        assert!(
            matches!(
                resolve_photo_layer(&red(4, 4), &input, target),
                Err(CardError::Geometry(_))
            ),
            "{input:?}"
        );
    }
    assert!(matches!(
        TargetRect::from_f64(1e30, 0.0, 10.0, 10.0),
        Err(CardError::Geometry(_))
    ));
}
