use super::*;

const CIRCLE: &str = "M 50 0 C 77.6 0 100 22.4 100 50 C 100 77.6 77.6 100 50 100 \
                      C 22.4 100 0 77.6 0 50 C 0 22.4 22.4 0 50 0 Z";

fn circle() -> MaskSpec {
    MaskSpec::parse(
        "svg",
        ViewBox::parse("0 0 100 100").unwrap(),
        CIRCLE,
        FillRule::NonZero,
    )
    .unwrap()
}

#[test]
fn view_box_accepts_spaces_and_commas() {
    let vb = ViewBox::parse(" 0, 0 200,100 ").unwrap();
    assert_eq!(
        vb,
        ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: 200.0,
            height: 100.0
        }
    );
}

#[test]
fn view_box_rejects_bad_input() {
    for s in ["", "0 0 100", "0 0 0 10", "0 0 -5 10", "0 0 a 10", "0 0 1 1 1"] {
        assert!(
            matches!(ViewBox::parse(s), Err(CardError::MaskParse(_))),
            "{s:?}"
        );
    }
}

#[test]
fn mask_parse_validates_type_and_path() {
    let vb = ViewBox::parse("0 0 10 10").unwrap();
    assert!(MaskSpec::parse("SVG", vb, "M0 0 L10 0 L10 10 Z", FillRule::NonZero).is_ok());
    assert!(matches!(
        MaskSpec::parse("png", vb, "M0 0 L10 0 Z", FillRule::NonZero),
        Err(CardError::MaskParse(_))
    ));
    assert!(matches!(
        MaskSpec::parse("svg", vb, "   ", FillRule::NonZero),
        Err(CardError::MaskParse(_))
    ));
    assert!(matches!(
        MaskSpec::parse("svg", vb, "M 0 0 Q", FillRule::NonZero),
        Err(CardError::MaskParse(_))
    ));
}

#[test]
fn circle_mask_is_clear_at_corners_and_opaque_at_center() {
    let m = rasterize(&circle(), 200, 200).unwrap();
    assert_eq!((m.width, m.height), (200, 200));
    assert_eq!(m.alpha.len(), 200 * 200);
    for (x, y) in [(0, 0), (199, 0), (0, 199), (199, 199)] {
        assert_eq!(m.get(x, y), 0, "corner ({x},{y})");
    }
    assert_eq!(m.get(100, 100), 255);
}

#[test]
fn view_box_is_stretched_per_axis() {
    // Left half of the viewBox, rendered into a wide raster.
    let spec = MaskSpec::parse(
        "svg",
        ViewBox::parse("10 10 20 20").unwrap(),
        "M10 10 L20 10 L20 30 L10 30 Z",
        FillRule::NonZero,
    )
    .unwrap();
    let m = rasterize(&spec, 100, 40).unwrap();
    assert_eq!(m.get(10, 20), 255);
    assert_eq!(m.get(45, 20), 255);
    assert_eq!(m.get(55, 20), 0);
    assert_eq!(m.get(90, 5), 0);
}

#[test]
fn even_odd_punches_holes_nonzero_does_not() {
    let d = "M0 0 L100 0 L100 100 L0 100 Z M25 25 L75 25 L75 75 L25 75 Z";
    let vb = ViewBox::parse("0 0 100 100").unwrap();
    let eo = rasterize(&MaskSpec::parse("svg", vb, d, FillRule::EvenOdd).unwrap(), 100, 100).unwrap();
    let nz = rasterize(&MaskSpec::parse("svg", vb, d, FillRule::NonZero).unwrap(), 100, 100).unwrap();
    assert_eq!(eo.get(50, 50), 0);
    assert_eq!(eo.get(10, 10), 255);
    assert_eq!(nz.get(50, 50), 255);
}

#[test]
fn destination_in_clears_outside_and_keeps_inside() {
    let mut layer = PixelBuffer::filled(200, 200, [200, 100, 50, 255]).unwrap();
    let m = rasterize(&circle(), 200, 200).unwrap();
    apply_destination_in(&mut layer, &m).unwrap();
    for (x, y) in [(0u32, 0u32), (199, 199), (3, 196)] {
        if m.get(x, y) == 0 {
            assert_eq!(layer.pixel(i64::from(x), i64::from(y)), [0, 0, 0, 0]);
        }
    }
    assert_eq!(layer.pixel(100, 100), [200, 100, 50, 255]);
}

#[test]
fn destination_in_takes_minimum_alpha_and_keeps_straight_color() {
    let mut layer = PixelBuffer::from_premul(3, 1, vec![100, 50, 0, 100, 100, 50, 0, 100, 255, 0, 0, 255]).unwrap();
    let mask = AlphaBuffer {
        width: 3,
        height: 1,
        alpha: vec![255, 50, 0],
    };
    apply_destination_in(&mut layer, &mask).unwrap();
    assert_eq!(layer.pixel(0, 0), [100, 50, 0, 100]);
    assert_eq!(layer.pixel(1, 0), [50, 25, 0, 50]);
    assert_eq!(layer.pixel(2, 0), [0, 0, 0, 0]);
}

#[test]
fn destination_in_rejects_size_mismatch() {
    let mut layer = PixelBuffer::transparent(4, 4).unwrap();
    let mask = AlphaBuffer {
        width: 2,
        height: 2,
        alpha: vec![255; 4],
    };
    assert!(apply_destination_in(&mut layer, &mask).is_err());
}
