use super::*;
use crate::assets::loader::PhotoSource;
use crate::geometry::{CropRect, GeometryInput, TargetRect};
use crate::text::layout::TextAnchor;
use serde_json::json;

fn parse(v: serde_json::Value) -> RenderPayload {
    RenderPayload::from_slice(&serde_json::to_vec(&v).unwrap()).unwrap()
}

fn base() -> serde_json::Value {
    json!({ "background": { "url": "bg.jpg", "width": 800, "height": 600 } })
}

#[test]
fn background_only_payload_resolves() {
    let scene = parse(base()).resolve().unwrap();
    assert_eq!((scene.canvas.width, scene.canvas.height), (800, 600));
    assert_eq!(scene.background_url, "bg.jpg");
    assert!(scene.photo.is_none());
    assert!(scene.texts.is_empty());
}

#[test]
fn malformed_json_is_a_payload_error() {
    assert!(matches!(
        RenderPayload::from_slice(b"{ not json"),
        Err(CardError::Payload(_))
    ));
    assert!(matches!(
        RenderPayload::from_slice(br#"{"background": {"url": "x"}}"#),
        Err(CardError::Payload(_))
    ));
}

#[test]
fn zero_sized_background_is_rejected() {
    let mut v = base();
    v["background"]["width"] = json!(0);
    assert!(matches!(parse(v).resolve(), Err(CardError::Payload(_))));
}

#[test]
fn crop_payload_resolves_to_crop_window() {
    let mut v = base();
    v["userImage"] = json!({
        "dataUrl": "data:image/png;base64,AAAA",
        "crop": { "x": -50, "y": 0, "width": 300, "height": 300 }
    });
    v["target"] = json!({ "x": 100, "y": 100, "width": 300, "height": 300 });
    let photo = parse(v).resolve().unwrap().photo.unwrap();
    assert!(matches!(photo.source, PhotoSource::DataUrl(_)));
    assert_eq!(
        photo.geometry,
        GeometryInput::CropWindow(CropRect {
            x: -50.0,
            y: 0.0,
            width: 300.0,
            height: 300.0
        })
    );
    assert_eq!(
        photo.target,
        TargetRect {
            x: 100,
            y: 100,
            width: 300,
            height: 300
        }
    );
    assert!(photo.mask.is_none());
}

#[test]
fn top_level_crop_applies_when_user_image_has_none() {
    let mut v = base();
    v["userImage"] = json!({ "path": "photos/p.jpg" });
    v["crop"] = json!({ "x": 1, "y": 2, "width": 3, "height": 4 });
    let photo = parse(v).resolve().unwrap().photo.unwrap();
    assert_eq!(photo.source, PhotoSource::Remote("photos/p.jpg".to_owned()));
    assert!(matches!(photo.geometry, GeometryInput::CropWindow(c) if c.width == 3.0));
}

#[test]
fn crop_beats_transform_beats_real_size() {
    let mut v = base();
    v["userImage"] = json!({
        "path": "p.jpg",
        "transform": { "scale": 2, "translateX": 5 },
        "realSize": { "width": 10, "height": 10 }
    });
    let photo = parse(v.clone()).resolve().unwrap().photo.unwrap();
    assert_eq!(
        photo.geometry,
        GeometryInput::ScaleTranslate {
            scale: 2.0,
            translate_x: 5.0,
            translate_y: 0.0
        }
    );
    // No target: the photo box is the whole canvas.
    assert_eq!((photo.target.width, photo.target.height), (800, 600));

    v["userImage"]["transform"] = serde_json::Value::Null;
    let photo = parse(v).resolve().unwrap().photo.unwrap();
    assert!(matches!(photo.geometry, GeometryInput::RealSizeOffset { .. }));
}

#[test]
fn user_image_without_source_or_geometry_is_rejected() {
    let mut v = base();
    v["userImage"] = json!({ "crop": { "width": 1, "height": 1 } });
    assert!(matches!(parse(v.clone()).resolve(), Err(CardError::Payload(_))));

    v["userImage"] = json!({ "path": "p.jpg" });
    assert!(matches!(parse(v).resolve(), Err(CardError::Payload(_))));
}

#[test]
fn bad_mask_is_a_mask_parse_error() {
    let mut v = base();
    v["userImage"] = json!({ "path": "p.jpg", "crop": { "width": 10, "height": 10 } });
    v["mask"] = json!({ "type": "svg", "viewBox": "0 0 0 10", "path": "M0 0 L1 1 Z" });
    assert!(matches!(parse(v.clone()).resolve(), Err(CardError::MaskParse(_))));

    v["mask"] = json!({ "type": "svg", "viewBox": [0, 0, 10, 10], "path": "M0 0 L10 0 L10 10 Z", "fillRule": "evenodd" });
    let mask = parse(v).resolve().unwrap().photo.unwrap().mask.unwrap();
    assert_eq!(mask.fill_rule, crate::mask::FillRule::EvenOdd);
}

#[test]
fn texts_resolve_in_name_order_and_skip_empty_values() {
    let mut v = base();
    v["texts"] = json!({
        "name": { "value": "Ada", "y": 0.5, "font": { "family": "Arial", "sizePx": 60, "weight": 700 }, "color": "#ff0000" },
        "date": { "value": "  ", "y": 0.9, "font": { "family": "Arial", "sizePx": 20 } },
        "message": { "value": "Hi", "y": 0.2, "font": { "family": "Arial", "sizePx": 30 }, "anchor": "middle", "baselinesY": [10, 20] }
    });
    let scene = parse(v).resolve().unwrap();
    let names: Vec<&str> = scene.texts.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["message", "name"]);
    let name = &scene.texts[1];
    assert_eq!(name.weight, 700);
    assert_eq!(name.color.to_rgba8(), [255, 0, 0, 255]);
    assert_eq!(name.anchor, TextAnchor::Top);
    assert_eq!(scene.texts[0].baselines_y, Some(vec![10.0, 20.0]));
    assert_eq!(scene.texts[0].color.to_rgba8(), [0, 0, 0, 255]);
}

#[test]
fn text_y_outside_unit_range_is_rejected() {
    let mut v = base();
    v["texts"] = json!({ "t": { "value": "x", "y": 1.5, "font": { "family": "A", "sizePx": 10 } } });
    assert!(matches!(parse(v).resolve(), Err(CardError::Payload(_))));
}

#[test]
fn from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("card.json");
    std::fs::write(&p, serde_json::to_vec(&base()).unwrap()).unwrap();
    let payload = RenderPayload::from_path(&p).unwrap();
    assert_eq!(payload.dimensions(), (800, 600));
    assert!(matches!(
        RenderPayload::from_path(dir.path().join("missing.json")),
        Err(CardError::Payload(_))
    ));
}
