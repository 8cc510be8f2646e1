use std::io::Cursor;

use base64::Engine as _;

use super::*;
use crate::assets::fetch::MemoryFetcher;
use crate::foundation::error::FetchFailure;

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn loader(fetcher: MemoryFetcher, max_bytes: usize) -> AssetLoader {
    AssetLoader::new(Arc::new(fetcher), Duration::from_secs(5), max_bytes)
}

#[test]
fn photo_source_classifies_by_scheme() {
    assert!(matches!(
        PhotoSource::from_reference("data:image/png;base64,AA=="),
        PhotoSource::DataUrl(_)
    ));
    assert!(matches!(
        PhotoSource::from_reference("https://cdn/x.jpg"),
        PhotoSource::Remote(_)
    ));
}

#[test]
fn background_is_fetched_and_cover_fitted() {
    let f = MemoryFetcher::new().with("bg", png(20, 10, [0, 255, 0, 255]));
    let l = loader(f, 1 << 20);
    let bg = l
        .load_background("bg", Canvas::new(8, 8).unwrap(), &CancelToken::new())
        .unwrap();
    assert_eq!((bg.width(), bg.height()), (8, 8));
    assert_eq!(bg.pixel(4, 4), [0, 255, 0, 255]);
}

#[test]
fn data_url_photo_skips_the_fetcher() {
    let b64 = base64::engine::general_purpose::STANDARD.encode(png(3, 4, [1, 2, 3, 255]));
    let l = loader(MemoryFetcher::new(), 1 << 20);
    let src = PhotoSource::from_reference(format!("data:image/png;base64,{b64}"));
    let img = l.load_photo(&src, &CancelToken::new()).unwrap();
    assert_eq!((img.width(), img.height()), (3, 4));
}

#[test]
fn missing_background_is_a_fetch_error() {
    let l = loader(MemoryFetcher::new(), 1 << 20);
    let err = l
        .load_background("nope", Canvas::new(8, 8).unwrap(), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(
        err,
        CardError::Fetch {
            failure: FetchFailure::NotFound,
            ..
        }
    ));
}

#[test]
fn oversize_asset_is_rejected() {
    let f = MemoryFetcher::new().with("big", vec![0u8; 64]);
    let l = loader(f, 16);
    assert!(matches!(
        l.load_bytes("big", &CancelToken::new()),
        Err(CardError::Decode(_))
    ));
}
