use crate::assets::loader::PhotoSource;
use crate::foundation::core::Canvas;
use crate::foundation::error::{CardError, CardResult};
use crate::geometry::{CropRect, GeometryInput, TargetRect};
use crate::mask::{MaskSpec, ViewBox};
use crate::scene::model::{CardDef, CropDef, MaskDef, TextFieldDef, UserImageDef, ViewBoxDef};
use crate::text::layout::TextField;

/// A request after validation, in the types the pipeline stages consume.
#[derive(Clone, Debug)]
pub struct CardScene {
    pub canvas: Canvas,
    pub background_url: String,
    pub photo: Option<PhotoPlan>,
    /// Non-empty fields in name order.
    pub texts: Vec<TextField>,
}

#[derive(Clone, Debug)]
pub struct PhotoPlan {
    pub source: PhotoSource,
    pub geometry: GeometryInput,
    pub target: TargetRect,
    pub mask: Option<MaskSpec>,
}

pub(crate) fn resolve_scene(def: &CardDef) -> CardResult<CardScene> {
    let canvas = Canvas::new(def.background.width, def.background.height)?;
    if def.background.url.trim().is_empty() {
        return Err(CardError::payload("background.url must be non-empty"));
    }

    let photo = match &def.user_image {
        Some(img) => Some(resolve_photo(def, img, canvas)?),
        None => {
            if def.mask.is_some() {
                tracing::debug!("mask given without userImage; ignoring");
            }
            None
        }
    };

    let mut texts = Vec::with_capacity(def.texts.len());
    for (name, field) in &def.texts {
        if field.value.trim().is_empty() {
            tracing::debug!(field = %name, "skipping empty text field");
            continue;
        }
        texts.push(resolve_text(name, field)?);
    }

    Ok(CardScene {
        canvas,
        background_url: def.background.url.clone(),
        photo,
        texts,
    })
}

fn resolve_photo(def: &CardDef, img: &UserImageDef, canvas: Canvas) -> CardResult<PhotoPlan> {
    let source = match (&img.data_url, &img.path) {
        (Some(d), _) if !d.trim().is_empty() => PhotoSource::DataUrl(d.clone()),
        (_, Some(p)) if !p.trim().is_empty() => PhotoSource::from_reference(p.clone()),
        _ => {
            return Err(CardError::payload(
                "userImage needs a dataUrl or a path/url",
            ));
        }
    };

    let geometry = if let Some(c) = img.crop.or(def.crop) {
        GeometryInput::CropWindow(crop_rect(c))
    } else if let Some(t) = img.transform {
        GeometryInput::ScaleTranslate {
            scale: t.scale,
            translate_x: t.translate_x,
            translate_y: t.translate_y,
        }
    } else if let Some(size) = img.real_size {
        let offset = img.offset.unwrap_or_default();
        GeometryInput::RealSizeOffset {
            width: size.width,
            height: size.height,
            x: offset.x,
            y: offset.y,
        }
    } else {
        return Err(CardError::payload(
            "userImage needs one of crop, transform or realSize",
        ));
    };

    let target = match def.target {
        Some(t) => TargetRect::from_f64(t.x, t.y, t.width, t.height)?,
        None => TargetRect {
            x: 0,
            y: 0,
            width: canvas.width,
            height: canvas.height,
        },
    };

    let mask = def.mask.as_ref().map(resolve_mask).transpose()?;

    Ok(PhotoPlan {
        source,
        geometry,
        target,
        mask,
    })
}

fn crop_rect(c: CropDef) -> CropRect {
    CropRect {
        x: c.x,
        y: c.y,
        width: c.width,
        height: c.height,
    }
}

fn resolve_mask(m: &MaskDef) -> CardResult<MaskSpec> {
    let view_box = match &m.view_box {
        ViewBoxDef::Text(s) => ViewBox::parse(s)?,
        ViewBoxDef::Numbers(n) => ViewBox::from_numbers(*n)?,
    };
    MaskSpec::parse(&m.kind, view_box, &m.path, m.fill_rule)
}

fn resolve_text(name: &str, f: &TextFieldDef) -> CardResult<TextField> {
    if !f.y.is_finite() || !(0.0..=1.0).contains(&f.y) {
        return Err(CardError::payload(format!(
            "texts.{name}.y must be a fraction in 0..=1, got {}",
            f.y
        )));
    }
    if !f.font.size_px.is_finite() || f.font.size_px <= 0.0 {
        return Err(CardError::payload(format!(
            "texts.{name}.font.sizePx must be > 0, got {}",
            f.font.size_px
        )));
    }
    let baselines_y = match &f.baselines_y {
        Some(v) => {
            if v.iter().any(|b| !b.is_finite()) {
                return Err(CardError::payload(format!(
                    "texts.{name}.baselinesY must be finite"
                )));
            }
            Some(v.iter().map(|b| *b as f32).collect())
        }
        None => None,
    };
    Ok(TextField {
        name: name.to_owned(),
        value: f.value.clone(),
        y: f.y,
        family: f.font.family.clone(),
        size_px: f.font.size_px as f32,
        weight: f.font.weight.0,
        color: f.color,
        baselines_y,
        anchor: f.anchor,
    })
}
