use crate::assets::color::TextColor;
use crate::mask::FillRule;
use crate::text::layout::TextAnchor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON shape of one card render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDef {
    pub background: BackgroundDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<UserImageDef>,
    /// Crop window given beside `userImage` instead of inside it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<MaskDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetDef>,
    #[serde(default)]
    pub texts: BTreeMap<String, TextFieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundDef {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserImageDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_size: Option<SizeDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<OffsetDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropDef {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformDef {
    #[serde(default = "one")]
    pub scale: f64,
    #[serde(default)]
    pub translate_x: f64,
    #[serde(default)]
    pub translate_y: f64,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeDef {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetDef {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetDef {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskDef {
    #[serde(rename = "type", default = "svg_kind")]
    pub kind: String,
    pub view_box: ViewBoxDef,
    pub path: String,
    #[serde(default)]
    pub fill_rule: FillRule,
}

fn svg_kind() -> String {
    "svg".to_owned()
}

/// `"0 0 100 100"` or `[0, 0, 100, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewBoxDef {
    Text(String),
    Numbers([f64; 4]),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFieldDef {
    #[serde(default)]
    pub value: String,
    pub y: f64,
    pub font: FontDef,
    #[serde(default)]
    pub color: TextColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baselines_y: Option<Vec<f64>>,
    #[serde(default)]
    pub anchor: TextAnchor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontDef {
    pub family: String,
    pub size_px: f64,
    #[serde(default)]
    pub weight: FontWeightDef,
}

/// CSS-style font weight: a number in `1..=1000` or `"normal"` / `"bold"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FontWeightDef(pub u16);

impl Default for FontWeightDef {
    fn default() -> Self {
        Self(400)
    }
}

impl<'de> Deserialize<'de> for FontWeightDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Str(String),
        }

        let w = match Repr::deserialize(deserializer)? {
            Repr::Num(n) => n,
            Repr::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "normal" | "regular" => 400.0,
                "bold" => 700.0,
                other => other.parse::<f64>().map_err(|_| {
                    serde::de::Error::custom(format!("invalid font weight \"{s}\""))
                })?,
            },
        };
        if !w.is_finite() || !(1.0..=1000.0).contains(&w) {
            return Err(serde::de::Error::custom(format!(
                "font weight must be in 1..=1000, got {w}"
            )));
        }
        Ok(Self(w.round() as u16))
    }
}
