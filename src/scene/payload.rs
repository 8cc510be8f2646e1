use crate::foundation::error::{CardError, CardResult};
use crate::scene::model::CardDef;
use crate::scene::validate::{CardScene, resolve_scene};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One card render request.
///
/// This is the JSON-facing representation produced by the calling layer. It is validated and
/// resolved into a [`CardScene`] at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPayload {
    def: CardDef,
}

impl RenderPayload {
    /// Parse a payload from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CardResult<Self> {
        let def: CardDef = serde_json::from_reader(r)
            .map_err(|e| CardError::payload(format!("parse card JSON: {e}")))?;
        Ok(Self { def })
    }

    /// Parse a payload from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> CardResult<Self> {
        let def: CardDef = serde_json::from_slice(bytes)
            .map_err(|e| CardError::payload(format!("parse card JSON: {e}")))?;
        Ok(Self { def })
    }

    /// Parse a payload from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CardResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CardError::payload(format!("open card JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn from_def(def: CardDef) -> Self {
        Self { def }
    }

    pub fn def(&self) -> &CardDef {
        &self.def
    }

    /// Declared output size.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.def.background.width, self.def.background.height)
    }

    /// Validate and resolve into pipeline inputs.
    pub fn resolve(&self) -> CardResult<CardScene> {
        resolve_scene(&self.def)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/payload.rs"]
mod tests;
