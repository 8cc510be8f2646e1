use xxhash_rust::xxh3::Xxh3;

use crate::encode::OutputFormat;
use crate::foundation::error::{CardError, CardResult};
use crate::scene::payload::RenderPayload;

const XXH3_SEED: u64 = 0x8b5ad4a0c7d8e9f1;

/// Stable 128-bit digest identifying a card render.
///
/// Equal payloads rendered with equal output settings produce equal fingerprints across
/// processes and machines, so callers can key stored images on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Fingerprint of the payload alone.
pub fn fingerprint_payload(payload: &RenderPayload) -> CardResult<Fingerprint> {
    let mut h = StableHasher::new();
    write_payload(&mut h, payload)?;
    Ok(h.finish())
}

/// Fingerprint of the payload plus the encoder settings that shape the output bytes.
pub fn fingerprint_render(
    payload: &RenderPayload,
    format: OutputFormat,
    jpeg_quality: u8,
) -> CardResult<Fingerprint> {
    let mut h = StableHasher::new();
    write_payload(&mut h, payload)?;
    match format {
        OutputFormat::Jpeg => {
            h.write_u8(1);
            h.write_u8(jpeg_quality);
        }
        OutputFormat::Png => h.write_u8(2),
    }
    Ok(h.finish())
}

fn write_payload(h: &mut StableHasher, payload: &RenderPayload) -> CardResult<()> {
    // Struct fields serialize in declaration order and texts are a BTreeMap, so the JSON form
    // is canonical for a given definition.
    let json = serde_json::to_vec(payload.def())
        .map_err(|e| CardError::payload(format!("serialize card for fingerprint: {e}")))?;
    h.write_u64(json.len() as u64);
    h.write_bytes(&json);
    Ok(())
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}
