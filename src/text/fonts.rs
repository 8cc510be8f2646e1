use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::Duration;

use xxhash_rust::xxh3::xxh3_64;

use crate::foundation::cancel::{Bounded, CancelToken, run_bounded};
use crate::foundation::error::{CardError, CardResult};

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

/// Provider of font files, listed by name and read on demand.
pub trait FontSource: Send + Sync {
    /// File names available to [`FontSource::read_font_file`].
    fn list_font_files(&self) -> CardResult<Vec<String>>;
    fn read_font_file(&self, name: &str) -> CardResult<Vec<u8>>;
}

/// Fonts stored flat in one directory.
#[derive(Clone, Debug)]
pub struct DirFontSource {
    dir: PathBuf,
}

impl DirFontSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FontSource for DirFontSource {
    fn list_font_files(&self) -> CardResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            CardError::render(format!("list font dir '{}': {e}", self.dir.display()))
        })?;
        let mut out = Vec::new();
        for entry in entries.flatten() {
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                out.push(name.to_owned());
            }
        }
        Ok(out)
    }

    fn read_font_file(&self, name: &str) -> CardResult<Vec<u8>> {
        if name.contains('/') || name.contains('\\') || name == ".." {
            return Err(CardError::render(format!("invalid font file name '{name}'")));
        }
        let p = self.dir.join(name);
        std::fs::read(&p)
            .map_err(|e| CardError::render(format!("read font '{}': {e}", p.display())))
    }
}

/// Container format detected from the file signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontFormat {
    TrueType,
    OpenType,
    Collection,
}

impl FontFormat {
    pub fn from_data(data: &[u8]) -> Option<Self> {
        match data.get(0..4)? {
            b"\x00\x01\x00\x00" | b"true" => Some(Self::TrueType),
            b"OTTO" => Some(Self::OpenType),
            b"ttcf" => Some(Self::Collection),
            _ => None,
        }
    }
}

/// A loaded font file, shared between renders.
#[derive(Clone)]
pub struct FontFile {
    /// Content hash, stable across processes.
    pub id: u64,
    pub name: String,
    pub format: FontFormat,
    pub bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for FontFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFile")
            .field("id", &format_args!("{:016x}", self.id))
            .field("name", &self.name)
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl FontFile {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> CardResult<Self> {
        let name = name.into();
        let format = FontFormat::from_data(&bytes)
            .ok_or_else(|| CardError::render(format!("'{name}' is not a TrueType/OpenType font")))?;
        Ok(Self {
            id: xxh3_64(&bytes),
            name,
            format,
            bytes: Arc::new(bytes),
        })
    }
}

/// Outcome of resolving one (family, weight) request.
#[derive(Clone, Debug)]
pub enum FontResolution {
    /// A directory file matched the family.
    Matched(Arc<FontFile>),
    /// Nothing matched; the fallback font stands in.
    Fallback(Arc<FontFile>),
    /// No font is available at all.
    Unavailable,
}

impl FontResolution {
    pub fn font(&self) -> Option<&Arc<FontFile>> {
        match self {
            Self::Matched(f) | Self::Fallback(f) => Some(f),
            Self::Unavailable => None,
        }
    }
}

/// Result of one uncached lookup. `settled` is false when a read timed out or failed and a
/// retry might succeed; such results are never cached.
struct Lookup {
    font: Option<Arc<FontFile>>,
    settled: bool,
}

impl Lookup {
    const MISSING: Self = Self {
        font: None,
        settled: true,
    };
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct FontKey {
    family: String,
    weight_class: u16,
}

/// Process-wide read-through font cache.
///
/// Each (family, weight class) is resolved at most once; the directory is listed once. Reads
/// that time out or fail are retried by the next resolve.
pub struct FontRegistry {
    source: Option<Arc<dyn FontSource>>,
    fallback_path: Option<PathBuf>,
    read_timeout: Duration,
    listing: OnceLock<Vec<String>>,
    matches: RwLock<HashMap<FontKey, Option<Arc<FontFile>>>>,
    fallback: Mutex<Option<Option<Arc<FontFile>>>>,
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry")
            .field("has_source", &self.source.is_some())
            .field("fallback_path", &self.fallback_path)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl FontRegistry {
    pub fn new(
        source: Option<Arc<dyn FontSource>>,
        fallback_path: Option<PathBuf>,
        read_timeout: Duration,
    ) -> Self {
        Self {
            source,
            fallback_path,
            read_timeout,
            listing: OnceLock::new(),
            matches: RwLock::new(HashMap::new()),
            fallback: Mutex::new(None),
        }
    }

    /// A registry with no fonts; every field resolves to [`FontResolution::Unavailable`].
    pub fn empty() -> Self {
        Self::new(None, None, Duration::from_secs(1))
    }

    /// Resolve `family` at `weight`, consulting the cache first.
    pub fn resolve(
        &self,
        family: &str,
        weight: u16,
        cancel: &CancelToken,
    ) -> CardResult<FontResolution> {
        let key = FontKey {
            family: normalize_name(family),
            weight_class: weight_class(weight),
        };

        let cached = self
            .matches
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&key)
            .cloned();
        let matched = match cached {
            Some(m) => m,
            None => {
                let mut guard = self.matches.write().unwrap_or_else(|p| p.into_inner());
                match guard.get(&key) {
                    Some(m) => m.clone(),
                    None => {
                        let found = self.find_match(&key, cancel)?;
                        if found.settled {
                            guard.insert(key.clone(), found.font.clone());
                        }
                        found.font
                    }
                }
            }
        };

        if let Some(font) = matched {
            return Ok(FontResolution::Matched(font));
        }
        match self.fallback_font(cancel)? {
            Some(font) => Ok(FontResolution::Fallback(font)),
            None => Ok(FontResolution::Unavailable),
        }
    }

    fn listing(&self) -> &[String] {
        self.listing.get_or_init(|| {
            let Some(source) = &self.source else {
                return Vec::new();
            };
            match source.list_font_files() {
                Ok(mut names) => {
                    names.retain(|n| has_font_extension(n));
                    names.sort();
                    tracing::debug!(fonts = names.len(), "listed font directory");
                    names
                }
                Err(e) => {
                    tracing::warn!(error = %e, "font directory unavailable");
                    Vec::new()
                }
            }
        })
    }

    fn find_match(&self, key: &FontKey, cancel: &CancelToken) -> CardResult<Lookup> {
        let Some(source) = &self.source else {
            return Ok(Lookup::MISSING);
        };
        let Some(name) = best_match(self.listing(), &key.family, key.weight_class * 100) else {
            return Ok(Lookup::MISSING);
        };
        let name = name.to_owned();
        let found = self.read_bounded(source, &name, cancel)?;
        if let Some(f) = &found.font {
            tracing::debug!(family = %key.family, file = %f.name, "matched font");
        }
        Ok(found)
    }

    fn fallback_font(&self, cancel: &CancelToken) -> CardResult<Option<Arc<FontFile>>> {
        let mut guard = self.fallback.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(f) = guard.as_ref() {
            return Ok(f.clone());
        }
        let found = self.load_fallback(cancel)?;
        if found.settled {
            *guard = Some(found.font.clone());
        }
        Ok(found.font)
    }

    fn load_fallback(&self, cancel: &CancelToken) -> CardResult<Lookup> {
        let mut settled = true;
        if let Some(path) = &self.fallback_path {
            let p = path.clone();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("fallback")
                .to_owned();
            match run_bounded(self.read_timeout, cancel, move || std::fs::read(p))? {
                Bounded::Done(Ok(bytes)) => match FontFile::from_bytes(name, bytes) {
                    Ok(f) => {
                        return Ok(Lookup {
                            font: Some(Arc::new(f)),
                            settled: true,
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "configured fallback font unusable"),
                },
                Bounded::Done(Err(e)) => {
                    tracing::warn!(path = %path.display(), error = %e, "fallback font unreadable");
                    settled = e.kind() == std::io::ErrorKind::NotFound;
                }
                Bounded::TimedOut => {
                    tracing::warn!("fallback font read timed out");
                    settled = false;
                }
                Bounded::Cancelled => return Err(CardError::Cancelled),
            }
        }

        let Some(source) = &self.source else {
            return Ok(Lookup {
                font: None,
                settled,
            });
        };
        for name in self.listing() {
            let found = self.read_bounded(source, name, cancel)?;
            settled &= found.settled;
            if found.font.is_some() {
                return Ok(Lookup {
                    font: found.font,
                    settled,
                });
            }
        }
        Ok(Lookup {
            font: None,
            settled,
        })
    }

    fn read_bounded(
        &self,
        source: &Arc<dyn FontSource>,
        name: &str,
        cancel: &CancelToken,
    ) -> CardResult<Lookup> {
        let src = Arc::clone(source);
        let owned = name.to_owned();
        match run_bounded(self.read_timeout, cancel, move || src.read_font_file(&owned))? {
            Bounded::Done(Ok(bytes)) => match FontFile::from_bytes(name, bytes) {
                Ok(f) => Ok(Lookup {
                    font: Some(Arc::new(f)),
                    settled: true,
                }),
                Err(e) => {
                    tracing::warn!(file = name, error = %e, "skipping font file");
                    Ok(Lookup::MISSING)
                }
            },
            Bounded::Done(Err(e)) => {
                tracing::warn!(file = name, error = %e, "font read failed");
                Ok(Lookup {
                    font: None,
                    settled: false,
                })
            }
            Bounded::TimedOut => {
                tracing::warn!(file = name, "font read timed out");
                Ok(Lookup {
                    font: None,
                    settled: false,
                })
            }
            Bounded::Cancelled => Err(CardError::Cancelled),
        }
    }
}

/// Lowercase ASCII alphanumerics only: `"DejaVu Sans-Bold"` becomes `"dejavusansbold"`.
pub fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn weight_class(weight: u16) -> u16 {
    ((weight.clamp(100, 900) + 50) / 100).clamp(1, 9)
}

fn has_font_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

// Weight 0 marks a slant keyword.
const STYLE_TOKENS: [(&str, u16); 17] = [
    ("extralight", 200),
    ("ultralight", 200),
    ("thin", 100),
    ("light", 300),
    ("book", 400),
    ("regular", 400),
    ("normal", 400),
    ("medium", 500),
    ("semibold", 600),
    ("demibold", 600),
    ("extrabold", 800),
    ("ultrabold", 800),
    ("bold", 700),
    ("black", 900),
    ("heavy", 900),
    ("italic", 0),
    ("oblique", 0),
];

struct StemInfo {
    base: String,
    full: String,
    weight: u16,
    italic: bool,
}

fn stem_info(name: &str) -> StemInfo {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let mut weight = 400;
    let mut italic = false;
    let mut base = String::new();
    for token in stem.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut rest = token;
        // Strip trailing style words that start a token or a capitalized word,
        // e.g. "SansBoldItalic" -> "Sans", but not "Facebook".
        while let Some(&(t, w)) = STYLE_TOKENS
            .iter()
            .find(|(t, _)| ends_with_style_word(rest, t))
        {
            if w == 0 {
                italic = true;
            } else {
                weight = w;
            }
            rest = &rest[..rest.len() - t.len()];
        }
        base.push_str(&rest.to_ascii_lowercase());
    }
    StemInfo {
        base,
        full: normalize_name(stem),
        weight,
        italic,
    }
}

/// `word` ends with `style` (ASCII, any case) and the match begins the token or follows a
/// lowercase-to-uppercase change.
fn ends_with_style_word(word: &str, style: &str) -> bool {
    let Some(at) = word.len().checked_sub(style.len()) else {
        return false;
    };
    if !word.is_char_boundary(at) || !word[at..].eq_ignore_ascii_case(style) {
        return false;
    }
    if at == 0 {
        return true;
    }
    let bytes = word.as_bytes();
    bytes[at].is_ascii_uppercase() && !bytes[at - 1].is_ascii_uppercase()
}

/// Pick the listed file that best matches `family` at `weight`.
///
/// Family match dominates (exact, then prefix, then substring); weight closeness and an upright
/// style break ties; the lexicographically first name wins what remains.
pub fn best_match<'a>(names: &'a [String], family: &str, weight: u16) -> Option<&'a str> {
    let fam = normalize_name(family);
    if fam.is_empty() {
        return None;
    }
    let mut best: Option<(i32, &str)> = None;
    for name in names {
        if !has_font_extension(name) {
            continue;
        }
        let info = stem_info(name);
        let family_score = if info.base == fam {
            300
        } else if info.base.starts_with(&fam) {
            200
        } else if info.full.contains(&fam) {
            100
        } else {
            continue;
        };
        let diff = i32::from(info.weight.abs_diff(weight));
        let weight_score = 60 - (diff / 10).min(60);
        let style_score = if info.italic { -30 } else { 0 };
        let score = family_score + weight_score + style_score;
        let better = match best {
            None => true,
            Some((s, n)) => score > s || (score == s && name.as_str() < n),
        };
        if better {
            best = Some((score, name.as_str()));
        }
    }
    best.map(|(_, n)| n)
}

#[cfg(test)]
#[path = "../../tests/unit/text/fonts.rs"]
mod tests;
