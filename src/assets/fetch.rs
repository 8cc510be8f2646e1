use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;

use crate::foundation::cancel::{Bounded, CancelToken, run_bounded};
use crate::foundation::error::{CardError, CardResult, FetchFailure};

/// Resolves an asset reference to its raw bytes.
///
/// Implementations map their own failure modes onto [`CardError::Fetch`] so callers can tell
/// transient network conditions from missing assets.
pub trait ByteFetcher: Send + Sync {
    fn fetch_bytes(&self, url: &str) -> CardResult<Vec<u8>>;
}

impl<T: ByteFetcher + ?Sized> ByteFetcher for Arc<T> {
    fn fetch_bytes(&self, url: &str) -> CardResult<Vec<u8>> {
        (**self).fetch_bytes(url)
    }
}

/// Serves references from a local directory.
///
/// Accepts bare relative paths and `file://` references; both resolve under `root` and may not
/// escape it.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ByteFetcher for FsFetcher {
    fn fetch_bytes(&self, url: &str) -> CardResult<Vec<u8>> {
        let rel = url.strip_prefix("file://").unwrap_or(url);
        if rel.contains("://") {
            return Err(CardError::fetch(
                url,
                FetchFailure::Unreachable,
                "filesystem fetcher only serves local paths",
            ));
        }
        let norm = normalize_rel_path(rel)
            .map_err(|e| CardError::fetch(url, FetchFailure::NotFound, e))?;
        let path = self.root.join(&norm);
        std::fs::read(&path).map_err(|e| {
            let failure = if e.kind() == std::io::ErrorKind::NotFound {
                FetchFailure::NotFound
            } else {
                FetchFailure::Unreachable
            };
            CardError::fetch(url, failure, format!("read '{}': {e}", path.display()))
        })
    }
}

/// In-memory fetcher keyed by exact reference, for tests and pre-fetched assets.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Arc<Vec<u8>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(url.into(), Arc::new(bytes));
    }

    pub fn with(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }
}

impl ByteFetcher for MemoryFetcher {
    fn fetch_bytes(&self, url: &str) -> CardResult<Vec<u8>> {
        self.entries
            .get(url)
            .map(|b| b.as_ref().clone())
            .ok_or_else(|| CardError::fetch(url, FetchFailure::NotFound, "no such entry"))
    }
}

/// Fetch `url` on a helper thread, giving up after `timeout` or once `cancel` fires.
#[tracing::instrument(skip(fetcher, cancel), fields(timeout_ms = timeout.as_millis() as u64))]
pub fn fetch_with_timeout(
    fetcher: Arc<dyn ByteFetcher>,
    url: &str,
    timeout: Duration,
    cancel: &CancelToken,
) -> CardResult<Vec<u8>> {
    cancel.check()?;
    let owned = url.to_owned();
    match run_bounded(timeout, cancel, move || fetcher.fetch_bytes(&owned))? {
        Bounded::Done(res) => {
            let bytes = res?;
            tracing::debug!(bytes = bytes.len(), "fetched asset");
            Ok(bytes)
        }
        Bounded::TimedOut => Err(CardError::fetch(
            url,
            FetchFailure::Timeout,
            format!("no response within {} ms", timeout.as_millis()),
        )),
        Bounded::Cancelled => Err(CardError::Cancelled),
    }
}

/// `true` for `data:` references, which are decoded in place instead of fetched.
pub fn is_data_url(s: &str) -> bool {
    s.trim_start()
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

/// Decode a base64 `data:<mime>;base64,<payload>` URL into its bytes.
pub fn decode_data_url(s: &str) -> CardResult<Vec<u8>> {
    let s = s.trim();
    if !is_data_url(s) {
        return Err(CardError::decode("not a data url"));
    }
    let (header, payload) = s[5..]
        .split_once(',')
        .ok_or_else(|| CardError::decode("data url has no ',' separator"))?;
    let is_base64 = header
        .rsplit(';')
        .next()
        .is_some_and(|p| p.eq_ignore_ascii_case("base64"));
    if !is_base64 {
        return Err(CardError::decode("data url payload must be base64 encoded"));
    }
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| CardError::decode(format!("invalid base64 in data url: {e}")))
}

/// Normalize and validate a root-relative asset path.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> Result<String, String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err("asset paths must be relative".to_owned());
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err("asset paths must not contain '..'".to_owned());
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err("asset path must contain a file name".to_owned());
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
