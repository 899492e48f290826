//! Near-duplicate filtering for destination image URLs.
//!
//! CDNs serve one photo under many names (`tower-800x600.jpg`,
//! `tower_1024x768.jpg`, `tower-2.jpg`). URLs are compared by a signature of
//! host plus normalized file name instead of by exact string.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

pub const DEFAULT_TARGET: usize = 5;

/// Generic travel photos appended, in this order, when too few unique images remain.
pub const FALLBACK_IMAGES: &[&str] = &[
    "https://images.unsplash.com/photo-1488646953014-85cb44e25828?w=1200",
    "https://images.unsplash.com/photo-1469854523086-cc02fe5d8800?w=1200",
    "https://images.unsplash.com/photo-1476514525535-07fb3b4ae5f1?w=1200",
    "https://images.unsplash.com/photo-1501785888041-af3ef285b470?w=1200",
    "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?w=1200",
    "https://images.unsplash.com/photo-1530789253388-582c481c54b0?w=1200",
];

/// `host:normalized-file-name` for an http(s) URL, `None` for anything unparsable.
pub fn signature(raw: &str) -> Option<String> {
    static DIMENSIONS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[-_]\d+x\d+$").expect("valid regex"));
    static NUMERIC_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"-\d+$").expect("valid regex"));

    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();

    let file = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_lowercase();
    let mut base = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file,
    };

    loop {
        let stripped = NUMERIC_RE
            .replace(&DIMENSIONS_RE.replace(&base, ""), "")
            .into_owned();
        if stripped == base {
            break;
        }
        base = stripped;
    }

    Some(format!("{host}:{base}"))
}

#[derive(Debug, Clone)]
pub struct ImageDeduplicator {
    fallback: Vec<String>,
}

impl Default for ImageDeduplicator {
    fn default() -> Self {
        Self::new(FALLBACK_IMAGES.iter().map(|s| s.to_string()).collect())
    }
}

impl ImageDeduplicator {
    pub fn new(fallback: Vec<String>) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    /// Keep first-seen URLs with distinct signatures, up to `target`, then
    /// backfill from the fallback list.
    pub fn dedupe(&self, urls: &[String], target: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(target);

        for url in urls {
            if kept.len() >= target {
                break;
            }
            match signature(url) {
                Some(sig) => {
                    if seen.contains(&sig) {
                        debug!(%url, %sig, "dropping near-duplicate image");
                    } else {
                        seen.insert(sig);
                        kept.push(url.trim().to_string());
                    }
                }
                None => debug!(%url, "dropping unparsable image url"),
            }
        }

        let unique = kept.len();
        for url in &self.fallback {
            if kept.len() >= target {
                break;
            }
            if let Some(sig) = signature(url) {
                if seen.insert(sig) {
                    kept.push(url.clone());
                }
            }
        }
        if kept.len() > unique {
            debug!(unique, backfilled = kept.len() - unique, "backfilled images");
        }

        kept
    }
}
