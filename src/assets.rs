use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

use regex::Regex;
use sha1::{Digest, Sha1};
use url::Url;

static DIMS_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\d+x\d+$").unwrap());

const HAR_BUCKET: &str = "raw/har_bodies";
const LIVE_BUCKET: &str = "raw/assets/live";

/// Maps remote asset URLs to files cached in the crawl snapshot.
///
/// Probes are read-only and infallible: any failure means "not cached", never
/// an error. Resolutions are memoized per URL because the snapshot is
/// immutable for the lifetime of a run.
pub struct AssetLocator {
    root: PathBuf,
    har_index: HashMap<String, PathBuf>,
    cache: Mutex<HashMap<String, Option<PathBuf>>>,
}

impl AssetLocator {
    /// `root` is the repository root containing the `raw/` snapshot.
    /// `har_index` maps captured URLs to snapshot-relative body files
    /// (from `har_bodies.json`); it may be empty.
    pub fn new(root: impl Into<PathBuf>, har_index: HashMap<String, PathBuf>) -> Self {
        Self {
            root: root.into(),
            har_index,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a (possibly remote) asset URL to a local snapshot file.
    /// Returns the path relative to the snapshot root, or `None` when no
    /// size/variant rewrite of the URL is cached.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        if let Some(hit) = self.cache.lock().ok().and_then(|c| c.get(url).cloned()) {
            return hit;
        }
        let resolved = self.resolve_uncached(url);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url.to_string(), resolved.clone());
        }
        resolved
    }

    fn resolve_uncached(&self, url: &str) -> Option<PathBuf> {
        for variant in variant_urls(url) {
            // (a) manifest-addressed HAR capture
            if let Some(rel) = self.har_index.get(&variant) {
                if self.root.join(rel).is_file() {
                    return Some(rel.clone());
                }
            }
            let Some(rel) = har_rel_path(&variant) else {
                continue;
            };
            let har = Path::new(HAR_BUCKET).join(&rel);
            if self.root.join(&har).is_file() {
                return Some(har);
            }
            // (b) directly-downloaded live assets
            let live = Path::new(LIVE_BUCKET).join(&rel);
            if self.root.join(&live).is_file() {
                return Some(live);
            }
        }
        None
    }
}

/// Candidate URLs to probe, in order: the URL itself, then with the
/// WordPress responsive suffixes (`-<W>x<H>`, `-scaled`) stripped from the
/// filename stem, then both.
pub fn variant_urls(url: &str) -> Vec<String> {
    let base = strip_fragment(url);
    let strip_dims =
        |u: &str| rewrite_stem(u, |stem| DIMS_SUFFIX_RE.replace(stem, "").into_owned());
    let strip_scaled = |u: &str| {
        rewrite_stem(u, |stem| {
            stem.strip_suffix("-scaled").unwrap_or(stem).to_string()
        })
    };

    let no_dims = strip_dims(&base);
    let no_scaled = strip_scaled(&base);
    let combined_a = strip_scaled(&no_dims);
    let combined_b = strip_dims(&no_scaled);

    let mut out = vec![base];
    for v in [no_dims, no_scaled, combined_a, combined_b] {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

fn strip_fragment(url: &str) -> String {
    match url.split_once('#') {
        Some((head, _)) => head.to_string(),
        None => url.to_string(),
    }
}

fn rewrite_stem(url: &str, f: impl Fn(&str) -> String) -> String {
    let (prefix, query) = match url.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (url, None),
    };
    let (dir, file) = match prefix.rfind('/') {
        Some(i) => (&prefix[..=i], &prefix[i + 1..]),
        None => ("", prefix),
    };
    let (stem, ext) = match file.rfind('.') {
        Some(i) if i > 0 => (&file[..i], &file[i..]),
        _ => (file, ""),
    };
    let mut rebuilt = format!("{}{}{}", dir, f(stem), ext);
    if let Some(q) = query {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

/// Deterministic snapshot-relative storage path for a URL, matching the
/// crawl tool: `{host}/{path}` with a trailing `index` for directories and a
/// `__q_<sha1-hex-8>` filename suffix when a query string is present.
pub fn har_rel_path(url: &str) -> Option<PathBuf> {
    let u = Url::parse(url).ok()?;
    let host = u.host_str()?.to_lowercase();
    let mut path = u.path().to_string();
    if path.is_empty() {
        path = "/".to_string();
    }
    if path.ends_with('/') {
        path.push_str("index");
    }
    let mut rel = path.trim_start_matches('/').to_string();
    if let Some(q) = u.query().filter(|q| !q.is_empty()) {
        let hash = sha1_hex8(q);
        rel = rewrite_stem(&rel, |stem| format!("{}__q_{}", stem, hash));
    }
    Some(Path::new(&host).join(rel))
}

fn sha1_hex8(input: &str) -> String {
    let digest = Sha1::digest(input.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(8);
    hex
}
