use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::paths;

const ROUTES_FILE: &str = "raw/routes/routes.txt";
const LIVE_PAGES_MANIFEST: &str = "raw/manifests/live_pages.json";
const HAR_BODIES_MANIFEST: &str = "raw/manifests/har_bodies.json";
const PAGES_JSONL: &str = "raw/scrapy/pages.jsonl";
const MARKDOWN_JSONL: &str = "raw/claude/markdown.jsonl";

/// One crawled page as emitted by the crawler into `pages.jsonl`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub path: String,
    #[serde(default)]
    pub kind: PageKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub published_time: Option<String>,
    #[serde(default)]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub content_html: Option<String>,
    #[serde(default)]
    pub content_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Home,
    Page,
    Post,
    Category,
    Author,
    ArchiveMonth,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PageKind {
    /// Only canonical content pages and posts are imported into the CMS.
    pub fn is_importable(self) -> bool {
        matches!(self, PageKind::Home | PageKind::Page | PageKind::Post)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageKind::Home => "home",
            PageKind::Page => "page",
            PageKind::Post => "post",
            PageKind::Category => "category",
            PageKind::Author => "author",
            PageKind::ArchiveMonth => "archive_month",
            PageKind::Unknown => "unknown",
        }
    }
}

/// Manifest entry for a live-browsed page capture.
#[derive(Debug, Clone, Deserialize)]
pub struct LivePageRecord {
    pub url: String,
    pub html_file: String,
    pub text_file: String,
    #[serde(default)]
    pub text_chars: u64,
}

/// Manifest entry mapping a captured network response to a body file.
#[derive(Debug, Clone, Deserialize)]
pub struct HarBodyRecord {
    pub url: String,
    #[serde(default)]
    pub mime: String,
    pub file: String,
}

/// Externally-converted Markdown for one page.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownRecord {
    pub path: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub markdown: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

/// The immutable crawl snapshot, loaded once per run.
///
/// Missing manifest files degrade to empty collections (pages then fall back
/// to placeholder content); malformed JSONL lines are skipped with a warning.
pub struct Snapshot {
    root: PathBuf,
    routes: Vec<String>,
    live_by_path: HashMap<String, LivePageRecord>,
    har_bodies: Vec<HarBodyRecord>,
    pages: Vec<ScrapedPage>,
    pages_by_path: HashMap<String, usize>,
    markdown_by_path: HashMap<String, MarkdownRecord>,
}

impl Snapshot {
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        let routes = load_routes(&root.join(ROUTES_FILE));
        let live_by_path = load_live_pages(&root.join(LIVE_PAGES_MANIFEST));
        let har_bodies = load_har_bodies(&root.join(HAR_BODIES_MANIFEST));
        let pages = load_jsonl::<ScrapedPage>(&root.join(PAGES_JSONL));
        let markdown = load_jsonl::<MarkdownRecord>(&root.join(MARKDOWN_JSONL));

        let mut pages_by_path = HashMap::new();
        for (i, p) in pages.iter().enumerate() {
            pages_by_path.insert(paths::normalize_pathname(&p.path), i);
        }

        // Latest record per normalized path wins, by created_at when both
        // carry one (RFC 3339 compares lexicographically), else file order.
        let mut markdown_by_path: HashMap<String, MarkdownRecord> = HashMap::new();
        for rec in markdown {
            let key = paths::normalize_pathname(&rec.path);
            match markdown_by_path.get(&key) {
                Some(existing) if existing.created_at > rec.created_at => {}
                _ => {
                    markdown_by_path.insert(key, rec);
                }
            }
        }

        Ok(Self {
            root,
            routes,
            live_by_path,
            har_bodies,
            pages,
            pages_by_path,
            markdown_by_path,
        })
    }

    /// Normalized, de-duplicated route pathnames in file order.
    pub fn routes(&self) -> &[String] {
        &self.routes
    }

    pub fn live_page(&self, pathname: &str) -> Option<&LivePageRecord> {
        self.live_by_path.get(&paths::normalize_pathname(pathname))
    }

    pub fn scraped_page(&self, pathname: &str) -> Option<&ScrapedPage> {
        self.pages_by_path
            .get(&paths::normalize_pathname(pathname))
            .map(|&i| &self.pages[i])
    }

    pub fn scraped_pages(&self) -> &[ScrapedPage] {
        &self.pages
    }

    pub fn markdown_record(&self, pathname: &str) -> Option<&MarkdownRecord> {
        self.markdown_by_path.get(&paths::normalize_pathname(pathname))
    }

    /// URL-to-file index for the asset locator.
    pub fn har_index(&self) -> HashMap<String, PathBuf> {
        self.har_bodies
            .iter()
            .map(|r| (r.url.clone(), PathBuf::from(&r.file)))
            .collect()
    }

    /// Read a snapshot file referenced by a manifest (root-relative path).
    pub fn read_text(&self, rel: &str) -> Result<String> {
        let abs = self.root.join(rel);
        fs::read_to_string(&abs).with_context(|| format!("reading {}", abs.display()))
    }

    pub fn counts(&self) -> SnapshotCounts {
        SnapshotCounts {
            routes: self.routes.len(),
            live_pages: self.live_by_path.len(),
            live_text_chars: self.live_by_path.values().map(|r| r.text_chars).sum(),
            har_bodies: self.har_bodies.len(),
            har_images: self
                .har_bodies
                .iter()
                .filter(|r| r.mime.starts_with("image/"))
                .count(),
            scraped_pages: self.pages.len(),
            markdown_records: self.markdown_by_path.len(),
        }
    }
}

pub struct SnapshotCounts {
    pub routes: usize,
    pub live_pages: usize,
    pub live_text_chars: u64,
    pub har_bodies: usize,
    pub har_images: usize,
    pub scraped_pages: usize,
    pub markdown_records: usize,
}

fn load_routes(path: &Path) -> Vec<String> {
    let Ok(txt) = fs::read_to_string(path) else {
        warn!("routes file missing: {}", path.display());
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    txt.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(paths::normalize_pathname)
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

fn load_live_pages(path: &Path) -> HashMap<String, LivePageRecord> {
    let Ok(raw) = fs::read_to_string(path) else {
        warn!("live pages manifest missing: {}", path.display());
        return HashMap::new();
    };
    let records: Vec<LivePageRecord> = match serde_json::from_str(&raw) {
        Ok(r) => r,
        Err(err) => {
            warn!("invalid live pages manifest {}: {}", path.display(), err);
            return HashMap::new();
        }
    };
    records
        .into_iter()
        .map(|r| (paths::pathname_from_url(&r.url), r))
        .collect()
}

fn load_har_bodies(path: &Path) -> Vec<HarBodyRecord> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(r) => r,
        Err(err) => {
            warn!("invalid har bodies manifest {}: {}", path.display(), err);
            Vec::new()
        }
    }
}

/// Newline-delimited JSON with per-line error recovery: a malformed line is
/// logged and skipped, the rest of the file still loads.
fn load_jsonl<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(t) {
            Ok(rec) => out.push(rec),
            Err(err) => warn!("{}:{}: skipping bad record: {}", path.display(), lineno + 1, err),
        }
    }
    out
}
