pub mod blocks;
pub mod hero;
pub mod html;
pub mod lines;
pub mod markdown;
pub mod reconstruct;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use regex::Regex;
use tracing::{debug, warn};

use crate::assets::AssetLocator;
use crate::paths;
use crate::snapshot::Snapshot;
use blocks::{ContentBlock, ContentSource, Hero, PageContent};

static SITE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+-\s+Zakat\s*&\s*Charitable\s*Foundation\s*$").unwrap());

/// Drop the site-name suffix WordPress appends to every `<title>`.
pub fn strip_site_suffix(title: &str) -> String {
    SITE_SUFFIX_RE.replace(title, "").trim().to_string()
}

/// Memoized page content, keyed by normalized pathname. The snapshot never
/// changes during a run, so entries are built at most once.
#[derive(Default)]
pub struct ContentCache {
    inner: Mutex<HashMap<String, Arc<PageContent>>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &self,
        pathname: &str,
        build: impl FnOnce() -> PageContent,
    ) -> Arc<PageContent> {
        let key = paths::normalize_pathname(pathname);
        if let Some(hit) = self.inner.lock().ok().and_then(|c| c.get(&key).cloned()) {
            return hit;
        }
        let built = Arc::new(build());
        if let Ok(mut cache) = self.inner.lock() {
            cache.insert(key, built.clone());
        }
        built
    }
}

/// Build the structured content for one route.
///
/// Source preference: external Markdown record, then the crawler's content
/// HTML, then reconstructed plain text, then the live capture's text file.
/// A route with no usable source gets placeholder content marked `fallback`.
pub fn page_content(
    snapshot: &Snapshot,
    locator: &AssetLocator,
    cache: &ContentCache,
    pathname: &str,
) -> Arc<PageContent> {
    cache.get_or_build(pathname, || build_page_content(snapshot, locator, pathname))
}

fn build_page_content(snapshot: &Snapshot, locator: &AssetLocator, pathname: &str) -> PageContent {
    let pathname = paths::normalize_pathname(pathname);
    let scraped = snapshot.scraped_page(&pathname);

    let title = page_title(snapshot, &pathname);
    let blocks = content_blocks(snapshot, &pathname, &title);

    let Some(blocks) = blocks else {
        debug!(path = %pathname, "no usable content source, using fallback copy");
        return fallback_content(&pathname, title);
    };

    let description = scraped
        .and_then(|p| p.meta_description.as_deref())
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| blocks::build_description(&block_texts(&blocks)));

    let hero = resolve_page_hero(snapshot, locator, &pathname, scraped, &title);

    PageContent {
        pathname,
        title,
        description,
        hero,
        blocks,
        source: ContentSource::Live,
    }
}

fn page_title(snapshot: &Snapshot, pathname: &str) -> String {
    if let Some(t) = snapshot
        .scraped_page(pathname)
        .and_then(|p| p.title.as_deref())
    {
        let t = strip_site_suffix(t);
        if !t.is_empty() {
            return t;
        }
    }
    if let Some(rec) = snapshot.markdown_record(pathname) {
        let t = strip_site_suffix(&rec.title);
        if !t.is_empty() {
            return t;
        }
    }
    // Untitled crawl records: guess from the first plain-text line.
    if let Some(first) = snapshot
        .scraped_page(pathname)
        .and_then(|p| p.content_text.as_deref())
        .and_then(|t| t.lines().map(str::trim).find(|l| !l.is_empty()))
    {
        return blocks::guess_title(&strip_site_suffix(first), pathname);
    }
    paths::title_from_pathname(pathname)
}

/// Ordered block extraction across the source ladder; `None` means every
/// source was missing or produced nothing.
fn content_blocks(snapshot: &Snapshot, pathname: &str, title: &str) -> Option<Vec<ContentBlock>> {
    if let Some(rec) = snapshot.markdown_record(pathname) {
        let blocks = markdown::parse_blocks(&rec.markdown, Some(title));
        if !blocks.is_empty() {
            debug!(
                path = %pathname,
                url = %rec.url,
                model = rec.model.as_deref().unwrap_or("unknown"),
                "using external markdown record"
            );
            return Some(blocks);
        }
    }

    let scraped = snapshot.scraped_page(pathname);
    if let Some(content_html) = scraped.and_then(|p| p.content_html.as_deref()) {
        let blocks = html::extract_blocks(content_html, Some(title));
        if !blocks.is_empty() {
            return Some(blocks);
        }
    }

    if let Some(text) = scraped.and_then(|p| p.content_text.as_deref()) {
        let blocks = blocks_from_text(text, title);
        if !blocks.is_empty() {
            return Some(blocks);
        }
    }

    if let Some(live) = snapshot.live_page(pathname) {
        match snapshot.read_text(&live.text_file) {
            Ok(text) => {
                let blocks = blocks_from_text(&text, title);
                if !blocks.is_empty() {
                    return Some(blocks);
                }
            }
            Err(err) => warn!(path = %pathname, "live text unreadable: {err:#}"),
        }
    }

    None
}

fn blocks_from_text(text: &str, title: &str) -> Vec<ContentBlock> {
    let raw: Vec<String> = text.lines().map(str::to_string).collect();
    let cleaned = reconstruct::reconstruct(&raw);
    blocks::build_blocks(reconstruct::tokenize(&cleaned), Some(title))
}

fn resolve_page_hero(
    snapshot: &Snapshot,
    locator: &AssetLocator,
    pathname: &str,
    scraped: Option<&crate::snapshot::ScrapedPage>,
    title: &str,
) -> Option<Hero> {
    let mut candidates: Vec<String> = Vec::new();
    if let Some(p) = scraped {
        if let Some(primary) = p.primary_image.as_deref() {
            candidates.push(primary.to_string());
        }
        candidates.extend(p.images.iter().cloned());
    }
    if let Some(html) = live_html(snapshot, pathname) {
        for url in hero::extract_hero_candidates(&html) {
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    }

    candidates
        .into_iter()
        .filter(|u| hero::is_likely_content_image_url(u))
        .find(|u| locator.resolve(u).is_some())
        .map(|src| Hero {
            src,
            alt: title.to_string(),
        })
}

fn live_html(snapshot: &Snapshot, pathname: &str) -> Option<String> {
    let live = snapshot.live_page(pathname)?;
    snapshot.read_text(&live.html_file).ok()
}

/// Placeholder copy for routes the crawl never captured content for.
fn fallback_content(pathname: &str, title: String) -> PageContent {
    let blocks = vec![
        ContentBlock::Paragraph {
            text: format!(
                "{} is part of the Zakat & Charitable Foundation website. \
                 The original page content was not captured in the crawl snapshot.",
                title
            ),
        },
        ContentBlock::Paragraph {
            text: "This page will be updated with its full content shortly. \
                   In the meantime, please explore our projects or get in touch."
                .to_string(),
        },
    ];
    PageContent {
        pathname: pathname.to_string(),
        title,
        description: "Zakat & Charitable Foundation serves communities across India \
                      with zakat-funded relief, education and welfare programs."
            .to_string(),
        hero: None,
        blocks,
        source: ContentSource::Fallback,
    }
}

/// Every non-heading text in block order; list items join into one line so
/// the description length accounting sees them as prose.
fn block_texts(blocks: &[ContentBlock]) -> Vec<String> {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Paragraph { text } => Some(text.clone()),
            ContentBlock::Link { text, .. } => Some(text.clone()),
            ContentBlock::List { items } => Some(items.join(" ")),
            ContentBlock::Heading { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_suffix_is_stripped() {
        assert_eq!(
            strip_site_suffix("About Us - Zakat & Charitable Foundation"),
            "About Us"
        );
        assert_eq!(
            strip_site_suffix("Gallery - zakat & charitable foundation  "),
            "Gallery"
        );
        assert_eq!(strip_site_suffix("Plain Title"), "Plain Title");
    }

    #[test]
    fn cache_builds_once_per_normalized_path() {
        let cache = ContentCache::new();
        let mut builds = 0;
        for key in ["/about", "/about/", "about"] {
            cache.get_or_build(key, || {
                builds += 1;
                PageContent {
                    pathname: "/about/".into(),
                    title: "About".into(),
                    description: String::new(),
                    hero: None,
                    blocks: Vec::new(),
                    source: ContentSource::Fallback,
                }
            });
        }
        assert_eq!(builds, 1);
    }

    #[test]
    fn description_sources_include_list_items_and_links() {
        let texts = block_texts(&[
            ContentBlock::Heading { text: "Our Work".into() },
            ContentBlock::List {
                items: vec!["rice kits for families".into(), "water tankers".into()],
            },
            ContentBlock::Link {
                href: "https://zcfindia.org/donate/".into(),
                text: "donate to keep these programs running".into(),
            },
        ]);
        assert_eq!(
            texts,
            vec![
                "rice kits for families water tankers".to_string(),
                "donate to keep these programs running".to_string(),
            ]
        );
        let d = blocks::build_description(&texts);
        assert!(d.contains("rice kits"));
        assert!(d.contains("donate"));
    }

    #[test]
    fn markdown_record_wins_over_plain_text() {
        let root = std::env::temp_dir().join(format!("zcf_strategy_{}", std::process::id()));
        std::fs::create_dir_all(root.join("raw/scrapy")).unwrap();
        std::fs::create_dir_all(root.join("raw/claude")).unwrap();
        std::fs::write(
            root.join("raw/scrapy/pages.jsonl"),
            concat!(
                r#"{"url":"https://zcfindia.org/about/","path":"/about/","kind":"page","content_text":"Paragraph from plain text extraction."}"#,
                "\n",
                r#"{"url":"https://zcfindia.org/work/","path":"/work/","kind":"page","content_text":"Paragraph from plain text extraction."}"#,
                "\n",
            ),
        )
        .unwrap();
        std::fs::write(
            root.join("raw/claude/markdown.jsonl"),
            concat!(
                r###"{"path":"/about/","markdown":"## Who we are\n\nParagraph from markdown."}"###,
                "\n",
            ),
        )
        .unwrap();

        let snap = Snapshot::load(&root).unwrap();
        let locator = AssetLocator::new(&root, std::collections::HashMap::new());
        let cache = ContentCache::new();

        let about = page_content(&snap, &locator, &cache, "/about/");
        assert_eq!(about.source, ContentSource::Live);
        assert_eq!(
            about.blocks,
            vec![
                ContentBlock::Heading { text: "Who we are".into() },
                ContentBlock::Paragraph { text: "Paragraph from markdown.".into() },
            ]
        );

        // No markdown record: the plain-text route is used.
        let work = page_content(&snap, &locator, &cache, "/work/");
        assert_eq!(
            work.blocks,
            vec![ContentBlock::Paragraph {
                text: "Paragraph from plain text extraction.".into(),
            }]
        );

        // No source at all: fallback copy.
        let missing = page_content(&snap, &locator, &cache, "/missing/");
        assert_eq!(missing.source, ContentSource::Fallback);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn fallback_content_is_marked() {
        let content = fallback_content("/mystery/", "Mystery".into());
        assert_eq!(content.source, ContentSource::Fallback);
        assert_eq!(content.blocks.len(), 2);
        assert!(!content.description.is_empty());
    }
}
