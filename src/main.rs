mod assets;
mod db;
mod parser;
mod paths;
mod richtext;
mod snapshot;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use parser::blocks::{ContentSource, PageContent};
use snapshot::PageKind;

#[derive(Parser)]
#[command(name = "zcf_importer", about = "ZCF site snapshot → CMS importer")]
struct Cli {
    /// Repository root containing the raw/ snapshot and data/ output
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the SQLite schema
    Init,
    /// Build structured page content for every route
    Build {
        /// Max routes to build (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Import pages, posts and media into the CMS tables
    Import {
        /// Max pages to import (default: all importable)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print the structured content for one route
    Show {
        /// Route pathname, e.g. /about/
        path: String,
    },
    /// Snapshot and database statistics
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&cli.root)?;
            db::init_schema(&conn)?;
            println!("Schema ready at {}/data/cms.sqlite", cli.root.display());
            Ok(())
        }
        Commands::Build { limit } => cmd_build(&cli.root, limit),
        Commands::Import { limit } => cmd_import(&cli.root, limit),
        Commands::Show { path } => cmd_show(&cli.root, &path),
        Commands::Stats => cmd_stats(&cli.root),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

// ── Build ──

fn cmd_build(root: &PathBuf, limit: Option<usize>) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let conn = db::connect(root)?;
    db::init_schema(&conn)?;

    let snap = snapshot::Snapshot::load(root)?;
    let locator = assets::AssetLocator::new(root, snap.har_index());
    let cache = parser::ContentCache::new();

    let routes: Vec<&String> = match limit {
        Some(n) => snap.routes().iter().take(n).collect(),
        None => snap.routes().iter().collect(),
    };
    if routes.is_empty() {
        println!("No routes in snapshot. Expected raw/routes/routes.txt.");
        return Ok(());
    }
    println!("Building content for {} routes...", routes.len());

    let pb = ProgressBar::new(routes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut live = 0usize;
    let mut fallback = 0usize;
    for chunk in routes.chunks(500) {
        let contents: Vec<PageContent> = chunk
            .par_iter()
            .map(|route| (*parser::page_content(&snap, &locator, &cache, route)).clone())
            .collect();
        for c in &contents {
            match c.source {
                ContentSource::Live => live += 1,
                ContentSource::Fallback => fallback += 1,
            }
        }
        db::save_page_content(&conn, &contents)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    println!("Saved {} routes ({} live, {} fallback).", live + fallback, live, fallback);
    Ok(())
}

// ── Import ──

fn cmd_import(root: &PathBuf, limit: Option<usize>) -> Result<()> {
    let conn = db::connect(root)?;
    db::init_schema(&conn)?;

    let snap = snapshot::Snapshot::load(root)?;
    let locator = assets::AssetLocator::new(root, snap.har_index());
    let cache = parser::ContentCache::new();

    let importable: Vec<&snapshot::ScrapedPage> = snap
        .scraped_pages()
        .iter()
        .filter(|p| p.kind.is_importable())
        .collect();
    let importable = match limit {
        Some(n) => importable.into_iter().take(n).collect::<Vec<_>>(),
        None => importable,
    };
    if importable.is_empty() {
        println!("No importable pages in snapshot.");
        return Ok(());
    }
    println!("Importing {} pages...", importable.len());

    let mut pages = 0usize;
    let mut posts = 0usize;
    let mut media = 0usize;
    for page in importable {
        match import_one(&conn, &snap, &locator, &cache, page) {
            Ok(outcome) => {
                match page.kind {
                    PageKind::Post => posts += 1,
                    _ => pages += 1,
                }
                media += outcome.media as usize;
            }
            Err(err) => {
                // One bad record aborts the run so partial imports are obvious.
                error!(
                    kind = page.kind.as_str(),
                    path = %page.path,
                    url = %page.url,
                    title = page.title.as_deref().unwrap_or(""),
                    "import failed: {err:#}"
                );
                return Err(err);
            }
        }
    }

    println!("Imported {} pages, {} posts, {} media.", pages, posts, media);
    Ok(())
}

struct ImportOutcome {
    media: bool,
}

fn import_one(
    conn: &rusqlite::Connection,
    snap: &snapshot::Snapshot,
    locator: &assets::AssetLocator,
    cache: &parser::ContentCache,
    page: &snapshot::ScrapedPage,
) -> Result<ImportOutcome> {
    let content = parser::page_content(snap, locator, cache, &page.path);

    let media_id = match &content.hero {
        Some(hero) => {
            let local = locator
                .resolve(&hero.src)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            let id = db::upsert_media(
                conn,
                &db::MediaRow {
                    source_url: hero.src.clone(),
                    local_path: local,
                    alt: Some(hero.alt.clone()),
                    mime: Some(mime_for_url(&hero.src).to_string()),
                },
            )?;
            Some(id)
        }
        None => None,
    };

    let doc = richtext::document_from_blocks(&content.blocks);
    let meta_description = Some(content.description.clone()).filter(|d| !d.is_empty());

    match page.kind {
        PageKind::Post => {
            let mut doc = doc;
            if let Some(id) = media_id {
                richtext::prepend_media(&mut doc, id);
            }
            db::upsert_post(
                conn,
                &db::PostRow {
                    slug: paths::slug_from_pathname(&content.pathname),
                    title: content.title.clone(),
                    published_at: valid_timestamp(page.published_time.as_deref())
                        .or_else(|| valid_timestamp(page.modified_time.as_deref())),
                    featured_media_id: media_id,
                    excerpt: meta_description.clone(),
                    content: serde_json::to_string(&doc)?,
                    meta_title: Some(content.title.clone()),
                    meta_description,
                },
            )?;
        }
        _ => {
            db::upsert_page(
                conn,
                &db::PageRow {
                    path: content.pathname.clone(),
                    title: content.title.clone(),
                    hero_media_id: media_id,
                    content: serde_json::to_string(&doc)?,
                    meta_title: Some(content.title.clone()),
                    meta_description,
                },
            )?;
        }
    }

    info!(
        kind = page.kind.as_str(),
        path = %content.pathname,
        source = content.source.as_str(),
        "imported"
    );
    Ok(ImportOutcome {
        media: media_id.is_some(),
    })
}

/// Accept only parseable RFC 3339 timestamps from the crawl metadata.
fn valid_timestamp(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|_| raw.to_string())
}

fn mime_for_url(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    match path.rsplit('.').next().unwrap_or("") {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

// ── Show ──

fn cmd_show(root: &PathBuf, path: &str) -> Result<()> {
    let conn = db::connect(root)?;
    db::init_schema(&conn)?;

    let pathname = paths::normalize_pathname(path);
    let Some(content) = db::fetch_page_content(&conn, &pathname)? else {
        println!("No content for {} (run 'build' first).", pathname);
        return Ok(());
    };

    println!("{}  [{}]", content.pathname, content.source.as_str());
    println!("Title:       {}", content.title);
    println!("Description: {}", content.description);
    if let Some(hero) = &content.hero {
        println!("Hero:        {}", hero.src);
    }
    println!();
    for block in &content.blocks {
        match block {
            parser::blocks::ContentBlock::Heading { text } => println!("## {}", text),
            parser::blocks::ContentBlock::Paragraph { text } => println!("{}", text),
            parser::blocks::ContentBlock::Link { href, text } => {
                println!("[{}]({})", text, href)
            }
            parser::blocks::ContentBlock::List { items } => {
                for item in items {
                    println!("  - {}", item);
                }
            }
        }
        println!();
    }
    Ok(())
}

// ── Stats ──

fn cmd_stats(root: &PathBuf) -> Result<()> {
    let snap = snapshot::Snapshot::load(root)?;
    let counts = snap.counts();
    println!("Snapshot:");
    println!("  Routes:       {}", counts.routes);
    println!(
        "  Live pages:   {} ({} text chars)",
        counts.live_pages, counts.live_text_chars
    );
    println!(
        "  HAR bodies:   {} ({} images)",
        counts.har_bodies, counts.har_images
    );
    println!("  Scraped:      {}", counts.scraped_pages);
    println!("  Markdown:     {}", counts.markdown_records);

    let conn = db::connect(root)?;
    db::init_schema(&conn)?;
    let s = db::get_stats(&conn)?;
    println!("Database:");
    println!("  Content rows: {} ({} fallback)", s.page_content, s.fallback);
    println!("  Pages:        {}", s.pages);
    println!("  Posts:        {}", s.posts);
    println!("  Media:        {}", s.media);
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_validated() {
        assert_eq!(
            valid_timestamp(Some("2023-05-01T10:00:00+05:30")),
            Some("2023-05-01T10:00:00+05:30".to_string())
        );
        assert_eq!(valid_timestamp(Some("yesterday")), None);
        assert_eq!(valid_timestamp(Some("")), None);
        assert_eq!(valid_timestamp(None), None);
    }

    #[test]
    fn mime_guessing_by_extension() {
        assert_eq!(mime_for_url("https://z.org/a.JPG"), "image/jpeg");
        assert_eq!(mime_for_url("https://z.org/a.webp?x=1"), "image/webp");
        assert_eq!(mime_for_url("https://z.org/a.pdf"), "application/pdf");
        assert_eq!(mime_for_url("https://z.org/a.bin"), "application/octet-stream");
    }
}
