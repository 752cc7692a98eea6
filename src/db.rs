use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::parser::blocks::{ContentBlock, ContentSource, Hero, PageContent};

const DB_REL_PATH: &str = "data/cms.sqlite";

pub fn connect(root: &Path) -> Result<Connection> {
    let db_path = root.join(DB_REL_PATH);
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let conn = Connection::open(&db_path)
        .with_context(|| format!("opening {}", db_path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS media (
            id         INTEGER PRIMARY KEY,
            source_url TEXT UNIQUE NOT NULL,
            local_path TEXT NOT NULL,
            alt        TEXT,
            mime       TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS pages (
            id               INTEGER PRIMARY KEY,
            path             TEXT UNIQUE NOT NULL,
            title            TEXT NOT NULL,
            hero_media_id    INTEGER REFERENCES media(id),
            content          TEXT NOT NULL,
            meta_title       TEXT,
            meta_description TEXT,
            updated_at       TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS posts (
            id                INTEGER PRIMARY KEY,
            slug              TEXT UNIQUE NOT NULL,
            title             TEXT NOT NULL,
            published_at      TEXT,
            featured_media_id INTEGER REFERENCES media(id),
            excerpt           TEXT,
            content           TEXT NOT NULL,
            meta_title        TEXT,
            meta_description  TEXT,
            updated_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Intermediate structured content, one row per route.
        CREATE TABLE IF NOT EXISTS page_content (
            pathname    TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT NOT NULL,
            hero_src    TEXT,
            hero_alt    TEXT,
            blocks      TEXT NOT NULL,
            source      TEXT NOT NULL CHECK(source IN ('live','fallback')),
            built_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_content_source ON page_content(source);
        ",
    )?;
    Ok(())
}

// ── Media ──

pub struct MediaRow {
    pub source_url: String,
    pub local_path: String,
    pub alt: Option<String>,
    pub mime: Option<String>,
}

/// Idempotent by source URL: a re-import updates the file path and returns
/// the existing row id.
pub fn upsert_media(conn: &Connection, row: &MediaRow) -> Result<i64> {
    let id = conn.query_row(
        "INSERT INTO media (source_url, local_path, alt, mime)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(source_url) DO UPDATE SET
             local_path = excluded.local_path,
             alt        = COALESCE(excluded.alt, media.alt),
             mime       = COALESCE(excluded.mime, media.mime)
         RETURNING id",
        rusqlite::params![row.source_url, row.local_path, row.alt, row.mime],
        |r| r.get(0),
    )?;
    Ok(id)
}

// ── Pages and posts ──

pub struct PageRow {
    pub path: String,
    pub title: String,
    pub hero_media_id: Option<i64>,
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

pub fn upsert_page(conn: &Connection, row: &PageRow) -> Result<i64> {
    let id = conn.query_row(
        "INSERT INTO pages (path, title, hero_media_id, content, meta_title, meta_description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(path) DO UPDATE SET
             title            = excluded.title,
             hero_media_id    = excluded.hero_media_id,
             content          = excluded.content,
             meta_title       = excluded.meta_title,
             meta_description = excluded.meta_description,
             updated_at       = datetime('now')
         RETURNING id",
        rusqlite::params![
            row.path,
            row.title,
            row.hero_media_id,
            row.content,
            row.meta_title,
            row.meta_description,
        ],
        |r| r.get(0),
    )?;
    Ok(id)
}

pub struct PostRow {
    pub slug: String,
    pub title: String,
    pub published_at: Option<String>,
    pub featured_media_id: Option<i64>,
    pub excerpt: Option<String>,
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

pub fn upsert_post(conn: &Connection, row: &PostRow) -> Result<i64> {
    let id = conn.query_row(
        "INSERT INTO posts
            (slug, title, published_at, featured_media_id, excerpt, content,
             meta_title, meta_description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(slug) DO UPDATE SET
             title             = excluded.title,
             published_at      = excluded.published_at,
             featured_media_id = excluded.featured_media_id,
             excerpt           = excluded.excerpt,
             content           = excluded.content,
             meta_title        = excluded.meta_title,
             meta_description  = excluded.meta_description,
             updated_at        = datetime('now')
         RETURNING id",
        rusqlite::params![
            row.slug,
            row.title,
            row.published_at,
            row.featured_media_id,
            row.excerpt,
            row.content,
            row.meta_title,
            row.meta_description,
        ],
        |r| r.get(0),
    )?;
    Ok(id)
}

// ── Page content ──

pub fn save_page_content(conn: &Connection, contents: &[PageContent]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO page_content
             (pathname, title, description, hero_src, hero_alt, blocks, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for c in contents {
            let blocks = serde_json::to_string(&c.blocks)?;
            stmt.execute(rusqlite::params![
                c.pathname,
                c.title,
                c.description,
                c.hero.as_ref().map(|h| h.src.as_str()),
                c.hero.as_ref().map(|h| h.alt.as_str()),
                blocks,
                c.source.as_str(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn fetch_page_content(conn: &Connection, pathname: &str) -> Result<Option<PageContent>> {
    let row = conn
        .query_row(
            "SELECT pathname, title, description, hero_src, hero_alt, blocks, source
             FROM page_content WHERE pathname = ?1",
            [pathname],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, Option<String>>(3)?,
                    r.get::<_, Option<String>>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((pathname, title, description, hero_src, hero_alt, blocks, source)) = row else {
        return Ok(None);
    };
    let blocks: Vec<ContentBlock> = serde_json::from_str(&blocks)?;
    let hero = hero_src.map(|src| Hero {
        src,
        alt: hero_alt.unwrap_or_default(),
    });
    let source = match source.as_str() {
        "fallback" => ContentSource::Fallback,
        _ => ContentSource::Live,
    };
    Ok(Some(PageContent {
        pathname,
        title,
        description,
        hero,
        blocks,
        source,
    }))
}

// ── Stats ──

pub struct Stats {
    pub page_content: usize,
    pub fallback: usize,
    pub pages: usize,
    pub posts: usize,
    pub media: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let page_content: usize =
        conn.query_row("SELECT COUNT(*) FROM page_content", [], |r| r.get(0))?;
    let fallback: usize = conn.query_row(
        "SELECT COUNT(*) FROM page_content WHERE source = 'fallback'",
        [],
        |r| r.get(0),
    )?;
    let pages: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let posts: usize = conn.query_row("SELECT COUNT(*) FROM posts", [], |r| r.get(0))?;
    let media: usize = conn.query_row("SELECT COUNT(*) FROM media", [], |r| r.get(0))?;
    Ok(Stats {
        page_content,
        fallback,
        pages,
        posts,
        media,
    })
}
