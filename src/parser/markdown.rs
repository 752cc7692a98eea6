use std::sync::LazyLock;

use regex::Regex;

use super::blocks::ContentBlock;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());
static SINGLE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]\(([^)]+)\)$").unwrap());
static INLINE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([-*•]|\d+\.)\s+(.*)$").unwrap());
static EMPHASIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\*{1,3}|_{1,3})").unwrap());
static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());

/// Parse externally-converted Markdown (one record per page, produced by an
/// out-of-process AI step) into ordered content blocks.
pub fn parse_blocks(markdown: &str, title: Option<&str>) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut pending_list: Vec<String> = Vec::new();

    let flush = |pending: &mut Vec<String>, blocks: &mut Vec<ContentBlock>| {
        match pending.len() {
            0 => {}
            1 => blocks.push(ContentBlock::Paragraph {
                text: pending.remove(0),
            }),
            _ => blocks.push(ContentBlock::List {
                items: std::mem::take(pending),
            }),
        }
        pending.clear();
    };

    for raw in markdown.lines() {
        let line = raw.trim();
        if line.is_empty() {
            flush(&mut pending_list, &mut blocks);
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            flush(&mut pending_list, &mut blocks);
            let text = plain_text(&caps[2]);
            if text.is_empty() || title.is_some_and(|t| t.eq_ignore_ascii_case(&text)) {
                continue;
            }
            blocks.push(ContentBlock::Heading { text });
            continue;
        }

        if let Some(caps) = BULLET_RE.captures(line) {
            let item = plain_text(&caps[2]);
            if !item.is_empty() {
                pending_list.push(item);
            }
            continue;
        }

        if let Some(caps) = SINGLE_LINK_RE.captures(line) {
            flush(&mut pending_list, &mut blocks);
            blocks.push(ContentBlock::Link {
                href: caps[2].trim().to_string(),
                text: plain_text(&caps[1]),
            });
            continue;
        }

        if BARE_URL_RE.is_match(line) {
            flush(&mut pending_list, &mut blocks);
            blocks.push(ContentBlock::Link {
                href: line.to_string(),
                text: line.to_string(),
            });
            continue;
        }

        flush(&mut pending_list, &mut blocks);
        blocks.push(ContentBlock::Paragraph {
            text: plain_text(line),
        });
    }
    flush(&mut pending_list, &mut blocks);

    blocks
}

/// Reduce inline Markdown to plain text: links keep their display text,
/// emphasis markers are dropped.
fn plain_text(s: &str) -> String {
    let no_links = INLINE_LINK_RE.replace_all(s, "$1");
    EMPHASIS_RE.replace_all(&no_links, "").trim().to_string()
}
