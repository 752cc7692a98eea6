use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::lines;
use super::reconstruct::LineToken;
use crate::paths;

static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static TRAILING_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+\S*$").unwrap());

const TITLE_MAX_LEN: usize = 90;
const DESCRIPTION_MIN_LINE: usize = 12;
const DESCRIPTION_TARGET: usize = 220;
const DESCRIPTION_MAX: usize = 160;
const DESCRIPTION_CUT: usize = 157;

/// One typed unit of a reconstructed document body, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading { text: String },
    Paragraph { text: String },
    Link { href: String, text: String },
    List { items: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Live,
    Fallback,
}

impl ContentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentSource::Live => "live",
            ContentSource::Fallback => "fallback",
        }
    }
}

/// Aggregate output for one page, computed per build from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub pathname: String,
    pub title: String,
    pub description: String,
    pub hero: Option<Hero>,
    pub blocks: Vec<ContentBlock>,
    pub source: ContentSource,
}

/// Single forward pass: bullet lines accumulate into a pending list, every
/// other token flushes it first.
pub fn build_blocks<I>(tokens: I, title: Option<&str>) -> Vec<ContentBlock>
where
    I: IntoIterator<Item = LineToken>,
{
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

    for token in tokens {
        match token {
            LineToken::Heading(text) => {
                flush(&mut pending_list, &mut blocks);
                // The page title is rendered by the shell; do not repeat it.
                if title.is_some_and(|t| t.eq_ignore_ascii_case(text.trim())) {
                    continue;
                }
                blocks.push(ContentBlock::Heading { text });
            }
            LineToken::Url(url) => {
                flush(&mut pending_list, &mut blocks);
                blocks.push(ContentBlock::Link {
                    href: url.clone(),
                    text: url,
                });
            }
            LineToken::Email(email) => {
                flush(&mut pending_list, &mut blocks);
                blocks.push(ContentBlock::Link {
                    href: format!("mailto:{}", email),
                    text: email,
                });
            }
            LineToken::Text(text) => {
                if lines::is_bullet(&text) {
                    pending_list.push(lines::strip_bullet_marker(&text));
                } else {
                    flush(&mut pending_list, &mut blocks);
                    blocks.push(ContentBlock::Paragraph { text });
                }
            }
        }
    }
    flush(&mut pending_list, &mut blocks);

    blocks
}

/// Page title: the part of the first raw line before " - " when it is short
/// enough, else derived from the pathname.
pub fn guess_title(first_line: &str, pathname: &str) -> String {
    let t = first_line.trim();
    let part = match t.split_once(" - ") {
        Some((head, _)) => head.trim(),
        None => t,
    };
    if !part.is_empty() && part.chars().count() <= TITLE_MAX_LEN {
        return part.to_string();
    }
    paths::title_from_pathname(pathname)
}

/// Meta description: concatenated non-heading lines, whitespace-collapsed and
/// truncated at a word boundary with an ellipsis.
pub fn build_description(lines_in: &[String]) -> String {
    let mut chunks: Vec<&str> = Vec::new();
    let mut total = 0usize;
    for l in lines_in {
        if lines::is_likely_heading(l) {
            continue;
        }
        if l.chars().count() < DESCRIPTION_MIN_LINE {
            continue;
        }
        total += l.chars().count() + 1;
        chunks.push(l);
        if total > DESCRIPTION_TARGET {
            break;
        }
    }
    let text = MULTI_SPACE_RE
        .replace_all(chunks.join(" ").trim(), " ")
        .into_owned();
    if text.chars().count() <= DESCRIPTION_MAX {
        return text;
    }
    let cut: String = text.chars().take(DESCRIPTION_CUT).collect();
    let cut = TRAILING_WORD_RE.replace(&cut, "").into_owned();
    format!("{}...", cut)
}
