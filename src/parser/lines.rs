use std::sync::LazyLock;

use regex::Regex;

static URL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());
static EMAIL_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static ORDINAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").unwrap());

/// Navigation menu labels of the legacy site. A line matching one of these is
/// never a heading; in the leading menu region it is dropped entirely.
pub const NAV_LABELS: &[&str] = &[
    "menu",
    "home",
    "about us",
    "about",
    "bba",
    "zakat",
    "what is zakat & nisab",
    "zakat calculator",
    "gallery",
    "image gallery",
    "video gallery",
    "our projects",
    "blogs",
    "news",
    "contact",
    "donate",
    "careers",
    "contact us",
    "privacy policy",
    "terms and conditions",
    "become volunteer",
];

/// Words that start ordinary sentences; a standalone one of these is a
/// fragment of broken prose, not a heading.
const SENTENCE_STARTERS: &[&str] = &[
    "a", "an", "and", "at", "because", "but", "by", "for", "from", "if", "in", "it", "on", "or",
    "the", "these", "this", "those", "to", "we", "when", "where", "which", "while", "who", "why",
    "you", "your",
];

/// Social icon labels the theme renders as text.
const SOCIAL_LABELS: &[&str] = &["Facebook-f", "Twitter", "Instagram", "Youtube"];

/// Form field labels and other control strings scraped off widgets.
const BOILERPLATE: &[&str] = &[
    "View More>>",
    "Your name",
    "Your Phone",
    "Your email",
    "Your message (optional)",
    "Subject",
    "Role",
    "Other",
];

/// Bank-details block labels (donation footer).
const FINANCE_PREFIXES: &[&str] = &["a/c no:", "ifsc code:", "bank name:", "branch:"];

/// Action verbs that open the site's mission bullet lists.
const ACTION_VERBS: &[&str] = &["Support", "Provide", "Spread", "Conserve", "Develop"];

const HEADING_MIN_LEN: usize = 4;
const HEADING_MAX_LEN: usize = 60;
const HEADING_MAX_WORDS: usize = 6;
const BULLET_MAX_LEN: usize = 120;

/// Per-line classification. Local only: sequence-aware decisions (menu
/// region, footer cut, duplicate collapse) live in the reconstructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    Url,
    Email,
    Bullet,
    Text,
}

pub fn classify(line: &str) -> LineKind {
    let t = line.trim();
    if URL_LINE_RE.is_match(t) {
        return LineKind::Url;
    }
    if EMAIL_LINE_RE.is_match(t) {
        return LineKind::Email;
    }
    if is_likely_heading(t) {
        return LineKind::Heading;
    }
    if is_bullet(t) {
        return LineKind::Bullet;
    }
    LineKind::Text
}

pub fn is_nav_label(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    NAV_LABELS.contains(&lower.as_str())
}

/// Unconditional junk: social icon labels, page-number artifacts, form
/// labels, bank-details lines. Copyright/footer truncation is handled by the
/// reconstructor because it cuts everything after the marker too.
pub fn is_junk(line: &str) -> bool {
    let t = line.trim();
    if SOCIAL_LABELS.contains(&t) || BOILERPLATE.contains(&t) {
        return true;
    }
    if DIGITS_RE.is_match(t) {
        return true;
    }
    let lower = t.to_lowercase();
    FINANCE_PREFIXES.iter().any(|p| lower.starts_with(p))
}

pub fn is_copyright_marker(line: &str) -> bool {
    line.to_lowercase().contains("© copyright")
}

pub fn is_quick_links_marker(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("quick links")
}

pub fn is_likely_heading(line: &str) -> bool {
    let t = line.trim();
    let len = t.chars().count();
    if !(HEADING_MIN_LEN..=HEADING_MAX_LEN).contains(&len) {
        return false;
    }
    if t.ends_with(['.', '!', '?', ',', ';', ':']) {
        return false;
    }
    let words: Vec<&str> = t.split_whitespace().collect();
    if words.is_empty() || words.len() > HEADING_MAX_WORDS {
        return false;
    }
    // Menu labels read like headings but are chrome, not content.
    if is_nav_label(t) {
        return false;
    }
    let has_letters = t.chars().any(|c| c.is_alphabetic());
    let all_caps = has_letters && t == t.to_uppercase();
    if all_caps {
        return true;
    }
    let starts_upper = t.chars().next().is_some_and(|c| c.is_uppercase());
    if words.len() == 1 {
        starts_upper && !SENTENCE_STARTERS.contains(&words[0].to_lowercase().as_str())
    } else {
        starts_upper
    }
}

pub fn is_bullet(line: &str) -> bool {
    let t = line.trim();
    if t.starts_with('-') || t.starts_with('•') {
        return true;
    }
    if ORDINAL_RE.is_match(t) {
        return true;
    }
    t.chars().count() <= BULLET_MAX_LEN
        && ACTION_VERBS.iter().any(|v| {
            t.strip_prefix(v)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(|c: char| !c.is_alphanumeric()))
        })
}

/// Strip a leading `-`/`•` marker or `1.` ordinal from a bullet line.
pub fn strip_bullet_marker(line: &str) -> String {
    let t = line.trim();
    if let Some(rest) = t.strip_prefix(['-', '•']) {
        return rest.trim_start().to_string();
    }
    if let Some(m) = ORDINAL_RE.find(t) {
        return t[m.end()..].trim_start().to_string();
    }
    t.to_string()
}
