use std::sync::LazyLock;

use regex::Regex;

use super::lines::{self, LineKind};

static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,;:!?)\]])").unwrap());
static SPACE_AFTER_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([(\[])\s+").unwrap());

const RUN_FLUSH_LEN: usize = 450;

/// One classified line of reconstructed content, in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineToken {
    Heading(String),
    Url(String),
    Email(String),
    Text(String),
}

/// Clean raw scraped lines and re-join fragmented tokens into flowing
/// sentences. Output lines are ready for block assembly.
pub fn reconstruct(raw_lines: &[String]) -> Vec<String> {
    let cleaned = clean_lines(raw_lines);
    let repaired = repair_split_words(cleaned);
    join_fragments(repaired)
}

/// Single-pass tokenization of reconstructed lines. Lazy and one-shot: the
/// iterator borrows the lines and classifies on demand.
pub fn tokenize(lines: &[String]) -> impl Iterator<Item = LineToken> + '_ {
    lines.iter().map(|l| match lines::classify(l) {
        LineKind::Heading => LineToken::Heading(l.clone()),
        LineKind::Url => LineToken::Url(l.clone()),
        LineKind::Email => LineToken::Email(l.clone()),
        LineKind::Bullet | LineKind::Text => LineToken::Text(l.clone()),
    })
}

/// Drop junk, cut at the footer markers, collapse consecutive duplicates and
/// strip the leading navigation menu.
pub fn clean_lines(raw_lines: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut last = String::new();
    let mut in_menu = true;

    for raw in raw_lines {
        let t = raw.trim();
        if t.is_empty() {
            continue;
        }
        // Everything at or after either footer marker is boilerplate.
        if lines::is_copyright_marker(t) || lines::is_quick_links_marker(t) {
            break;
        }
        if t.eq_ignore_ascii_case(&last) {
            continue;
        }
        last = t.to_string();
        if lines::is_junk(t) {
            continue;
        }
        if lines::is_nav_label(t) {
            if in_menu {
                continue;
            }
        } else {
            in_menu = false;
        }
        out.push(t.to_string());
    }

    out
}

/// The crawler's text extraction breaks words across lines ("Z" + "akat").
/// Merge a single uppercase letter with a following lowercase-initial line.
fn repair_split_words(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut iter = lines.into_iter().peekable();

    while let Some(line) = iter.next() {
        let single_upper =
            line.chars().count() == 1 && line.chars().next().is_some_and(|c| c.is_uppercase());
        if single_upper {
            if let Some(next) = iter.peek() {
                if next.chars().next().is_some_and(|c| c.is_lowercase()) {
                    let next = iter.next().unwrap_or_default();
                    out.push(format!("{}{}", line, next));
                    continue;
                }
            }
        }
        out.push(line);
    }

    out
}

fn is_punct_fragment(s: &str) -> bool {
    !s.chars().any(|c| c.is_alphanumeric())
}

fn is_tokenish(s: &str, in_run: bool) -> bool {
    if is_punct_fragment(s) {
        return true;
    }
    let words = s.split_whitespace().count();
    let chars = s.chars().count();
    (words <= 2 && chars <= 24)
        || (words <= 3 && chars <= 32)
        || (in_run && words <= 8 && chars <= 80)
}

fn ends_sentence(s: &str) -> bool {
    s.ends_with(['.', '!', '?'])
}

/// Group runs of short fragments and join each run into one flowing line.
/// Headings, URLs, emails and bullet lines are never merged; they flush the
/// run first and pass through unchanged.
fn join_fragments(lines: Vec<String>) -> Vec<String> {
    let mut out = Vec::new();
    let mut run: Vec<String> = Vec::new();
    let mut run_len = 0usize;

    let flush = |run: &mut Vec<String>, run_len: &mut usize, out: &mut Vec<String>| {
        if !run.is_empty() {
            out.push(join_run(run));
            run.clear();
            *run_len = 0;
        }
    };

    for line in lines {
        let standalone = matches!(
            lines::classify(&line),
            LineKind::Heading | LineKind::Url | LineKind::Email | LineKind::Bullet
        );
        if !standalone && is_tokenish(&line, !run.is_empty()) {
            run_len += line.chars().count() + 1;
            run.push(line);
            if run_len > RUN_FLUSH_LEN && run.last().is_some_and(|l| ends_sentence(l)) {
                flush(&mut run, &mut run_len, &mut out);
            }
            continue;
        }
        flush(&mut run, &mut run_len, &mut out);
        out.push(line);
    }
    flush(&mut run, &mut run_len, &mut out);

    out
}

/// Join fragments with single spaces, suppressing the space around
/// punctuation and quotes, then normalize whitespace.
fn join_run(parts: &[String]) -> String {
    let mut s = String::new();
    for part in parts {
        if s.is_empty() {
            s.push_str(part);
            continue;
        }
        let next_first = part.chars().next();
        let prev_last = s.chars().next_back();
        let suppress = next_first
            .is_some_and(|c| ")]}.,;:!?'\"\u{2019}\u{201d}".contains(c))
            || prev_last.is_some_and(|c| "([{'\"\u{2018}\u{201c}".contains(c));
        if !suppress {
            s.push(' ');
        }
        s.push_str(part);
    }

    let s = MULTI_SPACE_RE.replace_all(&s, " ");
    let s = SPACE_BEFORE_PUNCT_RE.replace_all(&s, "$1");
    let s = SPACE_AFTER_OPEN_RE.replace_all(&s, "$1");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn copyright_cuts_everything_after() {
        let out = reconstruct(&owned(&[
            "Who we are",
            "We help communities.",
            "© Copyright 2024 ZCF",
            "All rights reserved",
        ]));
        assert_eq!(out, vec!["Who we are", "We help communities."]);
    }

    #[test]
    fn quick_links_cuts_everything_after() {
        let out = reconstruct(&owned(&[
            "Our work matters to many people.",
            "Quick Links",
            "Privacy Policy",
        ]));
        assert_eq!(out, vec!["Our work matters to many people."]);
    }

    #[test]
    fn consecutive_duplicates_collapse_case_insensitively() {
        let out = reconstruct(&owned(&["Who we are", "WHO WE ARE", "Real content follows here."]));
        assert_eq!(out, vec!["Who we are", "Real content follows here."]);
    }

    #[test]
    fn leading_menu_is_stripped_but_later_labels_survive() {
        let cleaned = clean_lines(&owned(&[
            "Menu",
            "Home",
            "About Us",
            "Who we are",
            "Gallery",
        ]));
        assert_eq!(cleaned, vec!["Who we are", "Gallery"]);
    }

    #[test]
    fn junk_dropped_anywhere() {
        let cleaned = clean_lines(&owned(&[
            "Our volunteers organized the relief drive.",
            "Facebook-f",
            "12",
            "View More>>",
            "A/C No: 1234567",
            "The drive reached four districts.",
        ]));
        assert_eq!(
            cleaned,
            vec![
                "Our volunteers organized the relief drive.",
                "The drive reached four districts.",
            ]
        );
    }

    #[test]
    fn split_word_repair() {
        let out = reconstruct(&owned(&["Z", "akat is a pillar."]));
        assert_eq!(out, vec!["Zakat is a pillar."]);
    }

    #[test]
    fn fragments_join_into_one_line() {
        let out = reconstruct(&owned(&["we serve", "meals daily", ",", "every week", "."]));
        assert_eq!(out, vec!["we serve meals daily, every week."]);
    }

    #[test]
    fn headings_flush_runs_and_stay_standalone() {
        let out = reconstruct(&owned(&["some short", "bits here", "Our Mission", "more text"]));
        assert_eq!(out, vec!["some short bits here", "Our Mission", "more text"]);
    }

    #[test]
    fn bullet_lines_are_never_merged_into_runs() {
        let out = reconstruct(&owned(&[
            "Our relief programs reach families across several districts.",
            "- rice kits",
            "- water tankers",
            "Donations make this possible every single month of the year.",
        ]));
        assert_eq!(
            out,
            vec![
                "Our relief programs reach families across several districts.",
                "- rice kits",
                "- water tankers",
                "Donations make this possible every single month of the year.",
            ]
        );
    }

    #[test]
    fn urls_and_emails_stay_standalone() {
        let out = reconstruct(&owned(&[
            "Reach us",
            "https://zcfindia.org/contact/",
            "info@zcfindia.org",
        ]));
        assert_eq!(
            out,
            vec!["Reach us", "https://zcfindia.org/contact/", "info@zcfindia.org"]
        );
    }

    #[test]
    fn long_runs_flush_at_sentence_ends() {
        let input: Vec<String> = (0..60).map(|_| "short words here.".to_string()).collect();
        let out = super::join_fragments(input);
        assert!(out.len() >= 2, "run should have flushed at least once: {:?}", out);
        assert!(out.iter().all(|l| l.chars().count() < 600));
    }

    #[test]
    fn join_respects_quotes_and_brackets() {
        let joined = join_run(&owned(&["He said", "\u{201c}", "thanks", "\u{201d}", "."]));
        assert_eq!(joined, "He said \u{201c}thanks\u{201d}.");
        let joined = join_run(&owned(&["relief", "(", "food", ")", "arrived"]));
        assert_eq!(joined, "relief (food) arrived");
    }

    #[test]
    fn tokenize_classifies_each_line() {
        let lines = owned(&["Our Mission", "https://zcfindia.org/", "info@zcfindia.org", "plain"]);
        let tokens: Vec<LineToken> = tokenize(&lines).collect();
        assert!(matches!(tokens[0], LineToken::Heading(_)));
        assert!(matches!(tokens[1], LineToken::Url(_)));
        assert!(matches!(tokens[2], LineToken::Email(_)));
        assert!(matches!(tokens[3], LineToken::Text(_)));
    }
}
