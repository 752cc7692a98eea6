use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use super::blocks::ContentBlock;
use super::lines;

static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Containers whose text is chrome, not content.
const CHROME_TAGS: &[&str] = &["nav", "header", "footer", "form", "script", "style", "aside"];

/// Extract ordered content blocks straight from a page's content HTML.
///
/// Walks the DOM in document order, mapping headings, paragraphs and lists
/// to blocks. The classifier's junk tables and footer markers apply to the
/// extracted text the same way they do in the plain-text pipeline.
pub fn extract_blocks(html: &str, title: Option<&str>) -> Vec<ContentBlock> {
    let doc = Html::parse_document(html);
    let mut blocks = Vec::new();

    for node in doc.root_element().descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        let tag = el.value().name();
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if in_chrome_or_list(&el) {
                    continue;
                }
                let text = element_text(&el);
                if text.is_empty() || lines::is_junk(&text) || lines::is_nav_label(&text) {
                    continue;
                }
                if is_footer_marker(&text) {
                    return blocks;
                }
                if title.is_some_and(|t| t.eq_ignore_ascii_case(&text)) {
                    continue;
                }
                blocks.push(ContentBlock::Heading { text });
            }
            "p" => {
                if in_chrome_or_list(&el) {
                    continue;
                }
                let text = element_text(&el);
                if text.is_empty() || lines::is_junk(&text) {
                    continue;
                }
                if is_footer_marker(&text) {
                    return blocks;
                }
                if let Some(link) = sole_link(&el, &text) {
                    blocks.push(link);
                } else {
                    blocks.push(ContentBlock::Paragraph { text });
                }
            }
            "ul" | "ol" => {
                if in_chrome_or_list(&el) {
                    continue;
                }
                let items: Vec<String> = el
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| c.value().name() == "li")
                    .map(|c| element_text(&c))
                    .filter(|t| !t.is_empty() && !lines::is_junk(t) && !lines::is_nav_label(t))
                    .collect();
                match items.len() {
                    0 => {}
                    1 => blocks.push(ContentBlock::Paragraph {
                        text: items.into_iter().next().unwrap_or_default(),
                    }),
                    _ => blocks.push(ContentBlock::List { items }),
                }
            }
            _ => {}
        }
    }

    blocks
}

/// A paragraph whose entire text is one anchor becomes a link block.
fn sole_link(el: &ElementRef, text: &str) -> Option<ContentBlock> {
    let anchors: Vec<ElementRef> = el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "a")
        .collect();
    if anchors.len() != 1 {
        return None;
    }
    let a = anchors[0];
    let href = a.value().attr("href")?.trim();
    let anchor_text = element_text(&a);
    if href.is_empty() || anchor_text != text {
        return None;
    }
    Some(ContentBlock::Link {
        href: href.to_string(),
        text: anchor_text,
    })
}

fn is_footer_marker(text: &str) -> bool {
    lines::is_copyright_marker(text) || lines::is_quick_links_marker(text)
}

fn in_chrome_or_list(el: &ElementRef) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|a| {
        let name = a.value().name();
        CHROME_TAGS.contains(&name) || name == "ul" || name == "ol" || name == "li"
    })
}

fn element_text(el: &ElementRef) -> String {
    let raw: String = el.text().collect();
    MULTI_SPACE_RE.replace_all(raw.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_paragraphs_and_lists_in_order() {
        let html = r#"
            <article>
              <h2>Who we are</h2>
              <p>We are a charity focused on dignity.</p>
              <ul><li>rice kits</li><li>water tankers</li></ul>
            </article>"#;
        let blocks = extract_blocks(html, None);
        assert_eq!(
            blocks,
            vec![
                ContentBlock::Heading { text: "Who we are".into() },
                ContentBlock::Paragraph {
                    text: "We are a charity focused on dignity.".into(),
                },
                ContentBlock::List {
                    items: vec!["rice kits".into(), "water tankers".into()],
                },
            ]
        );
    }

    #[test]
    fn chrome_containers_are_skipped() {
        let html = r#"
            <nav><ul><li>Home</li><li>Contact</li></ul></nav>
            <p>Real content stays in.</p>
            <footer><p>Quick Links</p></footer>"#;
        let blocks = extract_blocks(html, None);
        assert_eq!(
            blocks,
            vec![ContentBlock::Paragraph { text: "Real content stays in.".into() }]
        );
    }

    #[test]
    fn copyright_paragraph_stops_extraction() {
        let html = r#"
            <p>Body text that matters.</p>
            <p>© Copyright 2024 ZCF</p>
            <p>ignored trailer</p>"#;
        let blocks = extract_blocks(html, None);
        assert_eq!(
            blocks,
            vec![ContentBlock::Paragraph { text: "Body text that matters.".into() }]
        );
    }

    #[test]
    fn title_heading_not_duplicated() {
        let html = "<h1>About Us</h1><p>Details follow.</p>";
        let blocks = extract_blocks(html, Some("About Us"));
        assert_eq!(
            blocks,
            vec![ContentBlock::Paragraph { text: "Details follow.".into() }]
        );
    }

    #[test]
    fn sole_anchor_paragraph_becomes_link() {
        let html = r#"<p><a href="https://zcfindia.org/donate/">Donate now</a></p>"#;
        let blocks = extract_blocks(html, None);
        assert_eq!(
            blocks,
            vec![ContentBlock::Link {
                href: "https://zcfindia.org/donate/".into(),
                text: "Donate now".into(),
            }]
        );
    }

    #[test]
    fn nested_lists_are_not_emitted_twice() {
        let html = "<ul><li>outer item one</li><li>outer item two<ul><li>inner</li></ul></li></ul>";
        let blocks = extract_blocks(html, None);
        assert_eq!(blocks.len(), 1);
        assert!(matches!(&blocks[0], ContentBlock::List { items } if items.len() == 2));
    }
}
