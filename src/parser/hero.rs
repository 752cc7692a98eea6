use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static IMAGE_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpe?g|png|webp|gif)(\?.*)?$").unwrap());

static OG_IMAGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());
static TWITTER_IMAGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="twitter:image"]"#).unwrap());
static JSON_LD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());

/// URL substrings that mark decorative/theme imagery rather than content.
const DECORATIVE_MARKERS: &[&str] = &["/demo/", "logo", "icon", "elementor", "/wp-content/plugins/"];

/// Ordered, de-duplicated hero candidates from raw page HTML: Open Graph,
/// then Twitter card, then JSON-LD image fields, then the first `<img>`.
pub fn extract_hero_candidates(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut out: Vec<String> = Vec::new();
    let mut push = |url: &str| {
        let u = url.trim();
        if !u.is_empty() && !out.iter().any(|x| x == u) {
            out.push(u.to_string());
        }
    };

    for el in doc.select(&OG_IMAGE_SEL) {
        if let Some(content) = el.value().attr("content") {
            push(content);
        }
    }
    for el in doc.select(&TWITTER_IMAGE_SEL) {
        if let Some(content) = el.value().attr("content") {
            push(content);
        }
    }
    for el in doc.select(&JSON_LD_SEL) {
        let raw: String = el.text().collect();
        let raw = raw.trim().trim_start_matches('\u{feff}');
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
            for url in json_ld_images(&value) {
                push(&url);
            }
        }
    }
    if let Some(img) = doc.select(&IMG_SEL).next() {
        if let Some(src) = img.value().attr("src") {
            push(src);
        }
    }

    out
}

/// Walk a JSON-LD document for `ImageObject.url` nodes and string-valued
/// `image` fields.
fn json_ld_images(value: &serde_json::Value) -> Vec<String> {
    let mut out = Vec::new();
    walk_json_ld(value, &mut out);
    out
}

fn walk_json_ld(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            let is_image_object = map
                .get("@type")
                .and_then(|t| t.as_str())
                .is_some_and(|t| t.eq_ignore_ascii_case("ImageObject"));
            if is_image_object {
                if let Some(url) = map.get("url").and_then(|u| u.as_str()) {
                    if url.starts_with("http") {
                        out.push(url.to_string());
                    }
                }
            }
            if let Some(img) = map.get("image") {
                if let Some(url) = img.as_str() {
                    if url.starts_with("http") {
                        out.push(url.to_string());
                    }
                }
            }
            for v in map.values() {
                walk_json_ld(v, out);
            }
        }
        serde_json::Value::Array(items) => {
            for v in items {
                walk_json_ld(v, out);
            }
        }
        _ => {}
    }
}

/// Content-image filter: must carry an image extension and none of the
/// decorative markers.
pub fn is_likely_content_image_url(url: &str) -> bool {
    if !IMAGE_EXT_RE.is_match(url) {
        return false;
    }
    let lower = url.to_lowercase();
    !DECORATIVE_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_come_in_priority_order() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://z.org/up/hero.jpg">
            <meta name="twitter:image" content="https://z.org/up/card.jpg">
            <script type="application/ld+json">
              {"@type":"ImageObject","url":"https://z.org/up/ld.jpg"}
            </script>
        </head><body><img src="https://z.org/up/first.jpg"></body></html>"#;
        let c = extract_hero_candidates(html);
        assert_eq!(
            c,
            vec![
                "https://z.org/up/hero.jpg",
                "https://z.org/up/card.jpg",
                "https://z.org/up/ld.jpg",
                "https://z.org/up/first.jpg",
            ]
        );
    }

    #[test]
    fn candidates_are_deduplicated() {
        let html = r#"<head>
            <meta property="og:image" content="https://z.org/a.jpg">
            <meta name="twitter:image" content="https://z.org/a.jpg">
        </head>"#;
        assert_eq!(extract_hero_candidates(html), vec!["https://z.org/a.jpg"]);
    }

    #[test]
    fn json_ld_image_string_field() {
        let html = r#"<script type="application/ld+json">
            {"@graph":[{"@type":"WebPage","image":"https://z.org/page.png"}]}
        </script>"#;
        assert_eq!(extract_hero_candidates(html), vec!["https://z.org/page.png"]);
    }

    #[test]
    fn first_img_is_last_resort() {
        let html = r#"<body><p>x</p><img src="/up/one.jpg"><img src="/up/two.jpg"></body>"#;
        assert_eq!(extract_hero_candidates(html), vec!["/up/one.jpg"]);
    }

    #[test]
    fn content_image_filter() {
        assert!(is_likely_content_image_url("https://z.org/up/photo.jpg"));
        assert!(is_likely_content_image_url("https://z.org/up/photo.webp?x=1"));
        assert!(!is_likely_content_image_url("https://z.org/up/site-logo.png"));
        assert!(!is_likely_content_image_url("https://z.org/demo/pic.jpg"));
        assert!(!is_likely_content_image_url("https://z.org/wp-content/plugins/x/a.png"));
        assert!(!is_likely_content_image_url("https://z.org/up/fav-icon.png"));
        assert!(!is_likely_content_image_url("https://z.org/up/clip.mp4"));
    }
}
