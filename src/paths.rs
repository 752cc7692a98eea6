use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static MULTI_SLASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/{2,}").unwrap());

/// Canonical pathname form: starts with `/`, ends with `/` unless it is
/// exactly `/`, no doubled slashes. Idempotent and total.
pub fn normalize_pathname(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }
    let mut p = trimmed.to_string();
    if !p.starts_with('/') {
        p.insert(0, '/');
    }
    if p != "/" && !p.ends_with('/') {
        p.push('/');
    }
    let p = MULTI_SLASH_RE.replace_all(&p, "/").into_owned();
    p
}

/// Extract the pathname from an absolute URL, falling back to treating the
/// whole input as a path when it does not parse.
pub fn pathname_from_url(input: &str) -> String {
    match Url::parse(input.trim()) {
        Ok(u) => normalize_pathname(u.path()),
        Err(_) => normalize_pathname(input),
    }
}

/// CMS slug for a pathname: "/" becomes "home", anything else is the interior
/// path with the surrounding slashes stripped.
pub fn slug_from_pathname(pathname: &str) -> String {
    let normalized = normalize_pathname(pathname);
    if normalized == "/" {
        return "home".to_string();
    }
    normalized.trim_matches('/').to_string()
}

/// Last non-empty pathname segment converted from kebab-case to Title Case,
/// or "Home" for the root.
pub fn title_from_pathname(pathname: &str) -> String {
    let normalized = normalize_pathname(pathname);
    if normalized == "/" {
        return "Home".to_string();
    }
    let segment = normalized
        .split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .unwrap_or("");
    segment
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_becomes_root() {
        assert_eq!(normalize_pathname(""), "/");
        assert_eq!(normalize_pathname("   "), "/");
    }

    #[test]
    fn adds_leading_and_trailing_slash() {
        assert_eq!(normalize_pathname("about"), "/about/");
        assert_eq!(normalize_pathname("/about"), "/about/");
        assert_eq!(normalize_pathname("about/"), "/about/");
    }

    #[test]
    fn collapses_repeated_slashes() {
        assert_eq!(normalize_pathname("//a///b//"), "/a/b/");
    }

    #[test]
    fn idempotent() {
        for input in ["", "/", "about", "//x//y", "/blog/post-1", "weird path"] {
            let once = normalize_pathname(input);
            assert_eq!(normalize_pathname(&once), once);
        }
    }

    #[test]
    fn pathname_from_absolute_url() {
        assert_eq!(pathname_from_url("https://zcfindia.org/about-us"), "/about-us/");
        assert_eq!(pathname_from_url("https://zcfindia.org/"), "/");
        assert_eq!(pathname_from_url("not a url/x"), "/not a url/x/");
    }

    #[test]
    fn slugs() {
        assert_eq!(slug_from_pathname("/"), "home");
        assert_eq!(slug_from_pathname("/about-us/"), "about-us");
        assert_eq!(slug_from_pathname("blog/post-1"), "blog/post-1");
    }

    #[test]
    fn titles_from_path() {
        assert_eq!(title_from_pathname("/"), "Home");
        assert_eq!(title_from_pathname("/zakat-calculator/"), "Zakat Calculator");
        assert_eq!(title_from_pathname("/blog/our-projects/"), "Our Projects");
    }
}
