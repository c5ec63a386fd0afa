//! Href resolution and file-type sniffing
//!
//! Manifest and HTML references are relative URLs; archive entries are flat
//! slash-separated names. Everything here is string manipulation only.

use std::borrow::Cow;

use crate::config::{CoverConfig, HrefResolution};

/// Extensions treated as decodable raster images
pub const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Extensions treated as content documents that may embed a cover
pub const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

fn extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

fn has_extension(path: &str, allowed: &[&str]) -> bool {
    extension(path)
        .map(|ext| allowed.iter().any(|a| ext.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

pub fn is_raster_image(path: &str) -> bool {
    has_extension(path, RASTER_EXTENSIONS)
}

pub fn is_html(path: &str) -> bool {
    has_extension(path, HTML_EXTENSIONS)
}

/// Directory part of an archive path ("" at the archive root)
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve `href` against `base_dir` into an archive entry name
///
/// - fragments and query strings are dropped
/// - percent-encoding is decoded, backslashes become slashes
/// - a leading `/` makes the href archive-absolute
/// - `.` and `..` segments are collapsed (`..` never climbs above the root)
///
/// Returns `None` for empty references and anything with a URL scheme
/// (`data:`, `http:` ...), which can never name an archive entry.
pub fn resolve_against(base_dir: &str, href: &str) -> Option<String> {
    resolve_path(base_dir, href, true)
}

/// Every archive path `href` may name: percent-decoded first, then verbatim
///
/// Some packagers store names like `cover%20art.jpg` literally, so the raw
/// form is kept as a second candidate when it differs.
pub fn resolve_candidates(base_dir: &str, href: &str) -> Vec<String> {
    let mut candidates: Vec<String> = resolve_path(base_dir, href, true).into_iter().collect();
    if let Some(raw) = resolve_path(base_dir, href, false) {
        if !candidates.contains(&raw) {
            candidates.push(raw);
        }
    }
    candidates
}

/// First candidate for which `exists` holds, else the decoded candidate
pub fn resolve_existing<F>(base_dir: &str, href: &str, exists: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let mut candidates = resolve_candidates(base_dir, href);
    match candidates.iter().position(|p| exists(p)) {
        Some(i) => Some(candidates.swap_remove(i)),
        None => candidates.into_iter().next(),
    }
}

fn resolve_path(base_dir: &str, href: &str, decode: bool) -> Option<String> {
    let href = href.trim();
    let href = href.split(['#', '?']).next().unwrap_or(href);
    if href.is_empty() || has_scheme(href) {
        return None;
    }

    let decoded = if decode {
        urlencoding::decode(href).unwrap_or(Cow::Borrowed(href))
    } else {
        Cow::Borrowed(href)
    };
    let decoded = decoded.replace('\\', "/");

    let (base, relative) = match decoded.strip_prefix('/') {
        Some(absolute) => ("", absolute),
        None => (base_dir, decoded.as_str()),
    };

    let mut parts: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn has_scheme(href: &str) -> bool {
    match href.split_once(':') {
        Some((scheme, _)) => {
            // Single letters are Windows drive prefixes, not schemes
            scheme.len() > 1
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Resolves manifest hrefs for one package document
#[derive(Debug, Clone)]
pub struct HrefResolver {
    base_dir: String,
}

impl HrefResolver {
    pub fn new(base_dir: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into().trim_matches('/').to_string(),
        }
    }

    /// Pick the base directory for a package document at `package_path`
    pub fn for_package(package_path: &str, config: &CoverConfig) -> Self {
        match config.href_resolution {
            HrefResolution::Package => Self::new(parent_dir(package_path)),
            HrefResolution::Legacy => Self::new(config.legacy_content_dir.as_str()),
        }
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    pub fn resolve(&self, href: &str) -> Option<String> {
        resolve_against(&self.base_dir, href)
    }

    /// Like `resolve`, but falls back to the verbatim href when only that exists
    pub fn resolve_existing<F>(&self, href: &str, exists: F) -> Option<String>
    where
        F: Fn(&str) -> bool,
    {
        resolve_existing(&self.base_dir, href, exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_sniffing() {
        assert!(is_raster_image("OEBPS/images/Cover.JPG"));
        assert!(is_raster_image("a.webp"));
        assert!(!is_raster_image("images.d/cover"));
        assert!(!is_raster_image("cover.svg"));
        assert!(is_html("text/ch1.xhtml"));
        assert!(is_html("index.HTM"));
        assert!(!is_html("toc.ncx"));
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("OEBPS/content.opf"), "OEBPS");
        assert_eq!(parent_dir("a/b/c.xhtml"), "a/b");
        assert_eq!(parent_dir("content.opf"), "");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_against("OEBPS", "images/cover.jpg").as_deref(),
            Some("OEBPS/images/cover.jpg")
        );
        assert_eq!(resolve_against("", "cover.jpg").as_deref(), Some("cover.jpg"));
        assert_eq!(
            resolve_against("OEBPS/Text", "../Images/cover.jpg").as_deref(),
            Some("OEBPS/Images/cover.jpg")
        );
        assert_eq!(
            resolve_against("OEBPS", "./img/a%20b.png#frag").as_deref(),
            Some("OEBPS/img/a b.png")
        );
    }

    #[test]
    fn test_resolve_absolute_and_invalid() {
        assert_eq!(
            resolve_against("OEBPS/Text", "/images/cover.jpg").as_deref(),
            Some("images/cover.jpg")
        );
        assert_eq!(resolve_against("OEBPS", "../../../x.png").as_deref(), Some("x.png"));
        assert_eq!(resolve_against("OEBPS", ""), None);
        assert_eq!(resolve_against("OEBPS", "data:image/png;base64,AAAA"), None);
        assert_eq!(resolve_against("OEBPS", "https://example.com/c.jpg"), None);
    }

    #[test]
    fn test_raw_href_is_a_fallback_candidate() {
        assert_eq!(
            resolve_candidates("OEBPS", "cover%20art.jpg"),
            vec!["OEBPS/cover art.jpg".to_string(), "OEBPS/cover%20art.jpg".to_string()]
        );
        assert_eq!(resolve_candidates("OEBPS", "cover.jpg"), vec!["OEBPS/cover.jpg".to_string()]);

        let literal = |p: &str| p == "OEBPS/cover%20art.jpg";
        assert_eq!(
            resolve_existing("OEBPS", "cover%20art.jpg", literal).as_deref(),
            Some("OEBPS/cover%20art.jpg")
        );
        // Both exist: the decoded name wins
        let both = |p: &str| p.starts_with("OEBPS/cover");
        assert_eq!(
            resolve_existing("OEBPS", "cover%20art.jpg", both).as_deref(),
            Some("OEBPS/cover art.jpg")
        );
        assert_eq!(
            resolve_existing("OEBPS", "cover%20art.jpg", |_| false).as_deref(),
            Some("OEBPS/cover art.jpg")
        );
    }

    #[test]
    fn test_resolver_rules() {
        let package = CoverConfig::default();
        let legacy = CoverConfig::default().with_href_resolution(HrefResolution::Legacy);

        let resolver = HrefResolver::for_package("content/book.opf", &package);
        assert_eq!(resolver.resolve("img/c.png").as_deref(), Some("content/img/c.png"));

        let resolver = HrefResolver::for_package("content/book.opf", &legacy);
        assert_eq!(resolver.resolve("img/c.png").as_deref(), Some("OEBPS/img/c.png"));

        let resolver = HrefResolver::for_package("book.opf", &package);
        assert_eq!(resolver.base_dir(), "");
        assert_eq!(resolver.resolve("img/c.png").as_deref(), Some("img/c.png"));
    }
}
