//! Image references embedded in XHTML content documents

use once_cell::sync::Lazy;
use regex::Regex;

use crate::package::attribute;

// <img ...> and SVG <image ...>, in document order
static IMAGE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:[\w.-]+:)?(img|image)\b([^<>]*)>").expect("image tag pattern is valid")
});

/// First image reference in document order
///
/// Covers `<img src>` as well as SVG wrappers (`<image xlink:href>` or
/// `<image href>`), which many generated title pages use.
pub fn first_image_reference(html: &str) -> Option<String> {
    image_references(html).next()
}

pub fn image_references(html: &str) -> impl Iterator<Item = String> + '_ {
    IMAGE_TAG.captures_iter(html).filter_map(|caps| {
        let tag = caps.get(1)?.as_str();
        let body = caps.get(2)?.as_str();
        let reference = if tag.eq_ignore_ascii_case("img") {
            attribute(body, "src")
        } else {
            attribute(body, "xlink:href").or_else(|| attribute(body, "href"))
        };
        reference.filter(|r| !r.trim().is_empty())
    })
}
