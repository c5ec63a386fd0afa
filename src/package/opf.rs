//! Tolerant OPF manifest and metadata extraction

use once_cell::sync::Lazy;
use regex::Regex;

use super::{attributes, unescape, ManifestItem, PackageDocument};

// <item ...> or <opf:item ...>; `\b` keeps <itemref> out
static ITEM_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:[\w.-]+:)?item\b([^<>]*)>").expect("item pattern is valid")
});

static TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:dc:)?title\b[^<>]*>([^<]*)</(?:dc:)?title\s*>")
        .expect("title pattern is valid")
});

static CREATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:dc:)?creator\b[^<>]*>([^<]*)</(?:dc:)?creator\s*>")
        .expect("creator pattern is valid")
});

/// Parse a package document without requiring well-formed XML
pub fn parse_package_document(text: &str) -> PackageDocument {
    let manifest_items: Vec<ManifestItem> = ITEM_TAG
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|body| parse_item(body.as_str()))
        .collect();

    let title = TITLE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|t| !t.is_empty());

    let creators = CREATOR
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|c| !c.is_empty())
        .collect();

    tracing::debug!("Parsed package document: {} manifest items", manifest_items.len());

    PackageDocument {
        manifest_items,
        title,
        creators,
        raw_text: text.to_string(),
    }
}

fn parse_item(body: &str) -> ManifestItem {
    let mut item = ManifestItem {
        id: String::new(),
        href: String::new(),
        media_type: None,
        properties: Default::default(),
    };
    let (mut seen_id, mut seen_href) = (false, false);

    for (name, value) in attributes(body) {
        match name.to_ascii_lowercase().as_str() {
            "id" if !seen_id => {
                item.id = value.trim().to_string();
                seen_id = true;
            }
            "href" if !seen_href => {
                item.href = value.trim().to_string();
                seen_href = true;
            }
            "media-type" if item.media_type.is_none() => {
                item.media_type = Some(value.trim().to_string());
            }
            "properties" => {
                item.properties
                    .extend(value.split_whitespace().map(str::to_string));
            }
            _ => {}
        }
    }

    item
}

fn clean_text(raw: &str) -> String {
    unescape(raw).split_whitespace().collect::<Vec<_>>().join(" ")
}
