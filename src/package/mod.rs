//! Package document discovery and parsing
//!
//! Real-world EPUBs routinely ship `container.xml` and OPF files that a
//! conformant XML parser rejects (stray `&`, undeclared prefixes, truncated
//! tails). Both the locator and the parser here are pattern based and never
//! fail: the worst outcome is "nothing found".

mod container;
mod opf;

use std::collections::BTreeSet;
use std::io::{Read, Seek};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::archive::EpubArchive;

pub use container::{find_rootfile_path, locate_package_document, CONTAINER_PATH};
pub use opf::parse_package_document;

/// Resource declared in the package manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: Option<String>,
    pub properties: BTreeSet<String>,
}

impl ManifestItem {
    /// Whether any property token mentions `needle` (case-insensitive)
    pub fn has_property_containing(&self, needle: &str) -> bool {
        self.properties
            .iter()
            .any(|p| p.to_ascii_lowercase().contains(needle))
    }
}

/// Minimal, non-validating view of a package document
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDocument {
    /// Items in declaration order, duplicates included
    pub manifest_items: Vec<ManifestItem>,
    pub title: Option<String>,
    pub creators: Vec<String>,
    #[serde(skip)]
    pub raw_text: String,
}

impl PackageDocument {
    /// First item declared with `id`
    pub fn item_by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest_items.iter().find(|item| item.id == id)
    }
}

/// A parsed package document together with its archive path
#[derive(Debug, Clone)]
pub struct LocatedPackage {
    pub path: String,
    pub document: PackageDocument,
}

/// Locate, read and parse the package document
///
/// `None` means degraded mode: no container descriptor, no rootfile, or
/// a rootfile that cannot be read.
pub fn load_package<R: Read + Seek>(
    archive: &mut EpubArchive<R>,
    max_bytes: u64,
) -> Option<LocatedPackage> {
    let path = locate_package_document(archive, max_bytes)?;

    match archive.read_text(&path, max_bytes) {
        Ok(text) => Some(LocatedPackage {
            document: parse_package_document(&text),
            path,
        }),
        Err(e) => {
            tracing::warn!("Package document {} unreadable: {}", path, e);
            None
        }
    }
}

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w.:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>/=]+))"#)
        .expect("attribute pattern is valid")
});

/// Attribute pairs of a tag body, in source order
///
/// Accepts double, single and unquoted values. Values are entity-unescaped.
pub(crate) fn attributes(tag_body: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(tag_body)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
            Some((name, unescape(value.as_str())))
        })
        .collect()
}

/// First value of attribute `name` (ASCII case-insensitive)
pub(crate) fn attribute(tag_body: &str, name: &str) -> Option<String> {
    attributes(tag_body)
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Decode the predefined XML entities plus numeric references
pub(crate) fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                // Stray ampersand, keep it verbatim
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
