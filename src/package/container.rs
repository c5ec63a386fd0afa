//! `META-INF/container.xml` lookup

use std::io::{Read, Seek};

use once_cell::sync::Lazy;
use regex::Regex;

use super::attribute;
use crate::archive::EpubArchive;

/// Fixed location of the container descriptor
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

// A closed <rootfile ...> tag, any namespace prefix
static ROOTFILE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:[\w.-]+:)?rootfile\b([^<>]*)>").expect("rootfile pattern is valid")
});

/// First non-empty `full-path` declared by a rootfile tag
pub fn find_rootfile_path(container_xml: &str) -> Option<String> {
    ROOTFILE_TAG
        .captures_iter(container_xml)
        .filter_map(|caps| attribute(caps.get(1)?.as_str(), "full-path"))
        .map(|path| path.trim().trim_start_matches('/').to_string())
        .find(|path| !path.is_empty())
}

/// Locate the package document path, or `None` to run degraded
pub fn locate_package_document<R: Read + Seek>(
    archive: &mut EpubArchive<R>,
    max_bytes: u64,
) -> Option<String> {
    if !archive.has_entry(CONTAINER_PATH) {
        tracing::debug!("No {} in archive", CONTAINER_PATH);
        return None;
    }

    let text = match archive.read_text(CONTAINER_PATH, max_bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", CONTAINER_PATH, e);
            return None;
        }
    };

    let path = find_rootfile_path(&text);
    if path.is_none() {
        tracing::debug!("No rootfile full-path in {}", CONTAINER_PATH);
    }
    path
}
