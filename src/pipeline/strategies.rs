//! The individual detection strategies
//!
//! Each returns `None` when it has nothing decodable to offer; that is an
//! ordinary outcome and the pipeline moves on to the next one.

use std::io::{Read, Seek};

use super::{CoverCandidate, DetectionMethod, Manifest, Probe};
use crate::decode::ImageDecoder;
use crate::href::{is_html, is_raster_image, parent_dir, resolve_existing};
use crate::html::first_image_reference;
use crate::scorer;

type Hit<I> = Option<(String, I)>;

/// Root-level names probed by `CommonCoverNames`, in probe order
const COMMON_STEMS: &[&str] = &["cover", "Cover", "COVER", "front", "Front", "title", "Title"];
const COMMON_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg", "gif", "bmp"];

pub(super) fn detect<R: Read + Seek, D: ImageDecoder>(
    method: DetectionMethod,
    probe: &mut Probe<'_, R, D>,
    manifest: Option<&Manifest<'_>>,
) -> Hit<D::Image> {
    match (method, manifest) {
        (DetectionMethod::MetadataCoverId, Some(m)) => by_cover_id(probe, m),
        (DetectionMethod::MetadataCoverProperties, Some(m)) => by_cover_property(probe, m),
        (DetectionMethod::CommonCoverNames, Some(_)) => by_common_name(probe),
        (DetectionMethod::FirstImageFile, Some(m)) => by_first_image(probe, m),
        (DetectionMethod::LargestImageFile, Some(m)) => by_largest_image(probe, m),
        (DetectionMethod::ImageInHtml, Some(m)) => by_html_image(probe, m),
        (DetectionMethod::FuzzySearch, _) => by_fuzzy_search(probe),
        _ => None,
    }
}

fn accept_href<R: Read + Seek, D: ImageDecoder>(
    probe: &mut Probe<'_, R, D>,
    manifest: &Manifest<'_>,
    href: &str,
    method: DetectionMethod,
) -> Hit<D::Image> {
    let path = manifest
        .resolver
        .resolve_existing(href, |p| probe.archive.has_entry(p))?;
    probe.accept(CoverCandidate::new(path, method))
}

fn by_cover_id<R: Read + Seek, D: ImageDecoder>(
    probe: &mut Probe<'_, R, D>,
    manifest: &Manifest<'_>,
) -> Hit<D::Image> {
    let item = manifest.document.item_by_id("cover")?;
    accept_href(probe, manifest, &item.href, DetectionMethod::MetadataCoverId)
}

fn by_cover_property<R: Read + Seek, D: ImageDecoder>(
    probe: &mut Probe<'_, R, D>,
    manifest: &Manifest<'_>,
) -> Hit<D::Image> {
    let item = manifest
        .document
        .manifest_items
        .iter()
        .find(|item| item.has_property_containing("cover"))?;
    accept_href(probe, manifest, &item.href, DetectionMethod::MetadataCoverProperties)
}

fn by_common_name<R: Read + Seek, D: ImageDecoder>(probe: &mut Probe<'_, R, D>) -> Hit<D::Image> {
    for stem in COMMON_STEMS {
        for ext in COMMON_EXTENSIONS {
            let name = format!("{}.{}", stem, ext);
            if !probe.archive.has_entry(&name) {
                continue;
            }
            if let Some(hit) = probe.accept(CoverCandidate::new(name, DetectionMethod::CommonCoverNames)) {
                return Some(hit);
            }
        }
    }
    None
}

fn by_first_image<R: Read + Seek, D: ImageDecoder>(
    probe: &mut Probe<'_, R, D>,
    manifest: &Manifest<'_>,
) -> Hit<D::Image> {
    let item = manifest
        .document
        .manifest_items
        .iter()
        .find(|item| is_raster_image(&item.href))?;
    accept_href(probe, manifest, &item.href, DetectionMethod::FirstImageFile)
}

fn by_largest_image<R: Read + Seek, D: ImageDecoder>(
    probe: &mut Probe<'_, R, D>,
    manifest: &Manifest<'_>,
) -> Hit<D::Image> {
    let mut largest: Option<(String, u64)> = None;

    for item in &manifest.document.manifest_items {
        if !is_raster_image(&item.href) {
            continue;
        }
        let Some(path) = manifest
            .resolver
            .resolve_existing(&item.href, |p| probe.archive.has_entry(p))
        else {
            continue;
        };
        let Some(size) = probe.archive.compressed_size_of(&path) else {
            continue;
        };
        // Strictly greater: on equal sizes the earlier manifest item stays
        if largest.as_ref().map_or(true, |(_, best)| size > *best) {
            largest = Some((path, size));
        }
    }

    let (path, size) = largest?;
    tracing::debug!("Largest manifest image: {} ({} bytes compressed)", path, size);
    probe.accept(CoverCandidate::new(path, DetectionMethod::LargestImageFile))
}

fn by_html_image<R: Read + Seek, D: ImageDecoder>(
    probe: &mut Probe<'_, R, D>,
    manifest: &Manifest<'_>,
) -> Hit<D::Image> {
    let limit = probe.config().max_entry_bytes;

    for item in &manifest.document.manifest_items {
        if !is_html(&item.href) {
            continue;
        }
        let Some(html_path) = manifest
            .resolver
            .resolve_existing(&item.href, |p| probe.archive.has_entry(p))
        else {
            continue;
        };
        if !probe.archive.has_entry(&html_path) {
            continue;
        }

        let html = match probe.archive.read_text(&html_path, limit) {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!("Skipping content document {}: {}", html_path, e);
                continue;
            }
        };

        // References are relative to the content document, not the package
        let Some(image_path) = first_image_reference(&html).and_then(|src| {
            resolve_existing(parent_dir(&html_path), &src, |p| probe.archive.has_entry(p))
        }) else {
            continue;
        };

        if let Some(hit) = probe.accept(CoverCandidate::new(image_path, DetectionMethod::ImageInHtml)) {
            return Some(hit);
        }
    }

    None
}

fn by_fuzzy_search<R: Read + Seek, D: ImageDecoder>(probe: &mut Probe<'_, R, D>) -> Hit<D::Image> {
    let limit = probe.config().fuzzy_candidates;
    let ranked: Vec<String> = scorer::rank(probe.archive.list_entries().filter(|p| is_raster_image(p)))
        .into_iter()
        .take(limit)
        .map(str::to_string)
        .collect();

    tracing::debug!("Fuzzy search candidates: {:?}", ranked);

    ranked
        .into_iter()
        .find_map(|path| probe.accept(CoverCandidate::new(path, DetectionMethod::FuzzySearch)))
}
