//! Detection provenance and results

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Reason carried by the exhaustion failure
pub const NO_COVER_FOUND: &str = "no suitable cover image found";

/// How a cover was found, in fixed priority order (1 = highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionMethod {
    MetadataCoverId,
    MetadataCoverProperties,
    CommonCoverNames,
    FirstImageFile,
    LargestImageFile,
    ImageInHtml,
    FuzzySearch,
    /// Caller-side placeholder; never produced by the pipeline
    FallbackColor,
}

impl DetectionMethod {
    pub const ALL: [DetectionMethod; 8] = [
        DetectionMethod::MetadataCoverId,
        DetectionMethod::MetadataCoverProperties,
        DetectionMethod::CommonCoverNames,
        DetectionMethod::FirstImageFile,
        DetectionMethod::LargestImageFile,
        DetectionMethod::ImageInHtml,
        DetectionMethod::FuzzySearch,
        DetectionMethod::FallbackColor,
    ];

    pub fn priority(self) -> u8 {
        match self {
            DetectionMethod::MetadataCoverId => 1,
            DetectionMethod::MetadataCoverProperties => 2,
            DetectionMethod::CommonCoverNames => 3,
            DetectionMethod::FirstImageFile => 4,
            DetectionMethod::LargestImageFile => 5,
            DetectionMethod::ImageInHtml => 6,
            DetectionMethod::FuzzySearch => 7,
            DetectionMethod::FallbackColor => 8,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DetectionMethod::MetadataCoverId => "manifest item with id \"cover\"",
            DetectionMethod::MetadataCoverProperties => "manifest item with a cover property",
            DetectionMethod::CommonCoverNames => "common cover file name",
            DetectionMethod::FirstImageFile => "first manifest image",
            DetectionMethod::LargestImageFile => "largest manifest image",
            DetectionMethod::ImageInHtml => "image referenced from HTML",
            DetectionMethod::FuzzySearch => "fuzzy file name search",
            DetectionMethod::FallbackColor => "placeholder color",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DetectionMethod::MetadataCoverId => "METADATA_COVER_ID",
            DetectionMethod::MetadataCoverProperties => "METADATA_COVER_PROPERTIES",
            DetectionMethod::CommonCoverNames => "COMMON_COVER_NAMES",
            DetectionMethod::FirstImageFile => "FIRST_IMAGE_FILE",
            DetectionMethod::LargestImageFile => "LARGEST_IMAGE_FILE",
            DetectionMethod::ImageInHtml => "IMAGE_IN_HTML",
            DetectionMethod::FuzzySearch => "FUZZY_SEARCH",
            DetectionMethod::FallbackColor => "FALLBACK_COLOR",
        }
    }

    /// Strategies that read manifest data; skipped without a package document
    pub fn requires_package(self) -> bool {
        self.priority() <= 6
    }

    /// Methods the pipeline actually runs, in priority order
    pub fn strategies() -> impl Iterator<Item = DetectionMethod> {
        Self::ALL
            .into_iter()
            .filter(|m| *m != DetectionMethod::FallbackColor)
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unverified archive path proposed by one strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverCandidate {
    pub path: String,
    pub method: DetectionMethod,
}

impl CoverCandidate {
    pub fn new(path: impl Into<String>, method: DetectionMethod) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

/// Outcome of one extraction
///
/// On `Success` the path existed in the archive and its bytes decoded.
#[derive(Debug, Clone)]
pub enum CoverResult<I = DynamicImage> {
    Success {
        path: String,
        image: I,
        method: DetectionMethod,
    },
    Failure {
        reason: String,
    },
}

impl<I> CoverResult<I> {
    pub fn failure(reason: impl Into<String>) -> Self {
        CoverResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CoverResult::Success { .. })
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            CoverResult::Success { path, .. } => Some(path),
            CoverResult::Failure { .. } => None,
        }
    }

    pub fn method(&self) -> Option<DetectionMethod> {
        match self {
            CoverResult::Success { method, .. } => Some(*method),
            CoverResult::Failure { .. } => None,
        }
    }

    pub fn image(&self) -> Option<&I> {
        match self {
            CoverResult::Success { image, .. } => Some(image),
            CoverResult::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            CoverResult::Success { .. } => None,
            CoverResult::Failure { reason } => Some(reason),
        }
    }
}
