//! Libros Cover Library
//!
//! Locates and decodes the cover image of an EPUB archive using a fixed
//! cascade of detection strategies. The `libros-cover` binary in main.rs is
//! a thin command line wrapper around `CoverPipeline`.
//!
//! # Modules
//!
//! - `archive`: Read-only view over the EPUB zip container
//! - `package`: Tolerant container descriptor and package document parsing
//! - `pipeline`: Strategy cascade and result types
//! - `stats`: Optional per-attempt statistics sink

pub mod archive;
pub mod config;
pub mod decode;
pub mod error;
pub mod href;
pub mod html;
pub mod package;
pub mod pipeline;
pub mod scorer;
pub mod stats;

#[cfg(test)]
mod testing;

pub use archive::{EntryInfo, EpubArchive};
pub use config::{CoverConfig, HrefResolution};
pub use decode::{ImageDecoder, RasterDecoder};
pub use error::{ArchiveError, ConfigError, Result};
pub use package::{LocatedPackage, ManifestItem, PackageDocument};
pub use pipeline::{CoverCandidate, CoverPipeline, CoverResult, DetectionMethod, NO_COVER_FOUND};
pub use stats::{record_attempt, ExtractionRecord, MemoryStatsSink, StatsSink, StatsSummary};

/// Extract a cover with the default configuration
pub fn extract_cover<P: AsRef<std::path::Path>>(path: P) -> Result<CoverResult> {
    CoverPipeline::new(CoverConfig::default()).extract(path)
}
