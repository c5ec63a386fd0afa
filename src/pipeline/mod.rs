//! Cover detection pipeline
//!
//! # Strategy order
//!
//! ```text
//! 1 METADATA_COVER_ID          manifest item id="cover"
//! 2 METADATA_COVER_PROPERTIES  manifest item properties ~ "cover"
//! 3 COMMON_COVER_NAMES         cover.jpg, Front.png, ... at archive root
//! 4 FIRST_IMAGE_FILE           first raster item in the manifest
//! 5 LARGEST_IMAGE_FILE         largest compressed raster item
//! 6 IMAGE_IN_HTML              first <img>/<image> of each content document
//! 7 FUZZY_SEARCH               top scored raster entries, manifest ignored
//! ```
//!
//! The first candidate that exists, has a raster extension, fits the byte
//! budget and decodes wins. Without a package document only strategy 7 runs.
//!
//! # Usage
//!
//! ```rust,no_run
//! use libros_cover::{CoverConfig, CoverPipeline};
//!
//! let pipeline = CoverPipeline::new(CoverConfig::default());
//! let result = pipeline.extract("book.epub")?;
//! if let Some(method) = result.method() {
//!     println!("{} via {}", result.path().unwrap_or_default(), method);
//! }
//! # Ok::<(), libros_cover::ArchiveError>(())
//! ```

mod strategies;
mod types;

use std::io::{Read, Seek};
use std::path::Path;

pub use types::{CoverCandidate, CoverResult, DetectionMethod, NO_COVER_FOUND};

use crate::archive::EpubArchive;
use crate::config::CoverConfig;
use crate::decode::{ImageDecoder, RasterDecoder};
use crate::error::Result;
use crate::href::{is_raster_image, HrefResolver};
use crate::package::{load_package, LocatedPackage, PackageDocument};

/// Runs the detection strategies over one archive at a time
///
/// Holds no per-archive state, so one pipeline can serve concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct CoverPipeline<D = RasterDecoder> {
    decoder: D,
    config: CoverConfig,
}

impl CoverPipeline<RasterDecoder> {
    pub fn new(config: CoverConfig) -> Self {
        Self::with_decoder(RasterDecoder, config)
    }
}

impl<D: ImageDecoder> CoverPipeline<D> {
    pub fn with_decoder(decoder: D, config: CoverConfig) -> Self {
        Self { decoder, config }
    }

    pub fn config(&self) -> &CoverConfig {
        &self.config
    }

    /// Open an EPUB and extract its cover
    ///
    /// Only failure to open the archive is an error; everything after that
    /// ends in a `CoverResult`.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<CoverResult<D::Image>> {
        let path = path.as_ref();
        let _span = tracing::debug_span!("extract_cover", path = %path.display()).entered();

        let mut archive = EpubArchive::open(path)?;
        Ok(self.extract_from(&mut archive))
    }

    /// Extract from an already opened archive
    pub fn extract_from<R: Read + Seek>(&self, archive: &mut EpubArchive<R>) -> CoverResult<D::Image> {
        let package = load_package(archive, self.config.max_entry_bytes);
        self.run(archive, package.as_ref())
    }

    /// Run the strategies in priority order, stopping at the first decodable hit
    pub fn run<R: Read + Seek>(
        &self,
        archive: &mut EpubArchive<R>,
        package: Option<&LocatedPackage>,
    ) -> CoverResult<D::Image> {
        let manifest = package.map(|p| Manifest {
            document: &p.document,
            resolver: HrefResolver::for_package(&p.path, &self.config),
        });
        if manifest.is_none() {
            tracing::warn!("No package document, falling back to archive scan");
        }

        let mut probe = Probe {
            archive,
            decoder: &self.decoder,
            config: &self.config,
            decodes: 0,
        };

        for method in DetectionMethod::strategies() {
            let hit = match (method.requires_package(), manifest.as_ref()) {
                (true, None) => continue,
                (_, manifest) => {
                    tracing::debug!("Trying {} ({})", method, method.description());
                    strategies::detect(method, &mut probe, manifest)
                }
            };

            if let Some((path, image)) = hit {
                tracing::info!(
                    "Cover found via {} after {} decode attempt(s): {}",
                    method,
                    probe.decodes,
                    path
                );
                return CoverResult::Success {
                    path,
                    image,
                    method,
                };
            }
        }

        tracing::warn!(
            "All cover detection strategies failed ({} decode attempts)",
            probe.decodes
        );
        CoverResult::failure(NO_COVER_FOUND)
    }
}

/// Manifest data plus the base directory its hrefs resolve against
pub(crate) struct Manifest<'a> {
    pub document: &'a PackageDocument,
    pub resolver: HrefResolver,
}

/// Validates candidates against one archive
pub(crate) struct Probe<'a, R, D> {
    pub archive: &'a mut EpubArchive<R>,
    decoder: &'a D,
    config: &'a CoverConfig,
    decodes: usize,
}

impl<R: Read + Seek, D: ImageDecoder> Probe<'_, R, D> {
    pub fn config(&self) -> &CoverConfig {
        self.config
    }

    /// Decode a candidate if it exists, looks like an image and fits the budget
    pub fn accept(&mut self, candidate: CoverCandidate) -> Option<(String, D::Image)> {
        let path = candidate.path;

        if !self.archive.has_entry(&path) {
            tracing::debug!("{}: {} not in archive", candidate.method, path);
            return None;
        }
        if !is_raster_image(&path) {
            tracing::debug!("{}: {} is not a raster image", candidate.method, path);
            return None;
        }

        let bytes = match self.archive.read_bytes(&path, self.config.max_entry_bytes) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("{}: skipping {}: {}", candidate.method, path, e);
                return None;
            }
        };

        self.decodes += 1;
        match self.decoder.decode(&bytes) {
            Some(image) => Some((path, image)),
            None => {
                tracing::debug!("{}: {} did not decode", candidate.method, path);
                None
            }
        }
    }
}
