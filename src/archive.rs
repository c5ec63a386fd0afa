//! EPUB archive access
//!
//! Thin wrapper over `zip::ZipArchive` that indexes entry metadata once at
//! open time and offers bounded reads. A handle belongs to exactly one
//! extraction call; the underlying file is closed when it is dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{ArchiveError, Result};

/// Metadata for one file entry, in central-directory order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    pub compressed_size: u64,
}

/// An opened EPUB container
pub struct EpubArchive<R = BufReader<File>> {
    zip: ZipArchive<R>,
    entries: Vec<EntryInfo>,
    by_name: HashMap<String, usize>,
}

impl EpubArchive<BufReader<File>> {
    /// Open an EPUB from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArchiveError::NotFound(path.to_path_buf()),
            _ => ArchiveError::Io(e),
        })?;

        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> EpubArchive<R> {
    /// Open an EPUB from any seekable reader (in-memory uploads, tests)
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut zip = ZipArchive::new(reader).map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

        let mut entries = Vec::with_capacity(zip.len());
        let mut by_name = HashMap::with_capacity(zip.len());

        for i in 0..zip.len() {
            let file = match zip.by_index_raw(i) {
                Ok(file) => file,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry #{}: {}", i, e);
                    continue;
                }
            };
            if file.is_dir() {
                continue;
            }

            let info = EntryInfo {
                name: file.name().to_string(),
                size: file.size(),
                compressed_size: file.compressed_size(),
            };
            // First entry wins on duplicate names, matching by_name lookups
            by_name.entry(info.name.clone()).or_insert(entries.len());
            entries.push(info);
        }

        tracing::debug!("Indexed {} archive entries", entries.len());

        Ok(Self {
            zip,
            entries,
            by_name,
        })
    }

    /// All file entries in archive order
    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    /// File entry names in archive order
    pub fn list_entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn has_entry(&self, path: &str) -> bool {
        self.by_name.contains_key(path)
    }

    fn entry(&self, path: &str) -> Option<&EntryInfo> {
        self.by_name.get(path).map(|&i| &self.entries[i])
    }

    /// Uncompressed size of an entry
    pub fn size_of(&self, path: &str) -> Option<u64> {
        self.entry(path).map(|e| e.size)
    }

    pub fn compressed_size_of(&self, path: &str) -> Option<u64> {
        self.entry(path).map(|e| e.compressed_size)
    }

    /// Open a decompressing stream over one entry
    pub fn open_stream(&mut self, path: &str) -> Result<impl Read + '_> {
        if !self.has_entry(path) {
            return Err(ArchiveError::EntryNotFound(path.to_string()));
        }
        self.zip
            .by_name(path)
            .map_err(|e| ArchiveError::from_entry(path, e))
    }

    /// Read an entry fully, refusing entries larger than `limit` bytes
    pub fn read_bytes(&mut self, path: &str, limit: u64) -> Result<Vec<u8>> {
        let size = self
            .size_of(path)
            .ok_or_else(|| ArchiveError::EntryNotFound(path.to_string()))?;
        if size > limit {
            return Err(ArchiveError::EntryTooLarge {
                path: path.to_string(),
                size,
                limit,
            });
        }

        let mut content = Vec::with_capacity(size as usize);
        // Declared sizes can lie; never buffer more than limit + 1 bytes
        self.open_stream(path)?
            .take(limit.saturating_add(1))
            .read_to_end(&mut content)?;

        if content.len() as u64 > limit {
            return Err(ArchiveError::EntryTooLarge {
                path: path.to_string(),
                size: content.len() as u64,
                limit,
            });
        }

        Ok(content)
    }

    /// Read an entry as text, replacing invalid UTF-8 and dropping a BOM
    pub fn read_text(&mut self, path: &str, limit: u64) -> Result<String> {
        let bytes = self.read_bytes(path, limit)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}
