//! In-memory EPUB fixtures for unit tests

use std::io::{Cursor, Write};

use image::{DynamicImage, ImageFormat, RgbImage};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::EpubArchive;

enum Entry {
    File(String, Vec<u8>),
    Dir(String),
}

/// Builds a stored (uncompressed) ZIP so compressed size equals data length
pub(crate) struct EpubBuilder {
    entries: Vec<Entry>,
}

impl EpubBuilder {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn file(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.entries.push(Entry::File(name.to_string(), data.into()));
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.entries.push(Entry::Dir(name.to_string()));
        self
    }

    /// Add `META-INF/container.xml` pointing at `full_path`
    pub fn container(self, full_path: &str) -> Self {
        let xml = format!(
            r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
            full_path
        );
        self.file("META-INF/container.xml", xml)
    }

    /// Add a package document at `path` wrapping the given manifest items
    pub fn package(self, path: &str, items: &str) -> Self {
        self.container(path).file(path, opf(items))
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for entry in self.entries {
            match entry {
                Entry::File(name, data) => {
                    zip.start_file(name, options).unwrap();
                    zip.write_all(&data).unwrap();
                }
                Entry::Dir(name) => {
                    zip.add_directory(name, options).unwrap();
                }
            }
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn open(self) -> EpubArchive<Cursor<Vec<u8>>> {
        EpubArchive::from_reader(Cursor::new(self.build())).unwrap()
    }
}

/// Minimal package document around a manifest body
pub(crate) fn opf(items: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">fixture-001</dc:identifier>
    <dc:title>Fixture Book</dc:title>
    <dc:creator>Fixture Author</dc:creator>
  </metadata>
  <manifest>
    {}
  </manifest>
  <spine>
  </spine>
</package>"#,
        items
    )
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 37 % 256) as u8, (y * 59 % 256) as u8, 128])
    }))
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), format).unwrap();
    output
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Png)
}

pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Jpeg)
}
