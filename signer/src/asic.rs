/*
 * Copyright (c) 2021 gematik GmbH
 * 
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * 
 *    http://www.apache.org/licenses/LICENSE-2.0
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

use std::io::{copy, Read, Seek, Write};

use log::debug;
use xmlsec::{Element, Namespace};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::{error::Error, xades::ToBuffer};

/// Media type of an ASiC-E container, also the content of its first entry.
pub const MIMETYPE: &str = "application/vnd.etsi.asic-e+zip";

const NS_MANIFEST: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

/// Writes an ASiC-E container.
///
/// The `mimetype` entry is written uncompressed as first entry when the
/// container is created, data files are deflated and must all be added
/// before the first signature. Signatures are named
/// `META-INF/signatures-N.xml` in the order they are added and
/// `META-INF/manifest.xml` is written by [`end`](Self::end).
pub struct AsicContainer<W: Write + Seek> {
    zip: ZipWriter<W>,
    files: Vec<(String, String)>,
    signatures: usize,
}

impl<W: Write + Seek> AsicContainer<W> {
    pub fn new(writer: W) -> Result<Self, Error> {
        let mut zip = ZipWriter::new(writer);

        zip.start_file("mimetype", stored())?;
        zip.write_all(MIMETYPE.as_bytes())?;

        Ok(Self {
            zip,
            files: Vec::new(),
            signatures: 0,
        })
    }

    pub fn add(&mut self, path: &str, data: &[u8], mime_type: &str) -> Result<(), Error> {
        self.start_data_file(path, mime_type)?;
        self.zip.write_all(data)?;

        Ok(())
    }

    /// Adds a file streamed from `reader`.
    pub fn add_reader<R: Read>(&mut self, path: &str, reader: &mut R, mime_type: &str) -> Result<(), Error> {
        self.start_data_file(path, mime_type)?;
        copy(reader, &mut self.zip)?;

        Ok(())
    }

    /// Adds the next `META-INF/signatures-N.xml` entry.
    pub fn add_signature<T: ToBuffer + ?Sized>(&mut self, signature: &T) -> Result<(), Error> {
        self.signatures += 1;
        let path = format!("META-INF/signatures-{}.xml", self.signatures);
        debug!("Add signature to container: {}", path);

        self.zip.start_file(path, deflated())?;
        self.zip.write_all(&signature.to_buffer())?;

        Ok(())
    }

    pub fn signatures(&self) -> usize {
        self.signatures
    }

    /// Writes the manifest and finishes the archive.
    pub fn end(mut self) -> Result<W, Error> {
        if self.signatures == 0 {
            return Err(Error::ContainerInvariant("Container has no signature".into()));
        }

        self.zip.start_file("META-INF/manifest.xml", deflated())?;
        self.zip.write_all(manifest(&self.files).as_bytes())?;

        Ok(self.zip.finish()?)
    }

    fn start_data_file(&mut self, path: &str, mime_type: &str) -> Result<(), Error> {
        if self.signatures > 0 {
            return Err(Error::ContainerInvariant(format!(
                "Data file added after signature: {}",
                path
            )));
        }

        if path.is_empty() || path == "mimetype" || path.starts_with("META-INF/") {
            return Err(Error::ContainerInvariant(format!("Reserved path: {}", path)));
        }

        if self.files.iter().any(|(p, _)| p == path) {
            return Err(Error::ContainerInvariant(format!("Duplicate path: {}", path)));
        }

        debug!("Add file to container: {} ({})", path, mime_type);

        self.zip.start_file(path, deflated())?;
        self.files.push((path.into(), mime_type.into()));

        Ok(())
    }
}

fn stored() -> FileOptions {
    FileOptions::default().compression_method(CompressionMethod::Stored)
}

fn deflated() -> FileOptions {
    FileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn manifest(files: &[(String, String)]) -> String {
    let ns = Namespace::new("manifest", NS_MANIFEST);
    let entry = |path: &str, mime_type: &str| {
        Element::new(&ns, "file-entry")
            .ns_attr(&ns, "full-path", path)
            .ns_attr(&ns, "media-type", mime_type)
    };

    let mut root = Element::new(&ns, "manifest")
        .declare(&ns)
        .child(entry("/", MIMETYPE));
    for (path, mime_type) in files {
        root.push(entry(path, mime_type));
    }

    root.to_document()
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use std::io::Cursor;

    use zip::ZipArchive;

    fn container() -> Vec<u8> {
        let mut asic = AsicContainer::new(Cursor::new(Vec::new())).unwrap();
        asic.add("test.txt", b"Hello, world!", "text/plain").unwrap();
        asic.add_reader("data.bin", &mut Cursor::new(vec![0u8; 100]), "application/octet-stream")
            .unwrap();
        asic.add_signature(&b"<signature-1/>"[..]).unwrap();
        asic.add_signature(&b"<signature-2/>".to_vec()).unwrap();

        assert_eq!(asic.signatures(), 2);

        asic.end().unwrap().into_inner()
    }

    #[test]
    fn mimetype_is_first_and_stored() {
        let data = container();

        assert_eq!(&data[0..4], b"PK\x03\x04");
        assert_eq!(&data[8..10], &[0, 0]);
        assert_eq!(u16::from_le_bytes([data[18], data[19]]), 33);
        assert_eq!(u16::from_le_bytes([data[26], data[27]]), 8);
        assert_eq!(u16::from_le_bytes([data[28], data[29]]), 0);
        assert_eq!(&data[30..38], b"mimetype");
        assert_eq!(&data[38..71], MIMETYPE.as_bytes());
    }

    #[test]
    fn entries_in_order() {
        let mut archive = ZipArchive::new(Cursor::new(container())).unwrap();

        let names = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "mimetype",
                "test.txt",
                "data.bin",
                "META-INF/signatures-1.xml",
                "META-INF/signatures-2.xml",
                "META-INF/manifest.xml",
            ]
        );

        assert_eq!(archive.by_index(1).unwrap().compression(), CompressionMethod::Deflated);

        let mut signature = String::new();
        archive
            .by_name("META-INF/signatures-2.xml")
            .unwrap()
            .read_to_string(&mut signature)
            .unwrap();
        assert_eq!(signature, "<signature-2/>");

        let mut manifest = String::new();
        archive
            .by_name("META-INF/manifest.xml")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert!(manifest.contains(concat!(
            r#"<manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.etsi.asic-e+zip"></manifest:file-entry>"#,
            r#"<manifest:file-entry manifest:full-path="test.txt" manifest:media-type="text/plain"></manifest:file-entry>"#,
        )));
        assert!(!manifest.contains("signatures-1.xml"));
    }

    #[test]
    fn invariant_violations() {
        let mut asic = AsicContainer::new(Cursor::new(Vec::new())).unwrap();
        asic.add("a.txt", b"a", "text/plain").unwrap();

        assert!(matches!(
            asic.add("a.txt", b"b", "text/plain"),
            Err(Error::ContainerInvariant(_))
        ));
        assert!(matches!(
            asic.add("mimetype", b"b", "text/plain"),
            Err(Error::ContainerInvariant(_))
        ));
        assert!(matches!(
            asic.add("META-INF/manifest.xml", b"b", "text/xml"),
            Err(Error::ContainerInvariant(_))
        ));
        assert!(matches!(asic.end(), Err(Error::ContainerInvariant(_))));
    }

    #[test]
    fn no_data_files_after_signature() {
        let mut asic = AsicContainer::new(Cursor::new(Vec::new())).unwrap();
        asic.add("a.txt", b"a", "text/plain").unwrap();
        asic.add_signature(&b"<signature-1/>"[..]).unwrap();

        assert!(matches!(
            asic.add("b.txt", b"b", "text/plain"),
            Err(Error::ContainerInvariant(_))
        ));
        assert!(matches!(
            asic.add_reader("c.txt", &mut Cursor::new(vec![1u8]), "text/plain"),
            Err(Error::ContainerInvariant(_))
        ));

        let mut archive = ZipArchive::new(Cursor::new(asic.end().unwrap().into_inner())).unwrap();
        assert_eq!(archive.len(), 4);
        assert!(archive.by_name("b.txt").is_err());

        let mut manifest = String::new();
        archive
            .by_name("META-INF/manifest.xml")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert!(manifest.contains("a.txt"));
        assert!(!manifest.contains("b.txt"));
    }
}
