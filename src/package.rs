use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info};
use zip::{CompressionMethod, ZipArchive};

use crate::docx_handler::DocxHandler;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const MEDIA_IMAGE_PREFIX: &str = "word/media/image";

/// What a part is for, resolved from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartRole {
    Body,
    Relationships,
    Header,
    Footer,
    MediaImage,
    Other,
}

impl PartRole {
    pub fn of(name: &str) -> Self {
        if name == DOCUMENT_PART {
            return Self::Body;
        }
        if name == DOCUMENT_RELS_PART {
            return Self::Relationships;
        }
        if media_slot(name).is_some() {
            return Self::MediaImage;
        }
        // Only parts directly under word/, so header rels stay out.
        match name.strip_prefix("word/") {
            Some(file) if !file.contains('/') && file.ends_with(".xml") => {
                if file.starts_with("header") {
                    Self::Header
                } else if file.starts_with("footer") {
                    Self::Footer
                } else {
                    Self::Other
                }
            }
            _ => Self::Other,
        }
    }
}

/// Media slot number of a `word/media/image<N>.<ext>` part.
pub fn media_slot(name: &str) -> Option<u32> {
    let rest = name.strip_prefix(MEDIA_IMAGE_PREFIX)?;
    let (digits, _ext) = rest.split_once('.')?;
    digits.parse().ok()
}

/// One zip entry, raw.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub is_dir: bool,
}

impl Part {
    pub fn role(&self) -> PartRole {
        PartRole::of(&self.name)
    }
}

/// A loaded DOCX package: every entry in archive order plus the decoded text parts an edit
/// session works on.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<Part>,
    content: String,
    links: String,
    headers: BTreeMap<String, String>,
    footers: BTreeMap<String, String>,
}

impl DocxPackage {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open DOCX at {:?}", path))?;
        let package = Self::from_reader(file)
            .with_context(|| format!("Failed to load DOCX package {:?}", path))?;
        info!("Opened DOCX {:?} ({} parts)", path, package.parts.len());
        Ok(package)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader).context("Not a zip archive")?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .with_context(|| format!("Failed to read part '{}'", name))?;
            // Entries are rewritten either stored or deflated.
            let compression = match entry.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            parts.push(Part {
                name,
                data,
                compression,
                is_dir: entry.is_dir(),
            });
        }

        let content = required_text(&parts, DOCUMENT_PART)?;
        let links = required_text(&parts, DOCUMENT_RELS_PART)?;
        let headers = texts_with_role(&parts, PartRole::Header)?;
        let footers = texts_with_role(&parts, PartRole::Footer)?;
        debug!(
            "Resolved body, relationships, {} header(s), {} footer(s)",
            headers.len(),
            footers.len()
        );

        Ok(Self {
            parts,
            content,
            links,
            headers,
            footers,
        })
    }

    /// Start an edit session. Sessions are independent of each other.
    pub fn editable(&self) -> DocxHandler<'_> {
        DocxHandler::new(
            self,
            self.content.clone(),
            self.links.clone(),
            self.headers.clone(),
            self.footers.clone(),
        )
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Raw body markup as loaded.
    pub fn content(&self) -> &str {
        &self.content
    }
}

fn part_text(part: &Part) -> Result<String> {
    String::from_utf8(part.data.clone())
        .with_context(|| format!("Part '{}' is not valid UTF-8", part.name))
}

fn required_text(parts: &[Part], name: &str) -> Result<String> {
    let part = parts
        .iter()
        .find(|part| part.name == name)
        .ok_or_else(|| anyhow::anyhow!("Part '{}' not found in DOCX", name))?;
    part_text(part)
}

fn texts_with_role(parts: &[Part], role: PartRole) -> Result<BTreeMap<String, String>> {
    parts
        .iter()
        .filter(|part| !part.is_dir && part.role() == role)
        .map(|part| Ok((part.name.clone(), part_text(part)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_roles() {
        assert_eq!(PartRole::of("word/document.xml"), PartRole::Body);
        assert_eq!(PartRole::of("word/_rels/document.xml.rels"), PartRole::Relationships);
        assert_eq!(PartRole::of("word/header1.xml"), PartRole::Header);
        assert_eq!(PartRole::of("word/footer2.xml"), PartRole::Footer);
        assert_eq!(PartRole::of("word/_rels/header1.xml.rels"), PartRole::Other);
        assert_eq!(PartRole::of("word/media/image3.png"), PartRole::MediaImage);
        assert_eq!(PartRole::of("word/styles.xml"), PartRole::Other);
        assert_eq!(PartRole::of("[Content_Types].xml"), PartRole::Other);
    }

    #[test]
    fn test_media_slot() {
        assert_eq!(media_slot("word/media/image12.jpeg"), Some(12));
        assert_eq!(media_slot("word/media/image.png"), None);
        assert_eq!(media_slot("word/media/chart1.png"), None);
        assert_eq!(media_slot("word/media/image7"), None);
    }

    #[test]
    fn test_not_a_zip() {
        let err = DocxPackage::from_bytes(b"plain text").unwrap_err();
        assert!(err.to_string().contains("Not a zip archive"));
    }
}
