use anyhow::{Context, Result};
use docx_replace_core::{
    plan, replace_fragments, replace_raw, replace_raw_index_n, texts, MatchRecord,
    OccurrencePolicy, Rewrite,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::escape::{escape_attribute, escape_text, EscapeError};
use crate::package::{media_slot, DocxPackage, PartRole};

/// An edit session over one loaded package.
///
/// The session owns its copies of the editable text parts and the pending image
/// substitutions; the raw parts stay borrowed from the package until [`DocxHandler::write`]
/// streams them into a new archive.
pub struct DocxHandler<'a> {
    package: &'a DocxPackage,
    content: String,
    links: String,
    headers: BTreeMap<String, String>,
    footers: BTreeMap<String, String>,
    images: HashMap<u32, Vec<u8>>,
}

impl<'a> DocxHandler<'a> {
    pub(crate) fn new(
        package: &'a DocxPackage,
        content: String,
        links: String,
        headers: BTreeMap<String, String>,
        footers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            package,
            content,
            links,
            headers,
            footers,
            images: HashMap::new(),
        }
    }

    /// Current body markup.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current relationships markup.
    pub fn links(&self) -> &str {
        &self.links
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn footer(&self, name: &str) -> Option<&str> {
        self.footers.get(name).map(String::as_str)
    }

    /// Text of every body run, in document order.
    pub fn fragments(&self) -> Vec<&str> {
        texts(&self.content)
    }

    /// The occurrences a [`DocxHandler::replace`] call with the same arguments would rewrite.
    pub fn plan(&self, target: &str, policy: OccurrencePolicy) -> Vec<MatchRecord> {
        plan(&self.content, target, policy)
    }

    // ── Run-aware body replacement ───────────────────────────────

    /// Replace occurrences of `target` in the body, following runs across formatting
    /// boundaries. Returns the number of occurrences rewritten.
    pub fn replace(&mut self, target: &str, replacement: &str, policy: OccurrencePolicy) -> usize {
        let rewrite = replace_fragments(&self.content, target, replacement, policy);
        self.commit_body(rewrite, "run-aware")
    }

    /// Replace the first `limit` occurrences; `-1` replaces all of them.
    pub fn replace_count(&mut self, target: &str, replacement: &str, limit: i64) -> usize {
        self.replace(target, replacement, OccurrencePolicy::from_limit(limit))
    }

    /// Replace only the `index`-th occurrence (0-based). Negative indices do nothing.
    pub fn replace_index(&mut self, target: &str, replacement: &str, index: i64) -> usize {
        match OccurrencePolicy::from_index(index) {
            Some(policy) => self.replace(target, replacement, policy),
            None => {
                debug!("Ignoring negative occurrence index {}", index);
                0
            }
        }
    }

    // ── Literal body replacement ─────────────────────────────────

    /// Literal replacement over the raw body markup, tags included. `-1` replaces every
    /// occurrence; other negative limits do nothing.
    pub fn replace_raw(&mut self, target: &str, replacement: &str, limit: i64) -> usize {
        let Some(limit) = literal_limit(limit) else {
            debug!("Ignoring negative body limit {}", limit);
            return 0;
        };
        let rewrite = replace_raw(&self.content, target, replacement, limit);
        self.commit_body(rewrite, "raw")
    }

    /// Literal replacement of the `n`-th (0-based) occurrence in the raw body markup.
    pub fn replace_raw_index_n(&mut self, target: &str, replacement: &str, n: usize) -> usize {
        let rewrite = replace_raw_index_n(&self.content, target, replacement, n);
        self.commit_body(rewrite, "raw indexed")
    }

    fn commit_body(&mut self, rewrite: Rewrite, mode: &str) -> usize {
        if rewrite.replaced > 0 {
            self.content = rewrite.markup;
        }
        info!("Replaced {} occurrence(s) in body ({})", rewrite.replaced, mode);
        rewrite.replaced
    }

    // ── Scoped text replacement ──────────────────────────────────

    /// Replace in the document relationships; `-1` replaces every occurrence, other negative
    /// limits do nothing.
    pub fn replace_link(
        &mut self,
        target: &str,
        replacement: &str,
        limit: i64,
    ) -> Result<usize, EscapeError> {
        let (target, replacement) = (escape_attribute(target)?, escape_attribute(replacement)?);
        let Some(limit) = literal_limit(limit) else {
            debug!("Ignoring negative relationship limit {}", limit);
            return Ok(0);
        };
        let rewrite = replace_raw(&self.links, &target, &replacement, limit);
        if rewrite.replaced > 0 {
            self.links = rewrite.markup;
        }
        info!("Replaced {} occurrence(s) in relationships", rewrite.replaced);
        Ok(rewrite.replaced)
    }

    /// Replace every occurrence in every header part.
    pub fn replace_header(
        &mut self,
        target: &str,
        replacement: &str,
    ) -> Result<usize, EscapeError> {
        let replaced = replace_scoped(&mut self.headers, target, replacement)?;
        info!("Replaced {} occurrence(s) in headers", replaced);
        Ok(replaced)
    }

    /// Replace every occurrence in every footer part.
    pub fn replace_footer(
        &mut self,
        target: &str,
        replacement: &str,
    ) -> Result<usize, EscapeError> {
        let replaced = replace_scoped(&mut self.footers, target, replacement)?;
        info!("Replaced {} occurrence(s) in footers", replaced);
        Ok(replaced)
    }

    // ── Media ────────────────────────────────────────────────────

    /// Queue new bytes for `word/media/image<slot>.*`. Applied by [`DocxHandler::write`].
    pub fn replace_image(&mut self, slot: u32, bytes: Vec<u8>) {
        debug!("Queued {} bytes for media slot {}", bytes.len(), slot);
        self.images.insert(slot, bytes);
    }

    // ── Serialization ────────────────────────────────────────────

    /// Write the edited package. Entries keep their order, names and compression; only the
    /// body, relationships, headers, footers and queued media carry new content.
    pub fn write<W: Write + Seek>(&self, sink: W) -> Result<W> {
        let mut writer = ZipWriter::new(sink);
        let mut used_slots = BTreeSet::new();

        for part in self.package.parts() {
            let options = SimpleFileOptions::default().compression_method(part.compression);
            if part.is_dir {
                writer
                    .add_directory(part.name.as_str(), options)
                    .with_context(|| format!("Failed to add directory '{}'", part.name))?;
                continue;
            }

            let data: &[u8] = match part.role() {
                PartRole::Body => self.content.as_bytes(),
                PartRole::Relationships => self.links.as_bytes(),
                PartRole::Header => self
                    .headers
                    .get(&part.name)
                    .map_or(part.data.as_slice(), |xml| xml.as_bytes()),
                PartRole::Footer => self
                    .footers
                    .get(&part.name)
                    .map_or(part.data.as_slice(), |xml| xml.as_bytes()),
                PartRole::MediaImage => {
                    let queued = media_slot(&part.name)
                        .and_then(|slot| Some((slot, self.images.get(&slot)?)));
                    match queued {
                        Some((slot, bytes)) => {
                            used_slots.insert(slot);
                            bytes.as_slice()
                        }
                        None => part.data.as_slice(),
                    }
                }
                PartRole::Other => part.data.as_slice(),
            };

            writer
                .start_file(part.name.as_str(), options)
                .with_context(|| format!("Failed to start part '{}'", part.name))?;
            writer
                .write_all(data)
                .with_context(|| format!("Failed to write part '{}'", part.name))?;
        }

        for slot in self.images.keys().filter(|slot| !used_slots.contains(*slot)) {
            warn!("No media part for image slot {}; substitution dropped", slot);
        }

        let sink = writer.finish().context("Failed to finish DOCX archive")?;
        Ok(sink)
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create DOCX file at {:?}", path))?;
        self.write(file)?;
        info!("Saved document to {:?}", path);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let cursor = self.write(Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }
}

/// Signed limit of the literal modes: `-1` is unlimited, other negatives select nothing.
fn literal_limit(limit: i64) -> Option<Option<usize>> {
    match limit {
        -1 => Some(None),
        n => usize::try_from(n).ok().map(Some),
    }
}

/// Literal replacement over every entry of a part table, after escaping both sides.
/// Nothing is touched when escaping fails.
fn replace_scoped(
    table: &mut BTreeMap<String, String>,
    target: &str,
    replacement: &str,
) -> Result<usize, EscapeError> {
    let (target, replacement) = (escape_text(target)?, escape_text(replacement)?);
    let mut replaced = 0;
    for xml in table.values_mut() {
        let rewrite = replace_raw(xml, &target, &replacement, None);
        if rewrite.replaced > 0 {
            *xml = rewrite.markup;
            replaced += rewrite.replaced;
        }
    }
    Ok(replaced)
}
