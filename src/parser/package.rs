//! DOCX package reading and rewriting.
//!
//! A `.docx` file is a zip of XML parts wired together by relationship
//! files. The package layer reads the whole archive into memory, classifies
//! the content parts through the relationship graph (never by guessing file
//! names, except as a logged fallback), hands out lazily parsed part trees,
//! and can write the archive back with modified trees in place.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::detect;
use crate::error::{Error, Result};
use crate::parser::rels::{rels_path_for, resolve_target, RelMap};
use crate::parser::xml::XmlTree;

const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_HEADER: &str = "/header";
const REL_FOOTER: &str = "/footer";
const REL_FOOTNOTES: &str = "/footnotes";
const REL_ENDNOTES: &str = "/endnotes";
const REL_COMMENTS: &str = "/comments";
const REL_NUMBERING: &str = "/numbering";
const REL_CORE_PROPS: &str = "/core-properties";

const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";
const DEFAULT_NUMBERING_PART: &str = "word/numbering.xml";
const DEFAULT_CORE_PROPS_PART: &str = "docProps/core.xml";

/// Names of the classified content parts of one package.
#[derive(Debug, Clone, Default)]
pub struct ContentParts {
    /// Main document part, usually `word/document.xml`.
    pub main: String,
    /// Header parts in name order.
    pub headers: Vec<String>,
    /// Footer parts in name order.
    pub footers: Vec<String>,
    pub footnotes: Option<String>,
    pub endnotes: Option<String>,
    pub comments: Option<String>,
    pub numbering: Option<String>,
    pub core_properties: Option<String>,
}

impl ContentParts {
    /// Depth-collected parts in reading order: headers, body, footers,
    /// footnotes, endnotes. Comments are handled separately.
    pub fn reading_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = self.headers.iter().map(String::as_str).collect();
        order.push(self.main.as_str());
        order.extend(self.footers.iter().map(String::as_str));
        order.extend(self.footnotes.as_deref());
        order.extend(self.endnotes.as_deref());
        order
    }
}

/// An opened DOCX package.
#[derive(Debug)]
pub struct Package {
    /// Part names in original archive order.
    names: Vec<String>,
    data: HashMap<String, Vec<u8>>,
    /// Parsed part trees; also the rewrite buffer for [`Package::save`].
    trees: HashMap<String, XmlTree>,
    rels: HashMap<String, RelMap>,
    parts: ContentParts,
}

impl Package {
    /// Open a package from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Self::from_bytes(buf)
    }

    /// Open a package from any reader. Reads to the end before parsing.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::from_bytes(buf)
    }

    /// Open a package from bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if !detect::has_zip_magic(&bytes) {
            return Err(Error::UnknownFormat);
        }
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut names = Vec::with_capacity(archive.len());
        let mut data = HashMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf)?;
            let name = entry.name().to_owned();
            if data.insert(name.clone(), buf).is_none() {
                names.push(name);
            }
        }
        if !data.contains_key(detect::CONTENT_TYPES_PART) {
            return Err(Error::UnknownFormat);
        }

        let mut package = Self {
            names,
            data,
            trees: HashMap::new(),
            rels: HashMap::new(),
            parts: ContentParts::default(),
        };
        package.parts = package.classify_parts()?;
        Ok(package)
    }

    /// Walk the relationship graph and name every content part.
    fn classify_parts(&mut self) -> Result<ContentParts> {
        let root_rels = self.rels_for("").clone();
        let mut parts = ContentParts::default();

        let named_main = root_rels
            .iter()
            .filter(|r| !r.external && r.rel_type.ends_with(REL_OFFICE_DOCUMENT))
            .map(|r| resolve_target("", &r.target))
            .find(|t| self.data.contains_key(t));
        parts.main = match named_main {
            Some(main) => main,
            None if self.data.contains_key(DEFAULT_DOCUMENT_PART) => {
                log::warn!(
                    "package relationships name no document part, assuming {}",
                    DEFAULT_DOCUMENT_PART
                );
                DEFAULT_DOCUMENT_PART.to_owned()
            }
            None => return Err(Error::MissingPart(DEFAULT_DOCUMENT_PART.to_owned())),
        };

        parts.core_properties = root_rels
            .iter()
            .filter(|r| !r.external && r.rel_type.ends_with(REL_CORE_PROPS))
            .map(|r| resolve_target("", &r.target))
            .find(|t| self.data.contains_key(t))
            .or_else(|| {
                self.data
                    .contains_key(DEFAULT_CORE_PROPS_PART)
                    .then(|| DEFAULT_CORE_PROPS_PART.to_owned())
            });

        let main = parts.main.clone();
        let doc_rels = self.rels_for(&main).clone();
        for rel in doc_rels.iter().filter(|r| !r.external) {
            let target = resolve_target(&main, &rel.target);
            let kind = rel.rel_type.as_str();
            let known = kind.ends_with(REL_HEADER)
                || kind.ends_with(REL_FOOTER)
                || kind.ends_with(REL_FOOTNOTES)
                || kind.ends_with(REL_ENDNOTES)
                || kind.ends_with(REL_COMMENTS)
                || kind.ends_with(REL_NUMBERING);
            if !known {
                continue;
            }
            if !self.data.contains_key(&target) {
                log::warn!("{}: relationship {} targets missing part {}", main, rel.id, target);
                continue;
            }
            if kind.ends_with(REL_HEADER) {
                parts.headers.push(target);
            } else if kind.ends_with(REL_FOOTER) {
                parts.footers.push(target);
            } else if kind.ends_with(REL_FOOTNOTES) {
                parts.footnotes = Some(target);
            } else if kind.ends_with(REL_ENDNOTES) {
                parts.endnotes = Some(target);
            } else if kind.ends_with(REL_COMMENTS) {
                parts.comments = Some(target);
            } else {
                parts.numbering = Some(target);
            }
        }
        parts.headers.sort();
        parts.footers.sort();

        if parts.numbering.is_none() && self.data.contains_key(DEFAULT_NUMBERING_PART) {
            parts.numbering = Some(DEFAULT_NUMBERING_PART.to_owned());
        }
        Ok(parts)
    }

    /// The classified content parts.
    pub fn content_parts(&self) -> &ContentParts {
        &self.parts
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.data.get(name).map(|v| v.as_slice())
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Part names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Relationships of a part (the package root is `""`). Missing or
    /// unreadable `.rels` parts behave as empty maps.
    pub fn rels_for(&mut self, part: &str) -> &RelMap {
        match self.rels.entry(part.to_owned()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(v) => {
                let path = rels_path_for(part);
                let map = match self.data.get(&path) {
                    Some(bytes) => RelMap::parse(&path, bytes).unwrap_or_else(|e| {
                        log::warn!("{}: unreadable relationships: {}", path, e);
                        RelMap::empty()
                    }),
                    None => RelMap::empty(),
                };
                v.insert(map)
            }
        }
    }

    /// Parsed tree of a part, if it has been materialized.
    pub fn tree(&self, part: &str) -> Option<&XmlTree> {
        self.trees.get(part)
    }

    /// Parse (or fetch the cached) tree of a part for reading or rewriting.
    pub fn tree_mut(&mut self, part: &str) -> Result<&mut XmlTree> {
        match self.trees.entry(part.to_owned()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(v) => {
                let bytes = self
                    .data
                    .get(part)
                    .ok_or_else(|| Error::MissingPart(part.to_owned()))?;
                Ok(v.insert(XmlTree::parse(bytes, part)?))
            }
        }
    }

    /// Embedded media binaries keyed by file name.
    pub fn images(&self) -> HashMap<String, Vec<u8>> {
        let mut out = HashMap::new();
        for name in &self.names {
            if !name.contains("/media/") {
                continue;
            }
            if let (Some((_, file)), Some(bytes)) = (name.rsplit_once('/'), self.data.get(name)) {
                if !file.is_empty() {
                    out.insert(file.to_owned(), bytes.clone());
                }
            }
        }
        out
    }

    /// Write all embedded media into a directory.
    pub fn save_images(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let images = self.images();
        let mut names: Vec<&String> = images.keys().collect();
        names.sort();
        let mut written = Vec::with_capacity(names.len());
        for name in names {
            let path = dir.join(name);
            fs::write(&path, &images[name])?;
            written.push(path);
        }
        Ok(written)
    }

    /// Replace literal text across every content part, returning how many
    /// occurrences changed. Only element text is touched, so a needle split
    /// across two runs will not match; run merging (performed on extraction)
    /// reduces those splits first.
    pub fn replace_text(&mut self, needle: &str, replacement: &str) -> Result<usize> {
        if needle.is_empty() {
            return Ok(0);
        }
        let mut count = 0;
        for part in self.all_content_parts() {
            let tree = self.tree_mut(&part)?;
            for id in tree.descendants(tree.root()) {
                let replaced = {
                    let text = tree.text(id);
                    if !text.contains(needle) {
                        continue;
                    }
                    count += text.matches(needle).count();
                    text.replace(needle, replacement)
                };
                tree.set_text(id, replaced);
            }
        }
        Ok(count)
    }

    fn all_content_parts(&self) -> Vec<String> {
        let mut list: Vec<String> = self.parts.headers.clone();
        list.push(self.parts.main.clone());
        list.extend(self.parts.footers.iter().cloned());
        list.extend(self.parts.footnotes.clone());
        list.extend(self.parts.endnotes.clone());
        list.extend(self.parts.comments.clone());
        list
    }

    /// Write the package. Parts with a materialized tree are re-serialized
    /// from the tree (text edits and run merging included); all other parts
    /// are copied verbatim.
    pub fn save<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for name in &self.names {
            let Some(raw) = self.data.get(name) else {
                continue;
            };
            zip.start_file(name.clone(), options)?;
            match self.trees.get(name) {
                Some(tree) => zip.write_all(&tree.to_bytes()?)?,
                None => zip.write_all(raw)?,
            }
        }
        zip.finish()?;
        Ok(())
    }

    /// Write the package to a file path.
    pub fn save_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.save(file)
    }
}
