mod paragraphs;
mod rels;

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::Error;
use crate::model::Relationships;

pub use paragraphs::{scan_paragraphs, scan_tables};
pub use rels::{parse_relationships, rels_part_for};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const VML_NS: &str = "urn:schemas-microsoft-com:vml";

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

pub(crate) fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

pub(crate) fn wml<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

/// An opened DOCX container. Read-only for its whole lifetime.
pub struct Package<R> {
    zip: zip::ZipArchive<R>,
    main_part: String,
}

impl Package<File> {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::io_at(e, path))?;
        Self::new(file)
    }
}

impl Package<Cursor<Vec<u8>>> {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        Self::new(Cursor::new(data))
    }
}

impl<R: Read + Seek> Package<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(reader)
            .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;
        let main_part = find_main_part(&mut zip);
        let package = Package { zip, main_part };
        if !package.has_part(&package.main_part) {
            return Err(Error::MissingPart(format!(
                "{} (is this a DOCX file?)",
                package.main_part
            )));
        }
        Ok(package)
    }

    /// Zip name of the main document part, normally `word/document.xml`.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.zip.index_for_name(name).is_some()
    }

    pub fn part_names(&self) -> Vec<String> {
        self.zip.file_names().map(String::from).collect()
    }

    pub fn read_bytes(&mut self, name: &str) -> Option<Vec<u8>> {
        read_zip_bytes(&mut self.zip, name)
    }

    pub fn read_text(&mut self, name: &str) -> Option<String> {
        read_zip_text(&mut self.zip, name)
    }

    pub fn require_text(&mut self, name: &str) -> Result<String, Error> {
        self.read_text(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }

    pub fn main_document_xml(&mut self) -> Result<String, Error> {
        let name = self.main_part.clone();
        self.require_text(&name)
    }

    /// Relationships of the main document part. Both the part and valid XML are required.
    pub fn main_relationships(&mut self) -> Result<Relationships, Error> {
        let rels_name = rels_part_for(&self.main_part);
        let xml = self.require_text(&rels_name)?;
        let mut rels = parse_relationships(&xml)?;
        rels.source_part = self.main_part.clone();
        Ok(rels)
    }
}

fn read_zip_bytes<R: Read + Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Option<Vec<u8>> {
    let mut data = Vec::new();
    zip.by_name(name).ok()?.read_to_end(&mut data).ok()?;
    Some(data)
}

fn read_zip_text<R: Read + Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Follow the package-level officeDocument relationship; fall back to `word/document.xml`.
fn find_main_part<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> String {
    let Some(xml) = read_zip_text(zip, PACKAGE_RELS) else {
        return DEFAULT_MAIN_PART.to_string();
    };
    let Ok(rels) = parse_relationships(&xml) else {
        log::warn!("Ignoring unparseable {PACKAGE_RELS}");
        return DEFAULT_MAIN_PART.to_string();
    };
    rels.by_id
        .values()
        .find(|r| r.rel_type.ends_with("/officeDocument") && !r.external)
        .map(|r| resolve_target("", &r.target))
        .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string())
}

/// Turn a relationship target into a zip part name, relative to the part owning the relationship.
///
/// `resolve_target("word/document.xml", "media/image1.png")` → `word/media/image1.png`
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return normalize_part(abs);
    }
    let dir = match source_part.rsplit_once('/') {
        Some((d, _)) => d,
        None => "",
    };
    if dir.is_empty() {
        normalize_part(target)
    } else {
        normalize_part(&format!("{}/{}", dir, target))
    }
}

fn normalize_part(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
