use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// One entry of a `.rels` part.
#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub target: String,
    pub rel_type: String,
    pub external: bool,
}

impl Relationship {
    pub fn is_image(&self) -> bool {
        self.rel_type.ends_with("/image")
    }
}

/// Relationship id → relationship, for one source part.
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    /// Zip part the targets are relative to, e.g. `word/document.xml`.
    pub source_part: String,
    pub by_id: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageRefKind {
    /// DrawingML `a:blip` (`r:embed` or `r:link`).
    Blip,
    /// Legacy VML `v:imagedata`.
    VmlImageData,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    pub rel_id: String,
    pub kind: ImageRefKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    /// Zero-based position in document order.
    pub ordinal: usize,
    pub text: String,
    pub images: Vec<ImageRef>,
}

impl Paragraph {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

/// An image written to disk and attached to a catalog entry.
#[derive(Clone, Debug, PartialEq)]
pub struct SavedImage {
    pub path: PathBuf,
    /// Value to write into the catalog's image field.
    pub catalog_value: String,
    pub rel_id: String,
    pub paragraph: usize,
}

/// Entry id → images saved for it, in document order.
///
/// Under the last-wins naming policy each entry holds at most one image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    pub entries: BTreeMap<u32, Vec<SavedImage>>,
}

impl Bindings {
    pub fn replace(&mut self, entry_id: u32, image: SavedImage) {
        self.entries.insert(entry_id, vec![image]);
    }

    pub fn push(&mut self, entry_id: u32, image: SavedImage) {
        self.entries.entry(entry_id).or_default().push(image);
    }

    pub fn images(&self, entry_id: u32) -> &[SavedImage] {
        self.entries.get(&entry_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The image whose value goes into the catalog: the first one kept for the entry.
    pub fn primary(&self, entry_id: u32) -> Option<&SavedImage> {
        self.entries.get(&entry_id).and_then(|v| v.first())
    }

    /// `(entry id, catalog value)` pairs in ascending id order.
    pub fn catalog_values(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries
            .iter()
            .filter_map(|(id, imgs)| imgs.first().map(|img| (*id, img.catalog_value.as_str())))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
