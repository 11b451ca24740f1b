use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::docx::{Package, resolve_target};
use crate::error::Error;
use crate::model::{Bindings, ImageRef, Paragraph, Relationships, SavedImage};

/// What to do when several images land on the same entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingPolicy {
    /// `{id}{ext}`; a later image replaces the earlier binding.
    #[default]
    LastWins,
    /// `{id}_{n}{ext}` with n counting from 1 per entry; all images are kept.
    Positional,
}

#[derive(Clone, Debug)]
pub struct AssociateOptions {
    pub output_dir: PathBuf,
    pub naming: NamingPolicy,
    /// Prefix for catalog values, e.g. `/images/products`. Without it the output path is used.
    pub url_prefix: Option<String>,
    pub dry_run: bool,
}

impl AssociateOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        AssociateOptions {
            output_dir: output_dir.into(),
            naming: NamingPolicy::default(),
            url_prefix: None,
            dry_run: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssociateStats {
    pub saved: usize,
    pub no_context: usize,
    pub missing_relationship: usize,
    pub external: usize,
    pub missing_part: usize,
}

impl AssociateStats {
    pub fn skipped(&self) -> usize {
        self.no_context + self.missing_relationship + self.external + self.missing_part
    }
}

enum Skip {
    MissingRelationship,
    External,
    MissingPart(String),
}

struct ResolvedImage {
    data: Vec<u8>,
    ext: String,
}

fn resolve_image<R: Read + Seek>(
    package: &mut Package<R>,
    rels: &Relationships,
    image: &ImageRef,
) -> Result<ResolvedImage, Skip> {
    let rel = rels.get(&image.rel_id).ok_or(Skip::MissingRelationship)?;
    if rel.external {
        return Err(Skip::External);
    }
    let part = resolve_target(&rels.source_part, &rel.target);
    let data = package
        .read_bytes(&part)
        .ok_or_else(|| Skip::MissingPart(part.clone()))?;
    let ext = extension_for(&part, &data);
    Ok(ResolvedImage { data, ext })
}

/// Lowercased extension of the media part, or one sniffed from the bytes.
fn extension_for(part: &str, data: &[u8]) -> String {
    let file_name = part.rsplit('/').next().unwrap_or(part);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => format!(".{}", sniff_format(data).unwrap_or("bin")),
    }
}

/// Identify common image formats by their leading bytes.
pub fn sniff_format(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Some("png");
    }
    if data.starts_with(&[0xFF, 0xD8]) {
        return Some("jpeg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("gif");
    }
    if data.starts_with(b"BM") {
        return Some("bmp");
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return Some("tiff");
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("webp");
    }
    // EMF: EMR_HEADER record type 1, " EMF" signature at byte 40
    if data.len() >= 44 && data[0..4] == [1, 0, 0, 0] && &data[40..44] == b" EMF" {
        return Some("emf");
    }
    // placeable WMF
    if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
        return Some("wmf");
    }
    None
}

fn write_image(dir: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io_at(e, dir))?;
    let path = dir.join(file_name);
    std::fs::write(&path, data).map_err(|e| Error::io_at(e, &path))?;
    Ok(path)
}

/// Copies images to disk under their entry's id and records the bindings.
pub struct Associator {
    options: AssociateOptions,
    bindings: Bindings,
    stats: AssociateStats,
}

impl Associator {
    pub fn new(options: AssociateOptions) -> Self {
        Associator {
            options,
            bindings: Bindings::default(),
            stats: AssociateStats::default(),
        }
    }

    pub fn stats(&self) -> AssociateStats {
        self.stats
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn finish(self) -> (Bindings, AssociateStats) {
        (self.bindings, self.stats)
    }

    /// Handle every image of one paragraph. `context` is the entry in scope
    /// after the paragraph's own text has been observed.
    ///
    /// Per-image problems are logged and counted; only write failures are errors.
    pub fn process<R: Read + Seek>(
        &mut self,
        package: &mut Package<R>,
        rels: &Relationships,
        paragraph: &Paragraph,
        context: Option<u32>,
    ) -> Result<(), Error> {
        if paragraph.images.is_empty() {
            return Ok(());
        }
        let Some(entry_id) = context else {
            log::info!(
                "Paragraph {}: {} image(s) before any marker, skipped",
                paragraph.ordinal,
                paragraph.images.len()
            );
            self.stats.no_context += paragraph.images.len();
            return Ok(());
        };

        for image in &paragraph.images {
            let resolved = match resolve_image(package, rels, image) {
                Ok(r) => r,
                Err(skip) => {
                    self.record_skip(skip, image, paragraph.ordinal);
                    continue;
                }
            };

            let file_name = match self.options.naming {
                NamingPolicy::LastWins => format!("{}{}", entry_id, resolved.ext),
                NamingPolicy::Positional => format!(
                    "{}_{}{}",
                    entry_id,
                    self.bindings.images(entry_id).len() + 1,
                    resolved.ext
                ),
            };

            let path = if self.options.dry_run {
                self.options.output_dir.join(&file_name)
            } else {
                write_image(&self.options.output_dir, &file_name, &resolved.data)?
            };
            let catalog_value = match &self.options.url_prefix {
                Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), file_name),
                None => path.to_string_lossy().replace('\\', "/"),
            };
            log::info!(
                "Saved {} for entry {} ({} bytes, {})",
                file_name,
                entry_id,
                resolved.data.len(),
                image.rel_id
            );

            let saved = SavedImage {
                path,
                catalog_value,
                rel_id: image.rel_id.clone(),
                paragraph: paragraph.ordinal,
            };
            match self.options.naming {
                NamingPolicy::LastWins => {
                    if self.bindings.primary(entry_id).is_some() {
                        log::debug!("Entry {entry_id}: {} replaces earlier image", image.rel_id);
                    }
                    self.bindings.replace(entry_id, saved);
                }
                NamingPolicy::Positional => self.bindings.push(entry_id, saved),
            }
            self.stats.saved += 1;
        }
        Ok(())
    }

    fn record_skip(&mut self, skip: Skip, image: &ImageRef, ordinal: usize) {
        match skip {
            Skip::MissingRelationship => {
                log::warn!(
                    "Paragraph {ordinal}: relationship {} not found, image skipped",
                    image.rel_id
                );
                self.stats.missing_relationship += 1;
            }
            Skip::External => {
                log::warn!(
                    "Paragraph {ordinal}: relationship {} is an external link, image skipped",
                    image.rel_id
                );
                self.stats.external += 1;
            }
            Skip::MissingPart(part) => {
                log::warn!("Paragraph {ordinal}: media part {part} missing, image skipped");
                self.stats.missing_part += 1;
            }
        }
    }
}

/// Write every resolvable image in document order as `image_{n}{ext}`, ignoring markers.
pub fn extract_all<R: Read + Seek>(
    package: &mut Package<R>,
    rels: &Relationships,
    paragraphs: &[Paragraph],
    output_dir: &Path,
) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::new();
    for paragraph in paragraphs {
        for image in &paragraph.images {
            let Ok(resolved) = resolve_image(package, rels, image) else {
                log::warn!(
                    "Paragraph {}: image {} could not be resolved, skipped",
                    paragraph.ordinal,
                    image.rel_id
                );
                continue;
            };
            let file_name = format!("image_{}{}", written.len() + 1, resolved.ext);
            written.push(write_image(output_dir, &file_name, &resolved.data)?);
        }
    }
    log::info!(
        "Extracted {} raw images to {}",
        written.len(),
        output_dir.display()
    );
    Ok(written)
}
