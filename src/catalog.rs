//! Text-level patching of a catalog source file such as `constants.ts`.
//!
//! The catalog is never parsed as a language. Each `id: <n>` declaration opens
//! an entry region that ends where the next declaration starts, and only the
//! first image field literal inside that region is rewritten. Everything else,
//! formatting and comments included, is left byte-for-byte intact.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::error::Error;
use crate::model::Bindings;

/// Field names used by the catalog's entry records.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogFormat {
    pub id_field: String,
    pub image_field: String,
}

impl Default for CatalogFormat {
    fn default() -> Self {
        CatalogFormat {
            id_field: "id".into(),
            image_field: "image".into(),
        }
    }
}

struct Patterns {
    declaration: Regex,
    image_field: Regex,
}

impl CatalogFormat {
    fn compile(&self) -> Result<Patterns, Error> {
        let key = |name: &str| format!(r#"["']?\b{}\b["']?\s*:\s*"#, regex::escape(name));
        let declaration = Regex::new(&format!(r"{}(\d+)\b", key(&self.id_field)))
            .map_err(|e| Error::Config(format!("bad id field {:?}: {e}", self.id_field)))?;
        let image_field = Regex::new(&format!(
            r#"{}(?:'((?:[^'\\\n]|\\.)*)'|"((?:[^"\\\n]|\\.)*)"|`((?:[^`\\]|\\.)*)`)"#,
            key(&self.image_field)
        ))
        .map_err(|e| Error::Config(format!("bad image field {:?}: {e}", self.image_field)))?;
        Ok(Patterns {
            declaration,
            image_field,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Entries whose image value was rewritten.
    pub updated: Vec<u32>,
    /// Entries that already pointed at their image.
    pub unchanged: Vec<u32>,
    /// Bound entries with no declaration in the catalog.
    pub missing: Vec<u32>,
    /// Declared entries without an image field before the next declaration.
    pub no_field: Vec<u32>,
}

impl PatchReport {
    pub fn changed(&self) -> bool {
        !self.updated.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patched {
    pub text: String,
    pub report: PatchReport,
}

struct Region {
    /// `None` for a declaration whose number does not fit an entry id; it
    /// still ends the region before it.
    id: Option<u32>,
    /// Just past the `id: <n>` declaration.
    body_start: usize,
    end: usize,
}

fn entry_regions(text: &str, declaration: &Regex) -> Vec<Region> {
    let decls: Vec<(usize, usize, Option<u32>)> = declaration
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(1)?.as_str().parse::<u32>().ok();
            Some((whole.start(), whole.end(), id))
        })
        .collect();
    decls
        .iter()
        .enumerate()
        .map(|(i, &(_, body_start, id))| Region {
            id,
            body_start,
            end: decls.get(i + 1).map_or(text.len(), |next| next.0),
        })
        .collect()
}

/// Decode a string literal body: `\x` stands for `x`.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

/// Encode `value` for a literal delimited by `quote`.
fn escape(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' || c == quote || (quote == '`' && c == '$' && chars.peek() == Some(&'{')) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Rewrite the image field of every bound entry. Applying the same bindings
/// again yields identical text.
pub fn patch_catalog(
    text: &str,
    bindings: &Bindings,
    format: &CatalogFormat,
) -> Result<Patched, Error> {
    let patterns = format.compile()?;
    let regions = entry_regions(text, &patterns.declaration);
    let mut report = PatchReport::default();
    // (value start, value end, replacement)
    let mut edits: Vec<(usize, usize, String)> = Vec::new();

    for (entry_id, new_value) in bindings.catalog_values() {
        let matching: Vec<&Region> = regions.iter().filter(|r| r.id == Some(entry_id)).collect();
        if matching.is_empty() {
            log::warn!("Entry {entry_id} not found in catalog, skipped");
            report.missing.push(entry_id);
            continue;
        }
        if matching.len() > 1 {
            log::warn!(
                "Entry {entry_id} is declared {} times in catalog, patching all",
                matching.len()
            );
        }

        let mut edited = false;
        let mut found_field = false;
        for region in matching {
            let body = &text[region.body_start..region.end];
            let Some(caps) = patterns.image_field.captures(body) else {
                continue;
            };
            found_field = true;
            let Some((value, quote)) = [(1, '\''), (2, '"'), (3, '`')]
                .into_iter()
                .find_map(|(group, quote)| Some((caps.get(group)?, quote)))
            else {
                continue;
            };
            if unescape(value.as_str()) == new_value {
                continue;
            }
            log::info!(
                "Entry {entry_id}: image {:?} -> {:?}",
                value.as_str(),
                new_value
            );
            edits.push((
                region.body_start + value.start(),
                region.body_start + value.end(),
                escape(new_value, quote),
            ));
            edited = true;
        }

        if !found_field {
            log::warn!("Entry {entry_id} has no {} field, skipped", format.image_field);
            report.no_field.push(entry_id);
        } else if edited {
            report.updated.push(entry_id);
        } else {
            report.unchanged.push(entry_id);
        }
    }

    edits.sort_by_key(|e| e.0);
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for (start, end, value) in edits {
        out.push_str(&text[pos..start]);
        out.push_str(&value);
        pos = end;
    }
    out.push_str(&text[pos..]);

    Ok(Patched { text: out, report })
}

/// Replace `path` with `contents` in one step: write a sibling file, then rename over.
/// A symlinked catalog keeps its link; the file it points at is replaced and
/// keeps its permissions.
pub fn write_catalog(path: &Path, contents: &str) -> Result<(), Error> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let path = target.as_path();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".into());
    let tmp: PathBuf = path.with_file_name(format!(".{file_name}.docx-catalog.tmp"));
    fs::write(&tmp, contents).map_err(|e| Error::io_at(e, &tmp))?;
    if let Ok(meta) = fs::metadata(path)
        && let Err(e) = fs::set_permissions(&tmp, meta.permissions())
    {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io_at(e, &tmp));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io_at(e, path));
    }
    Ok(())
}

/// Patch a catalog file in place. The file is written only if some value changed
/// and `dry_run` is off.
pub fn patch_catalog_file(
    path: &Path,
    bindings: &Bindings,
    format: &CatalogFormat,
    dry_run: bool,
) -> Result<PatchReport, Error> {
    let text = fs::read_to_string(path).map_err(|e| Error::io_at(e, path))?;
    let patched = patch_catalog(&text, bindings, format)?;
    if patched.report.changed() && !dry_run {
        write_catalog(path, &patched.text)?;
        log::info!(
            "Catalog updated: {} ({} entries)",
            path.display(),
            patched.report.updated.len()
        );
    } else if !patched.report.changed() {
        log::info!("Catalog unchanged: {}", path.display());
    }
    Ok(patched.report)
}
