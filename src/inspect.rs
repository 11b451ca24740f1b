//! Plain-text dump of a DOCX file, for building marker tables by hand.

use std::fmt::Write;
use std::io::{Read, Seek};

use crate::docx::{Package, resolve_target, scan_paragraphs, scan_tables};
use crate::error::Error;

pub fn render<R: Read + Seek>(package: &mut Package<R>) -> Result<String, Error> {
    let xml = package.main_document_xml()?;
    let rels = package.main_relationships()?;
    let paragraphs = scan_paragraphs(&xml)?;
    let tables = scan_tables(&xml)?;

    let mut out = String::new();
    let rule = "=".repeat(72);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "DOCUMENT {}", package.main_part());
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Paragraphs: {}", paragraphs.len());
    let _ = writeln!(out);

    for p in paragraphs.iter().filter(|p| !p.is_empty()) {
        let _ = writeln!(out, "[{:>4}] {}", p.ordinal, p.text.replace('\n', " / "));
        for image in &p.images {
            let target = match rels.get(&image.rel_id) {
                Some(rel) if rel.external => format!("{} (external)", rel.target),
                Some(rel) => resolve_target(&rels.source_part, &rel.target),
                None => "(unresolved)".to_string(),
            };
            let _ = writeln!(out, "       image {} -> {}", image.rel_id, target);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Tables: {}", tables.len());
    for (i, table) in tables.iter().enumerate() {
        let _ = writeln!(out, "Table {}:", i + 1);
        for (r, row) in table.rows.iter().enumerate() {
            let _ = writeln!(out, "  Row {}: {}", r + 1, row.join(" | "));
        }
    }

    let mut images: Vec<_> = rels.by_id.values().filter(|r| r.is_image()).collect();
    images.sort_by(|a, b| a.id.cmp(&b.id));
    let _ = writeln!(out);
    let _ = writeln!(out, "Image relationships: {}", images.len());
    for rel in images {
        let _ = writeln!(out, "  {} -> {}", rel.id, rel.target);
    }
    Ok(out)
}
