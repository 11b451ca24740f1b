use crate::error::Error;
use crate::model::{ImageRef, ImageRefKind, Paragraph, Table};

use super::{DML_NS, REL_NS, VML_NS, WML_NS, is_wml, wml};

const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";

fn body<'a>(xml: &'a roxmltree::Document<'a>) -> Result<roxmltree::Node<'a, 'a>, Error> {
    wml(xml.root_element(), "body").ok_or_else(|| Error::InvalidDocx("missing w:body".into()))
}

/// Every `w:p` of the main document in document order, including paragraphs
/// nested in tables, text boxes and content controls.
///
/// Text and images belong to the nearest enclosing paragraph only, so an image
/// inside a text box is reported once, on the text box's paragraph.
pub fn scan_paragraphs(xml_content: &str) -> Result<Vec<Paragraph>, Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    let body = body(&xml)?;

    let mut paragraphs = Vec::new();
    for node in body.descendants().filter(|n| is_wml(*n, "p")) {
        let mut text = String::new();
        let mut images = Vec::new();
        collect_paragraph(node, &mut text, &mut images);
        let ordinal = paragraphs.len();
        paragraphs.push(Paragraph {
            ordinal,
            text: text.trim().to_string(),
            images,
        });
    }
    log::debug!("Scanned {} paragraphs", paragraphs.len());
    Ok(paragraphs)
}

/// Top-level and nested tables as rows of cell text, for the inspection dump.
pub fn scan_tables(xml_content: &str) -> Result<Vec<Table>, Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    let body = body(&xml)?;

    let tables = body
        .descendants()
        .filter(|n| is_wml(*n, "tbl"))
        .map(|tbl| Table {
            rows: tbl
                .children()
                .filter(|n| is_wml(*n, "tr"))
                .map(|tr| {
                    tr.children()
                        .filter(|n| is_wml(*n, "tc"))
                        .map(cell_text)
                        .collect()
                })
                .collect(),
        })
        .collect();
    Ok(tables)
}

fn cell_text(tc: roxmltree::Node) -> String {
    let parts: Vec<String> = tc
        .children()
        .filter(|n| is_wml(*n, "p"))
        .map(|p| {
            let mut text = String::new();
            collect_paragraph(p, &mut text, &mut Vec::new());
            text.trim().to_string()
        })
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

fn collect_paragraph(para: roxmltree::Node, text: &mut String, images: &mut Vec<ImageRef>) {
    for child in para.children() {
        collect_node(child, text, images);
    }
}

fn collect_node(node: roxmltree::Node, text: &mut String, images: &mut Vec<ImageRef>) {
    if !node.is_element() {
        return;
    }
    let tag = node.tag_name();
    match (tag.namespace(), tag.name()) {
        // Nested paragraphs (text boxes) report their own content.
        (Some(WML_NS), "p") => return,
        (Some(WML_NS), "t") => {
            if let Some(t) = node.text() {
                text.push_str(t);
            }
            return;
        }
        (Some(WML_NS), "tab") => {
            text.push('\t');
            return;
        }
        (Some(WML_NS), "br" | "cr") => {
            text.push('\n');
            return;
        }
        (Some(WML_NS), "delText" | "instrText") => return,
        (Some(DML_NS), "blip") => {
            let rid = node
                .attribute((REL_NS, "embed"))
                .or_else(|| node.attribute((REL_NS, "link")));
            if let Some(rid) = rid.filter(|r| !r.is_empty()) {
                images.push(ImageRef {
                    rel_id: rid.to_string(),
                    kind: ImageRefKind::Blip,
                });
            }
            return;
        }
        (Some(VML_NS), "imagedata") => {
            if let Some(rid) = node.attribute((REL_NS, "id")).filter(|r| !r.is_empty()) {
                images.push(ImageRef {
                    rel_id: rid.to_string(),
                    kind: ImageRefKind::VmlImageData,
                });
            }
            return;
        }
        // Choice and Fallback describe the same content; take only one of them.
        (Some(MC_NS), "AlternateContent") => {
            let branch = node
                .children()
                .find(|n| {
                    n.tag_name().namespace() == Some(MC_NS) && n.tag_name().name() == "Choice"
                })
                .or_else(|| {
                    node.children().find(|n| {
                        n.tag_name().namespace() == Some(MC_NS) && n.tag_name().name() == "Fallback"
                    })
                });
            if let Some(branch) = branch {
                for child in branch.children() {
                    collect_node(child, text, images);
                }
            }
            return;
        }
        _ => {}
    }
    for child in node.children() {
        collect_node(child, text, images);
    }
}
