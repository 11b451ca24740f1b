#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 4, 5, 6];

const IMAGE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const OFFICE_DOC_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

pub enum Item<'a> {
    Text(&'a str),
    Image(&'a str),
}

pub use Item::{Image, Text};

pub fn image_run(rid: &str) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline><wp:extent cx="914400" cy="914400"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:blipFill><a:blip r:embed="{rid}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
    )
}

pub fn para(items: &[Item]) -> String {
    let mut xml = String::from("<w:p>");
    for item in items {
        match item {
            Text(t) => xml.push_str(&format!("<w:r><w:t xml:space=\"preserve\">{t}</w:t></w:r>")),
            Image(rid) => xml.push_str(&image_run(rid)),
        }
    }
    xml.push_str("</w:p>");
    xml
}

pub fn document_xml(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#,
            r#" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
            r#" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing""#,
            r#" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#,
            r#" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#,
            r#" xmlns:v="urn:schemas-microsoft-com:vml""#,
            r#" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006">"#,
            "<w:body>{}</w:body></w:document>"
        ),
        body
    )
}

/// `(id, target)` pairs, all typed as images.
pub fn rels_xml(rels: &[(&str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{IMAGE_REL}" Target="{target}"/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

pub fn package_rels_xml(main_part: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{OFFICE_DOC_REL}" Target="{main_part}"/></Relationships>"#
    )
}

pub fn zip_bytes(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A DOCX with `word/document.xml`, its rels part, and the given media parts.
pub fn build_docx(body: &str, rels: &[(&str, &str)], media: &[(&str, &[u8])]) -> Vec<u8> {
    let document = document_xml(body);
    let rels = rels_xml(rels);
    let package_rels = package_rels_xml("word/document.xml");
    let mut parts: Vec<(&str, &[u8])> = vec![
        ("_rels/.rels", package_rels.as_bytes()),
        ("word/document.xml", document.as_bytes()),
        ("word/_rels/document.xml.rels", rels.as_bytes()),
    ];
    parts.extend_from_slice(media);
    zip_bytes(&parts)
}

/// Four media parts with distinct bytes: image1.png .. image3.png and image4.jpeg.
pub fn standard_media() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("word/media/image1.png", [PNG, &b"one"[..]].concat()),
        ("word/media/image2.png", [PNG, &b"two"[..]].concat()),
        ("word/media/image3.png", [PNG, &b"three"[..]].concat()),
        ("word/media/image4.jpeg", [JPEG, &b"four"[..]].concat()),
    ]
}

pub fn standard_rels() -> Vec<(&'static str, &'static str)> {
    vec![
        ("rId1", "media/image1.png"),
        ("rId2", "media/image2.png"),
        ("rId3", "media/image3.png"),
        ("rId4", "media/image4.jpeg"),
    ]
}

/// Build a DOCX from paragraphs using the standard rels and media.
pub fn docx_with_paragraphs(paragraphs: &[String]) -> Vec<u8> {
    let media = standard_media();
    let media_refs: Vec<(&str, &[u8])> = media.iter().map(|(n, d)| (*n, d.as_slice())).collect();
    build_docx(&paragraphs.concat(), &standard_rels(), &media_refs)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
