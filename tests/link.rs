mod common;

use std::fs;

use common::{Image, Text, docx_with_paragraphs, init_logging, para};
use docx_catalog::{Config, Error, LinkOptions, Package, link_document};

const CONSTANTS: &str = r#"import { Product, Category } from './types';

export const PRODUCTS: Product[] = [
  {
    id: 101,
    name: 'KIT TOYOTA REVO (Pack Completo)',
    category: Category.KITS,
    image: 'https://picsum.photos/seed/kitrevo/400/400'
  },
  {
    id: 111,
    name: 'Filtro Aire AIP 977 (Toyota Revo)',
    category: Category.FILTROS_AIRE,
    image: 'https://picsum.photos/seed/aip977/400/400'
  },
  {
    id: 113,
    name: 'Filtro Aceite OLP 067 (Toyota Revo)',
    category: Category.FILTROS_ACEITE,
    image: 'https://picsum.photos/seed/olp067/400/400'
  },
  {
    id: 114,
    name: 'Filtro Combustible FLP 476 (Toyota Revo)',
    category: Category.FILTROS_COMBUSTIBLE,
    image: 'https://picsum.photos/seed/flp476/400/400'
  }
];
"#;

fn config(output_dir: &std::path::Path) -> Config {
    let mut config = Config::parse(
        r#"
url_prefix = "/images/products"

[[markers]]
text = "KIT TOYOTA REVO"
id = 101

[[markers]]
text = "AIP 977"
id = 111

[[markers]]
text = "OLP 067"
id = 113

[[markers]]
text = "ZZZ 000"
id = 404
"#,
    )
    .unwrap();
    config.output_dir = Some(output_dir.to_path_buf());
    config
}

fn fixture_docx() -> Vec<u8> {
    docx_with_paragraphs(&[
        para(&[Image("rId3")]),
        para(&[Text("KIT TOYOTA REVO"), Image("rId1")]),
        para(&[Text("AIP 977"), Image("rId2")]),
        para(&[Text("unrelated text")]),
        para(&[Text("OLP 067"), Image("rId3"), Image("rId4")]),
        para(&[Text("ZZZ 000"), Image("rId1")]),
    ])
}

#[test]
fn end_to_end_link() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let docx = dir.path().join("KITS.docx");
    let catalog = dir.path().join("constants.ts");
    let images = dir.path().join("public/images/products");
    fs::write(&docx, fixture_docx()).unwrap();
    fs::write(&catalog, CONSTANTS).unwrap();

    let options = LinkOptions::from_config(&config(&images), false);
    let summary = link_document(&docx, &catalog, &options).unwrap();

    assert_eq!(summary.extraction.paragraphs, 6);
    assert_eq!(summary.extraction.stats.no_context, 1);
    assert_eq!(summary.extraction.stats.saved, 5);
    assert_eq!(summary.report.updated, vec![101, 111, 113]);
    assert_eq!(summary.report.missing, vec![404]);

    let text = fs::read_to_string(&catalog).unwrap();
    assert!(text.contains("image: '/images/products/101.png'"));
    assert!(text.contains("image: '/images/products/111.png'"));
    assert!(text.contains("image: '/images/products/113.jpeg'"));
    assert!(text.contains("image: 'https://picsum.photos/seed/flp476/400/400'"));
    assert!(images.join("113.jpeg").is_file());
    assert!(images.join("404.png").is_file());

    // second run: same images, catalog already patched
    let again = link_document(&docx, &catalog, &options).unwrap();
    assert!(again.report.updated.is_empty());
    assert_eq!(again.report.unchanged, vec![101, 111, 113]);
    assert_eq!(fs::read_to_string(&catalog).unwrap(), text);
}

#[test]
fn missing_catalog_fails_before_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let docx = dir.path().join("KITS.docx");
    let images = dir.path().join("out");
    fs::write(&docx, fixture_docx()).unwrap();

    let options = LinkOptions::from_config(&config(&images), false);
    let result = link_document(&docx, &dir.path().join("missing.ts"), &options);
    assert!(matches!(result, Err(Error::Io(_))));
    assert!(!images.exists());
}

#[test]
fn missing_docx_fails_before_patching() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("constants.ts");
    fs::write(&catalog, CONSTANTS).unwrap();

    let options = LinkOptions::from_config(&config(&dir.path().join("out")), false);
    let result = link_document(&dir.path().join("missing.docx"), &catalog, &options);
    assert!(matches!(result, Err(Error::Io(_))));
    assert_eq!(fs::read_to_string(&catalog).unwrap(), CONSTANTS);
}

#[test]
fn inspect_dump_lists_text_tables_and_images() {
    let body = [
        para(&[Text("KIT TOYOTA REVO"), Image("rId1")]),
        para(&[]),
        "<w:tbl><w:tr><w:tc>".to_string(),
        para(&[Text("Ref")]),
        "</w:tc><w:tc>".to_string(),
        para(&[Text("AIP 977")]),
        "</w:tc></w:tr></w:tbl>".to_string(),
        para(&[Image("rId9")]),
    ]
    .concat();
    let media = common::standard_media();
    let media_refs: Vec<(&str, &[u8])> = media.iter().map(|(n, d)| (*n, d.as_slice())).collect();
    let data = common::build_docx(&body, &common::standard_rels(), &media_refs);
    let mut package = Package::from_bytes(data).unwrap();

    let dump = docx_catalog::inspect::render(&mut package).unwrap();
    assert!(dump.contains("Paragraphs: 5"));
    assert!(dump.contains("[   0] KIT TOYOTA REVO"));
    assert!(dump.contains("image rId1 -> word/media/image1.png"));
    assert!(dump.contains("image rId9 -> (unresolved)"));
    assert!(dump.contains("Row 1: Ref | AIP 977"));
    assert!(dump.contains("Image relationships: 4"));
    assert!(!dump.contains("[   1]"));
}
