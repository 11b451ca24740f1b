use std::collections::HashMap;

use crate::error::Error;
use crate::model::{Relationship, Relationships};

/// Parse a `.rels` part. Later duplicates of an `Id` replace earlier ones.
pub fn parse_relationships(xml_content: &str) -> Result<Relationships, Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    let mut by_id = HashMap::new();
    for node in xml.root_element().children() {
        if node.tag_name().name() != "Relationship" {
            continue;
        }
        let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target")) else {
            log::debug!("Relationship without Id or Target skipped");
            continue;
        };
        let rel = Relationship {
            id: id.to_string(),
            target: target.to_string(),
            rel_type: node.attribute("Type").unwrap_or("").to_string(),
            external: node.attribute("TargetMode") == Some("External"),
        };
        if by_id.insert(rel.id.clone(), rel).is_some() {
            log::debug!("Duplicate relationship id {id}, keeping the last one");
        }
    }
    Ok(Relationships {
        source_part: String::new(),
        by_id,
    })
}

/// Relationships part for a part like "word/document.xml" → "word/_rels/document.xml.rels"
pub fn rels_part_for(part_path: &str) -> String {
    let (dir, file) = match part_path.rsplit_once('/') {
        Some((d, f)) => (d, f),
        None => ("", part_path),
    };
    if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    }
}
