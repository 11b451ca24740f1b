pub mod associate;
pub mod catalog;
pub mod config;
pub mod docx;
mod error;
pub mod inspect;
pub mod markers;
pub mod model;

pub use associate::{AssociateOptions, AssociateStats, Associator, NamingPolicy};
pub use catalog::{CatalogFormat, PatchReport};
pub use config::Config;
pub use docx::Package;
pub use error::Error;
pub use markers::{ContextTracker, Marker, MarkerTable, MatchOrder};
pub use model::Bindings;

use std::io::{Read, Seek};
use std::path::Path;
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct LinkOptions {
    pub markers: MarkerTable,
    pub associate: AssociateOptions,
    pub catalog: CatalogFormat,
}

impl LinkOptions {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        LinkOptions {
            markers: config.marker_table(),
            associate: config.associate_options(dry_run),
            catalog: config.catalog.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Extraction {
    pub paragraphs: usize,
    pub bindings: Bindings,
    pub stats: AssociateStats,
}

#[derive(Clone, Debug)]
pub struct LinkSummary {
    pub extraction: Extraction,
    pub report: PatchReport,
}

/// Scan the document once, in order, saving each image under the entry in scope.
pub fn extract_bindings<R: Read + Seek>(
    package: &mut Package<R>,
    markers: &MarkerTable,
    options: &AssociateOptions,
) -> Result<Extraction, Error> {
    let rels = package.main_relationships()?;
    let xml = package.main_document_xml()?;
    let paragraphs = docx::scan_paragraphs(&xml)?;

    let mut tracker = ContextTracker::new();
    let mut associator = Associator::new(options.clone());
    for paragraph in &paragraphs {
        let context = tracker.observe(&paragraph.text, markers);
        associator.process(package, &rels, paragraph, context)?;
    }
    let (bindings, stats) = associator.finish();

    Ok(Extraction {
        paragraphs: paragraphs.len(),
        bindings,
        stats,
    })
}

/// Extract images from `docx` and point the matching entries of `catalog` at them.
pub fn link_document(
    docx: &Path,
    catalog: &Path,
    options: &LinkOptions,
) -> Result<LinkSummary, Error> {
    let t0 = Instant::now();

    if !catalog.is_file() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("catalog not found: {}", catalog.display()),
        )));
    }
    let mut package = Package::open(docx)?;

    let extraction = extract_bindings(&mut package, &options.markers, &options.associate)?;
    let t_extract = t0.elapsed();

    let report = catalog::patch_catalog_file(
        catalog,
        &extraction.bindings,
        &options.catalog,
        options.associate.dry_run,
    )?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: extract={:.1}ms, patch={:.1}ms, total={:.1}ms ({} paragraphs, {} images saved)",
        t_extract.as_secs_f64() * 1000.0,
        (t_total - t_extract).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        extraction.paragraphs,
        extraction.stats.saved,
    );

    Ok(LinkSummary { extraction, report })
}
