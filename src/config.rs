//! Run configuration, read from a TOML file.
//!
//! CLI flags override config file values, which override defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::associate::{AssociateOptions, NamingPolicy};
use crate::catalog::CatalogFormat;
use crate::error::Error;
use crate::markers::{Marker, MarkerTable, MatchOrder};

/// Default directory for extracted images.
pub const DEFAULT_OUTPUT_DIR: &str = "images";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output_dir: Option<PathBuf>,
    pub url_prefix: Option<String>,
    pub naming: NamingPolicy,
    pub match_order: MatchOrder,
    pub catalog: CatalogFormat,
    /// Search text → entry id, in declaration order.
    pub markers: Vec<Marker>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_at(e, path))?;
        let config = Self::parse(&content)?;
        log::debug!(
            "Loaded config {} ({} markers)",
            path.display(),
            config.markers.len()
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.catalog.id_field.trim().is_empty() || self.catalog.image_field.trim().is_empty() {
            return Err(Error::Config("catalog field names must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for marker in &self.markers {
            if !seen.insert(marker.text.to_lowercase()) {
                log::warn!(
                    "Marker {:?} is listed more than once; only the first can match",
                    marker.text
                );
            }
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn marker_table(&self) -> MarkerTable {
        MarkerTable::new(self.markers.clone(), self.match_order)
    }

    pub fn associate_options(&self, dry_run: bool) -> AssociateOptions {
        AssociateOptions {
            output_dir: self.output_dir(),
            naming: self.naming,
            url_prefix: self.url_prefix.clone(),
            dry_run,
        }
    }
}

/// Parse a `TEXT=ID` marker given on the command line. The last `=` separates the id.
pub fn parse_marker_arg(arg: &str) -> Result<Marker, Error> {
    let (text, id) = arg
        .rsplit_once('=')
        .ok_or_else(|| Error::Config(format!("marker {arg:?} is not TEXT=ID")))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|_| Error::Config(format!("marker {arg:?} has a non-numeric id")))?;
    if text.trim().is_empty() {
        return Err(Error::Config(format!("marker {arg:?} has empty text")));
    }
    Ok(Marker {
        text: text.trim().to_string(),
        id,
    })
}
