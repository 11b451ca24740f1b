use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid DOCX: {0}")]
    InvalidDocx(String),
    #[error("missing part in DOCX: {0}")]
    MissingPart(String),
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Wrap an I/O error so the message names the file it happened on.
    pub(crate) fn io_at(e: std::io::Error, path: &Path) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        }
    }
}
