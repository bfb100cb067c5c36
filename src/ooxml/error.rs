//! Error types for the presentation pipeline.

use thiserror::Error;

/// Result type for presentation operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Errors that abort a whole generation, authoring or inspection call.
///
/// Problems confined to a single content record are not errors; they are
/// reported as skipped records on the generated deck.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] crate::ooxml::opc::error::OpcError),

    /// Neither the manifest nor discovery produced a single layout
    #[error("No layouts found in template: {0}")]
    NoLayouts(String),

    /// The template store has no template with this id
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// A layout manifest or options document could not be read or written
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Template bytes are a package but not a usable presentation
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// An authored template does not resolve to the layouts it was built from
    #[error("Inconsistent template: {0}")]
    InconsistentTemplate(String),

    /// Slide ids, slide parts and slide content types disagree after reindexing
    #[error("Inconsistent package: {0}")]
    InconsistentPackage(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}
