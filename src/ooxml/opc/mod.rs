//! Open Packaging Conventions (OPC) implementation.
//!
//! The part store underneath the presentation pipeline:
//!
//! - Package structure (parts, relationships)
//! - Content type registry
//! - ZIP-based physical packaging with deterministic output
//!
//! XML parts are kept as text and parsed on demand with `quick-xml`; rId and
//! partname suffixes are parsed with `atoi_simd`.

pub mod constants;
pub mod content_types;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use content_types::ContentTypes;
pub use error::{OpcError, Result};
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{Part, PartData};
pub use rel::{Relationship, Relationships};
