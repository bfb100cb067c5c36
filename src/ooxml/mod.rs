//! Office Open XML (OOXML) presentation templating.
//!
//! The implementation is based on the Open Packaging Conventions (OPC):
//! a presentation is a zip of XML parts tied together by relationships and
//! a content type registry.
//!
//! # Architecture
//!
//! The module is organized into two layers:
//!
//! 1. **OPC Layer** (`opc`): Low-level package handling (ZIP, parts, relationships)
//! 2. **Presentation Layer** (`pptx`): Layout resolution, slide synthesis,
//!    reindexing, template authoring and inspection
//!
//! # Example: Generating a Deck
//!
//! ```rust,no_run
//! use slideforge::ooxml::pptx::{ContentSlideRecord, DeckGenerator};
//!
//! let template = std::fs::read("brand.pptx")?;
//! let deck = DeckGenerator::default().generate_from_bytes(
//!     &template,
//!     &[ContentSlideRecord::new("title", "Hello")],
//! )?;
//! std::fs::write("hello.pptx", &deck.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod error;
pub mod opc;
pub mod pptx;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{OoxmlError, Result};
