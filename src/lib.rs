//! Slideforge - branded PowerPoint decks from templates and content records
//!
//! This library assembles presentations by populating a designer-authored
//! `.pptx` template with machine-supplied content while keeping the
//! template's styling.
//!
//! # Features
//!
//! - **Layout discovery**: Infer the placeholders of a template from its own
//!   slides, or trust a hand-curated YAML manifest
//! - **Layout matching**: Pick the best layout for each content record
//! - **Slide synthesis**: Clone template slides and substitute `{{TAG}}`
//!   markers and placeholder text, escaping values so parts stay well-formed
//! - **Reindexing**: Keep slide ids, relationships, content types and speaker
//!   notes consistent
//! - **Authoring and inspection**: Build templates from explicit geometry and
//!   summarize existing decks
//!
//! # Example - Generating a deck
//!
//! ```no_run
//! use slideforge::ooxml::pptx::{ContentSlideRecord, DeckGenerator, GeneratorOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = std::fs::read("brand.pptx")?;
//! let records = vec![
//!     ContentSlideRecord::new("title", "Quarterly Review"),
//!     ContentSlideRecord::new("content", "Agenda").with_lines(["Results", "Outlook"]),
//! ];
//!
//! let generator = DeckGenerator::new(GeneratorOptions::default());
//! let deck = generator.generate_from_bytes(&template, &records)?;
//! for skipped in &deck.skipped {
//!     eprintln!("record {} skipped: {}", skipped.index, skipped.reason);
//! }
//! deck.save("review.pptx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Inspecting a deck
//!
//! ```no_run
//! use slideforge::ooxml::pptx::inspect_bytes;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = inspect_bytes(&std::fs::read("review.pptx")?, 80)?;
//! for slide in &summary.slides {
//!     println!("{}: {:?} ({} shapes)", slide.number, slide.title, slide.shape_count);
//! }
//! # Ok(())
//! # }
//! ```

/// Shared XML text utilities
pub mod common;

/// OOXML (Office Open XML) package and presentation support
///
/// This module provides the OPC package store and the presentation
/// template pipeline built on it.
pub mod ooxml;

// Re-export commonly used types for convenience
pub use ooxml::pptx::{ContentSlideRecord, DeckGenerator, GeneratedDeck, GeneratorOptions};
pub use ooxml::{OoxmlError, Result};
