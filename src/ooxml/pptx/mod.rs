//! PowerPoint (.pptx) template pipeline.
//!
//! This module turns a designer-authored presentation template plus an
//! ordered list of content records into a new presentation that keeps the
//! template's styling.
//!
//! # Architecture
//!
//! The pipeline runs in stages over one in-memory [`OpcPackage`]:
//! - `resolver`: the layouts a template offers, from a stored manifest or
//!   discovered from the template's slides
//! - `matcher`: the best layout for a record's semantic type
//! - `populate`: the text replacements that fill a layout with a record
//! - `synth`: a cloned template slide with the replacements applied
//! - `reindex`: slide list, relationships, content types and notes made
//!   consistent once all slides exist
//!
//! `author` builds templates from explicit layout definitions and `inspect`
//! summarizes existing decks; both reuse the same shape scanner.
//!
//! # Example
//!
//! ```rust,no_run
//! use slideforge::ooxml::pptx::{ContentSlideRecord, DeckGenerator, DirTemplateStore};
//!
//! let store = DirTemplateStore::new("templates");
//! let records = vec![
//!     ContentSlideRecord::new("title", "Onboarding"),
//!     ContentSlideRecord::new("content", "First week")
//!         .with_lines(["Accounts", "Tools", "Buddy"])
//!         .with_notes("Mention the buddy program"),
//! ];
//!
//! let deck = DeckGenerator::default().generate_from_store(&store, "brand", &records)?;
//! println!("{} slides, {} skipped", deck.slide_count, deck.skipped.len());
//! deck.save("onboarding.pptx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`OpcPackage`]: crate::ooxml::opc::OpcPackage

pub mod author;
pub mod generator;
pub mod inspect;
pub mod manifest;
pub mod matcher;
pub mod notes;
pub mod options;
pub mod populate;
pub mod presentation;
pub mod record;
pub mod reindex;
pub mod resolver;
pub mod shapes;
pub mod store;
pub mod synth;
pub mod template;

#[cfg(test)]
mod tests;

pub use author::{
    AuthoredTemplate, Decoration, LayoutDefinition, PlaceholderSpec, TemplateAuthor, TextAlign,
    definitions_from_yaml,
};
pub use generator::{DeckGenerator, GeneratedDeck, GenerationJob, SkippedRecord};
pub use inspect::{DeckSummary, SlideSummary, inspect, inspect_bytes};
pub use manifest::{LayoutManifest, LayoutManifestEntry, Placeholder, PlaceholderKind};
pub use matcher::{LayoutMatch, MatchRule, match_layout};
pub use options::GeneratorOptions;
pub use populate::{TextReplacement, populate};
pub use record::{ContentSlideRecord, records_from_yaml};
pub use reindex::{ReindexReport, Reindexer, SynthesizedSlide};
pub use resolver::{LayoutStrategy, ResolvedLayouts};
pub use store::{DirTemplateStore, TemplateSource, TemplateStore};
pub use synth::{SkipReason, SlideSynthesizer, TemplateSlides};
