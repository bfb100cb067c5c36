//! Deck generation: template plus content records in, presentation bytes out.
//!
//! One call loads its own package from the template bytes, resolves the
//! layouts, synthesizes a slide per record in input order, reindexes once
//! and serializes once. Problems with a single record skip that record;
//! problems with the template abort the call.
//!
//! # Examples
//!
//! ```no_run
//! use slideforge::ooxml::pptx::{ContentSlideRecord, DeckGenerator, GeneratorOptions, TemplateSource};
//!
//! let bytes = std::fs::read("brand.pptx").unwrap();
//! let records = vec![
//!     ContentSlideRecord::new("title", "Quarterly Review"),
//!     ContentSlideRecord::new("content", "Agenda").with_lines(["Results", "Outlook"]),
//! ];
//!
//! let deck = DeckGenerator::new(GeneratorOptions::default())
//!     .generate(&TemplateSource::from_bytes(bytes), &records)
//!     .unwrap();
//! assert_eq!(deck.slide_count + deck.skipped.len(), records.len());
//! std::fs::write("review.pptx", &deck.bytes).unwrap();
//! ```

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::{OpcPackage, Part};
use crate::ooxml::pptx::matcher::match_layout;
use crate::ooxml::pptx::options::GeneratorOptions;
use crate::ooxml::pptx::populate::populate;
use crate::ooxml::pptx::presentation::presentation_partname;
use crate::ooxml::pptx::record::ContentSlideRecord;
use crate::ooxml::pptx::reindex::{Reindexer, SynthesizedSlide};
use crate::ooxml::pptx::store::{TemplateSource, TemplateStore};
use crate::ooxml::pptx::synth::{SkipReason, SlideSynthesizer, TemplateSlides};
use rayon::prelude::*;
use std::path::Path;

/// A record that produced no slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the input
    pub index: usize,
    pub semantic_type: String,
    pub reason: SkipReason,
}

/// Output of one generation call.
#[derive(Debug, Clone)]
pub struct GeneratedDeck {
    pub bytes: Vec<u8>,
    pub slide_count: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl GeneratedDeck {
    /// Whether every record produced a slide.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// One independent generation for [`DeckGenerator::generate_batch`].
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub source: TemplateSource,
    pub records: Vec<ContentSlideRecord>,
}

/// Renders content records into presentations.
#[derive(Debug, Clone, Default)]
pub struct DeckGenerator {
    options: GeneratorOptions,
}

impl DeckGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Render `records` with the template in `source`.
    ///
    /// # Errors
    /// Fails when the template is not a readable presentation or has no
    /// layouts. Records whose layout cannot be synthesized are reported in
    /// [`GeneratedDeck::skipped`] instead.
    pub fn generate(&self, source: &TemplateSource, records: &[ContentSlideRecord]) -> Result<GeneratedDeck> {
        let mut package = OpcPackage::from_bytes(&source.bytes)?;
        as_presentation(&mut package)?;

        let layouts = source.strategy().resolve(&package)?;
        log::debug!(
            "template '{}': {} layouts ({})",
            source.label(),
            layouts.len(),
            if source.manifest.is_some() { "manifest" } else { "discovered" }
        );

        let template = TemplateSlides::take(&mut package)?;
        let synthesizer = SlideSynthesizer::new(&template);
        let options = &self.options;

        let mut slides: Vec<SynthesizedSlide> = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let matched = match_layout(&layouts, &record.semantic_type, &options.default_aliases);
            log::debug!(
                "record {} ({}) -> layout '{}' by {:?}",
                index,
                record.semantic_type,
                matched.entry.name,
                matched.rule
            );

            let replacements = populate(matched.entry, record, &options.body_separator);
            for replacement in &replacements {
                log::trace!("  {:?} -> {:?}", replacement.tag, replacement.value);
            }

            let output_index = slides.len() as u32 + 1;
            match synthesizer.synthesize(matched.entry, &replacements, output_index) {
                Ok(part) => {
                    let notes = if record.has_notes() {
                        record.notes.clone()
                    } else if !options.drop_template_notes {
                        template.notes_text(matched.entry.source_slide).map(str::to_string)
                    } else {
                        None
                    };
                    slides.push(SynthesizedSlide {
                        partname: part.partname().clone(),
                        notes,
                    });
                    package.put_part(part);
                },
                Err(reason) => {
                    log::warn!("skipping record {} ({}): {}", index, record.semantic_type, reason);
                    skipped.push(SkippedRecord {
                        index,
                        semantic_type: record.semantic_type.clone(),
                        reason,
                    });
                },
            }
        }

        let report = Reindexer::new(options.emit_notes).run(&mut package, &slides)?;
        let bytes = package.to_bytes()?;
        log::debug!(
            "generated {} slides ({} skipped, {} with notes), {} bytes",
            report.slide_count,
            skipped.len(),
            report.notes_count,
            bytes.len()
        );

        Ok(GeneratedDeck {
            bytes,
            slide_count: report.slide_count,
            skipped,
        })
    }

    /// Render with raw template bytes; layouts are discovered.
    pub fn generate_from_bytes(&self, template: &[u8], records: &[ContentSlideRecord]) -> Result<GeneratedDeck> {
        self.generate(&TemplateSource::from_bytes(template), records)
    }

    /// Render with the stored template `id`.
    pub fn generate_from_store(
        &self,
        store: &dyn TemplateStore,
        id: &str,
        records: &[ContentSlideRecord],
    ) -> Result<GeneratedDeck> {
        self.generate(&store.load(id)?, records)
    }

    /// Render independent jobs in parallel. Results are in job order.
    pub fn generate_batch(&self, jobs: &[GenerationJob]) -> Vec<Result<GeneratedDeck>> {
        jobs.par_iter()
            .map(|job| self.generate(&job.source, &job.records))
            .collect()
    }
}

/// Check that the package is a presentation and make a template (`.potx`)
/// into an ordinary presentation.
fn as_presentation(package: &mut OpcPackage) -> Result<()> {
    let pres_name = presentation_partname(package)?;
    let pres = package.require_part(pres_name.as_str())?;
    if pres.content_type() != ct::PML_TEMPLATE_MAIN {
        return Ok(());
    }

    let mut converted = Part::xml(pres_name.clone(), ct::PML_PRESENTATION_MAIN, pres.xml_text()?);
    converted.set_rels(pres.rels().clone());
    package.put_part(converted);
    log::debug!("converting template main part {} to a presentation", pres_name);
    Ok(())
}
