//! Restoring cross-part consistency after synthesis.
//!
//! Synthesis only adds slide parts. This pass rewrites everything that
//! refers to slides as a whole: the presentation's slide relationships,
//! `sldIdLst` and section list, the slide content type overrides, notes slides and the slide
//! count in the extended properties. Each step replaces what it owns rather
//! than patching it, so running the pass twice gives the same package.

use crate::common::xml::find_element;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::pptx::notes::{add_notes_slide, clear_notes_slides, ensure_notes_master};
use crate::ooxml::pptx::presentation::{
    MIN_SLIDE_ID, SlideIdEntry, presentation_partname, read_section_slide_ids, read_slide_ids,
    remove_custom_shows, write_section_slide_ids, write_slide_ids,
};

/// An output slide and the speaker notes it should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedSlide {
    pub partname: PackURI,
    pub notes: Option<String>,
}

impl SynthesizedSlide {
    pub fn new(partname: PackURI) -> Self {
        Self { partname, notes: None }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn notes_text(&self) -> Option<&str> {
        self.notes.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// What a reindexing pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReindexReport {
    pub slide_count: usize,
    pub notes_count: usize,
    pub pruned_relationships: usize,
}

/// Rewrites slide bookkeeping of a package.
#[derive(Debug, Clone, Copy)]
pub struct Reindexer {
    emit_notes: bool,
}

impl Default for Reindexer {
    fn default() -> Self {
        Self { emit_notes: true }
    }
}

impl Reindexer {
    pub fn new(emit_notes: bool) -> Self {
        Self { emit_notes }
    }

    /// Make `slides`, in this order, the slides of `package`.
    pub fn run(&self, package: &mut OpcPackage, slides: &[SynthesizedSlide]) -> Result<ReindexReport> {
        for slide in slides {
            package.require_part(slide.partname.as_str())?;
        }

        self.rewrite_slide_list(package, slides)?;
        self.rewrite_content_types(package, slides);
        let notes_count = self.rewrite_notes(package, slides)?;
        refresh_app_properties(package, slides.len(), notes_count)?;
        let pruned_relationships = package.prune_dangling_relationships();

        verify_consistency(package)?;
        log::debug!(
            "reindexed {} slides, {} notes slides, {} dangling relationships dropped",
            slides.len(),
            notes_count,
            pruned_relationships
        );
        Ok(ReindexReport {
            slide_count: slides.len(),
            notes_count,
            pruned_relationships,
        })
    }

    /// Presentation relationships to slides, `sldIdLst` and the section list.
    fn rewrite_slide_list(&self, package: &mut OpcPackage, slides: &[SynthesizedSlide]) -> Result<()> {
        let pres_name = presentation_partname(package)?;
        let pres = package.require_part_mut(pres_name.as_str())?;

        pres.rels_mut().remove_by_type(rt::SLIDE);
        let entries: Vec<SlideIdEntry> = slides
            .iter()
            .zip(MIN_SLIDE_ID..)
            .map(|(slide, id)| SlideIdEntry {
                id,
                r_id: pres.rels_mut().add(rt::SLIDE, &slide.partname),
            })
            .collect();

        let ids: Vec<u32> = entries.iter().map(|e| e.id).collect();
        let xml = write_slide_ids(pres.xml_text()?, &entries)?;
        let xml = write_section_slide_ids(&xml, &ids)?;
        let xml = remove_custom_shows(&xml)?;
        pres.set_xml(xml);
        Ok(())
    }

    fn rewrite_content_types(&self, package: &mut OpcPackage, slides: &[SynthesizedSlide]) {
        let content_types = package.content_types_mut();
        content_types.remove_overrides_with(ct::PML_SLIDE);
        for slide in slides {
            content_types.set_override(slide.partname.as_str(), ct::PML_SLIDE);
        }
    }

    /// Notes slides for slides with notes. The notes master is created only
    /// when at least one slide needs it.
    fn rewrite_notes(&self, package: &mut OpcPackage, slides: &[SynthesizedSlide]) -> Result<usize> {
        clear_notes_slides(package);
        if !self.emit_notes {
            return Ok(0);
        }

        let noted: Vec<(&PackURI, &str)> = slides
            .iter()
            .filter_map(|s| s.notes_text().map(|text| (&s.partname, text)))
            .collect();
        if noted.is_empty() {
            return Ok(0);
        }

        let master = ensure_notes_master(package)?;
        for (slide, text) in &noted {
            add_notes_slide(package, slide, text, &master)?;
        }
        Ok(noted.len())
    }
}

/// Rewrite `<Slides>` and `<Notes>` in `docProps/app.xml` when present.
fn refresh_app_properties(package: &mut OpcPackage, slides: usize, notes: usize) -> Result<()> {
    let Some(app_name) = package
        .rels()
        .by_type(rt::EXTENDED_PROPERTIES)
        .find_map(|rel| rel.target_partname().ok())
    else {
        return Ok(());
    };
    let Some(part) = package.part_mut(app_name.as_str()) else {
        return Ok(());
    };
    let Ok(xml) = part.xml_text() else {
        return Ok(());
    };

    let mut xml = xml.to_string();
    for (element, count) in [(&b"Slides"[..], slides), (&b"Notes"[..], notes)] {
        if let Some(span) = find_element(&xml, element).map_err(OoxmlError::Xml)? {
            if span.is_empty_tag() {
                continue;
            }
            xml.replace_range(span.inner, &count.to_string());
        }
    }
    part.set_xml(xml);
    Ok(())
}

/// Check that slide ids, slide parts and slide overrides agree.
pub fn verify_consistency(package: &OpcPackage) -> Result<()> {
    let pres_name = presentation_partname(package)?;
    let pres = package.require_part(pres_name.as_str())?;

    let ids = read_slide_ids(pres.xml_text()?)?;
    let parts = package
        .iter_parts()
        .filter(|p| p.content_type() == ct::PML_SLIDE)
        .count();
    let overrides = package.content_types().overrides_with(ct::PML_SLIDE).count();
    if ids.len() != parts || parts != overrides {
        return Err(OoxmlError::InconsistentPackage(format!(
            "{} slide ids, {} slide parts, {} slide overrides",
            ids.len(),
            parts,
            overrides
        )));
    }

    for section in read_section_slide_ids(pres.xml_text()?)? {
        if let Some(stale) = section.iter().find(|id| !ids.iter().any(|e| e.id == **id)) {
            return Err(OoxmlError::InconsistentPackage(format!(
                "section lists slide id {} which is not in sldIdLst",
                stale
            )));
        }
    }

    for entry in &ids {
        let rel = pres.rels().get(&entry.r_id).ok_or_else(|| {
            OoxmlError::InconsistentPackage(format!("slide id {} has no relationship {}", entry.id, entry.r_id))
        })?;
        let target = rel.target_partname()?;
        if !package.contains_part(target.as_str()) {
            return Err(OoxmlError::InconsistentPackage(format!(
                "slide id {} points at missing part {}",
                entry.id, target
            )));
        }
    }
    Ok(())
}
