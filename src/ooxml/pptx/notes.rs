//! Speaker notes parts.
//!
//! A presentation has at most one notes master. Each notes slide points at
//! the master and back at its slide; the slide points at the notes slide.

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI, Part};
use crate::ooxml::pptx::presentation::{presentation_partname, write_notes_master_id};
use crate::ooxml::pptx::synth::{NOTES_SLIDE_STEM, NOTES_SLIDES_DIR};
use crate::ooxml::pptx::template::{notes_master_xml, notes_slide_xml, theme_xml};

const NOTES_MASTER_TEMPLATE: &str = "/ppt/notesMasters/notesMaster%d.xml";
const NOTES_SLIDE_TEMPLATE: &str = "/ppt/notesSlides/notesSlide%d.xml";
const THEME_TEMPLATE: &str = "/ppt/theme/theme%d.xml";

/// The presentation's notes master, created on first use.
///
/// An existing master referenced by the presentation is reused. A new one
/// comes with its own theme part.
pub fn ensure_notes_master(package: &mut OpcPackage) -> Result<PackURI> {
    let pres_name = presentation_partname(package)?;

    let existing = package
        .require_part(pres_name.as_str())?
        .rels()
        .by_type(rt::NOTES_MASTER)
        .filter_map(|rel| rel.target_partname().ok())
        .find(|target| package.contains_part(target.as_str()));
    if let Some(master) = existing {
        return Ok(master);
    }

    let theme_name = package.next_partname(THEME_TEMPLATE)?;
    package.put_part(Part::xml(theme_name.clone(), ct::OFC_THEME, theme_xml("Notes Theme")));

    let master_name = package.next_partname(NOTES_MASTER_TEMPLATE)?;
    let mut master = Part::xml(master_name.clone(), ct::PML_NOTES_MASTER, notes_master_xml());
    master.rels_mut().add(rt::THEME, &theme_name);
    package.put_part(master);

    let pres = package.require_part_mut(pres_name.as_str())?;
    let r_id = pres.rels_mut().add(rt::NOTES_MASTER, &master_name);
    let xml = write_notes_master_id(pres.xml_text()?, &r_id)?;
    pres.set_xml(xml);

    log::debug!("created notes master {} with theme {}", master_name, theme_name);
    Ok(master_name)
}

/// Create a notes slide for `slide` holding `text`.
pub fn add_notes_slide(
    package: &mut OpcPackage,
    slide: &PackURI,
    text: &str,
    master: &PackURI,
) -> Result<PackURI> {
    let notes_name = package.next_partname(NOTES_SLIDE_TEMPLATE)?;
    let mut notes = Part::xml(notes_name.clone(), ct::PML_NOTES_SLIDE, notes_slide_xml(text));
    notes.rels_mut().add(rt::NOTES_MASTER, master);
    notes.rels_mut().add(rt::SLIDE, slide);

    package
        .require_part_mut(slide.as_str())?
        .rels_mut()
        .add(rt::NOTES_SLIDE, &notes_name);
    package.put_part(notes);
    Ok(notes_name)
}

/// Remove all notes slides and every slide's edge to them.
///
/// Returns how many notes slides were removed.
pub fn clear_notes_slides(package: &mut OpcPackage) -> usize {
    let notes = package.numbered_parts(NOTES_SLIDES_DIR, NOTES_SLIDE_STEM);
    for (_, partname) in &notes {
        package.remove_part(partname.as_str());
    }

    let slides: Vec<PackURI> = package
        .iter_parts()
        .filter(|p| p.content_type() == ct::PML_SLIDE)
        .map(|p| p.partname().clone())
        .collect();
    for slide in slides {
        if let Some(part) = package.part_mut(slide.as_str()) {
            part.rels_mut().remove_by_type(rt::NOTES_SLIDE);
        }
    }
    notes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::shapes::scan_shapes;
    use crate::ooxml::pptx::template::{presentation_xml, slide_xml};

    fn package_with_slide() -> OpcPackage {
        let mut package = OpcPackage::new();
        let pres_name = PackURI::new("/ppt/presentation.xml").unwrap();
        let mut pres = Part::xml(pres_name.clone(), ct::PML_PRESENTATION_MAIN, presentation_xml("rId1", &[], 100, 100));
        pres.rels_mut()
            .add_relationship(rt::SLIDE_MASTER, "slideMasters/slideMaster1.xml", "rId1", false);
        package.put_part(pres);
        package.rels_mut().add(rt::OFFICE_DOCUMENT, &pres_name);

        let slide = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        package.put_part(Part::xml(slide, ct::PML_SLIDE, slide_xml("s", "")));
        package
    }

    #[test]
    fn test_notes_master_created_once() {
        let mut package = package_with_slide();
        let first = ensure_notes_master(&mut package).unwrap();
        let second = ensure_notes_master(&mut package).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_str(), "/ppt/notesMasters/notesMaster1.xml");
        assert_eq!(package.numbered_parts("/ppt/notesMasters", "notesMaster").len(), 1);

        let pres = package.part("/ppt/presentation.xml").unwrap();
        assert_eq!(pres.rels().by_type(rt::NOTES_MASTER).count(), 1);
        assert!(pres.xml_text().unwrap().contains(r#"<p:notesMasterIdLst><p:notesMasterId r:id="rId2"/></p:notesMasterIdLst>"#));
        let master = package.part(first.as_str()).unwrap();
        assert!(package.contains_part(master.rels().part_with_reltype(rt::THEME).unwrap().target_partname().unwrap().as_str()));
    }

    #[test]
    fn test_add_and_clear_notes_slide() {
        let mut package = package_with_slide();
        let master = ensure_notes_master(&mut package).unwrap();
        let slide = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        let notes = add_notes_slide(&mut package, &slide, "Remember & smile", &master).unwrap();

        let part = package.part(notes.as_str()).unwrap();
        assert_eq!(part.rels().len(), 2);
        assert_eq!(
            part.rels().part_with_reltype(rt::SLIDE).unwrap().target_ref(),
            "../slides/slide1.xml"
        );
        let tree = scan_shapes(part.xml_text().unwrap()).unwrap();
        assert_eq!(tree.first_placeholder(&["body"]).unwrap().text(), "Remember & smile");

        let slide_part = package.part(slide.as_str()).unwrap();
        assert_eq!(slide_part.rels().by_type(rt::NOTES_SLIDE).count(), 1);

        assert_eq!(clear_notes_slides(&mut package), 1);
        assert!(!package.contains_part(notes.as_str()));
        assert_eq!(package.part(slide.as_str()).unwrap().rels().len(), 0);
    }
}
