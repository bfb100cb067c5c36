//! Helpers for the presentation part (`/ppt/presentation.xml`).
//!
//! The part is edited as text: only the id lists this crate owns are
//! rewritten, everything else is carried over byte for byte. Slide ids also
//! appear in the section list extension (`p14:sectionLst`), which is
//! remapped, and in custom shows, which are removed.

use crate::common::xml::{
    ElementSpan, find_element, find_elements, find_prefixed_element, qualified, root_prefix, root_start_tag,
};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::pptx::resolver::{SLIDE_STEM, SLIDES_DIR};
use crate::ooxml::pptx::shapes::attr;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

/// Smallest valid slide id.
pub const MIN_SLIDE_ID: u32 = 256;

/// Elements that precede `sldIdLst` in a presentation, in schema order.
const BEFORE_SLIDE_IDS: [&[u8]; 3] = [b"sldMasterIdLst", b"notesMasterIdLst", b"handoutMasterIdLst"];

/// Elements that precede `notesMasterIdLst`.
const BEFORE_NOTES_MASTER_IDS: [&[u8]; 1] = [b"sldMasterIdLst"];

/// One `<p:sldId>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideIdEntry {
    pub id: u32,
    pub r_id: String,
}

/// Whether a main document content type is a presentation (or a template
/// or macro-enabled presentation, which are treated the same).
pub fn is_presentation_content_type(content_type: &str) -> bool {
    matches!(
        content_type,
        ct::PML_PRESENTATION_MAIN | ct::PML_TEMPLATE_MAIN | ct::PML_PRES_MACRO_MAIN
    )
}

/// Partname of the presentation part, checking that it is one.
pub fn presentation_partname(package: &OpcPackage) -> Result<PackURI> {
    let partname = package.main_document_partname()?;
    let content_type = package.require_part(partname.as_str())?.content_type();
    if !is_presentation_content_type(content_type) {
        return Err(OoxmlError::InvalidTemplate(format!(
            "main document {} is {}, not a presentation",
            partname, content_type
        )));
    }
    Ok(partname)
}

/// Entries of `sldIdLst`, in order.
pub fn read_slide_ids(xml: &str) -> Result<Vec<SlideIdEntry>> {
    let prefix = root_prefix(xml).map_err(OoxmlError::Xml)?;
    let Some(span) = find_prefixed_element(xml, prefix.as_deref(), b"sldIdLst").map_err(OoxmlError::Xml)? else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    let mut reader = Reader::from_reader(xml[span.inner].as_bytes());
    loop {
        match reader.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e) if e.local_name().as_ref() == b"sldId" => {
                let id = attr(e, b"id")?
                    .and_then(|v| atoi_simd::parse::<u32, false, false>(v.as_bytes()).ok());
                // The relationship id is the only `id` attribute in the r: namespace.
                let r_id = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() != b"id" && a.key.local_name().as_ref() == b"id")
                    .and_then(|a| std::str::from_utf8(&a.value).ok().map(str::to_string));
                if let (Some(id), Some(r_id)) = (id, r_id) {
                    entries.push(SlideIdEntry { id, r_id });
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }
    Ok(entries)
}

/// Replace `sldIdLst` with `entries`; an empty list removes the element.
pub fn write_slide_ids(xml: &str, entries: &[SlideIdEntry]) -> Result<String> {
    let prefix = root_prefix(xml).map_err(OoxmlError::Xml)?;
    let p = prefix.as_deref();

    let mut markup = String::new();
    if !entries.is_empty() {
        let _ = write!(markup, "<{}>", qualified(p, "sldIdLst"));
        for entry in entries {
            let _ = write!(
                markup,
                r#"<{} id="{}" r:id="{}"/>"#,
                qualified(p, "sldId"),
                entry.id,
                entry.r_id
            );
        }
        let _ = write!(markup, "</{}>", qualified(p, "sldIdLst"));
    }

    replace_or_insert(xml, b"sldIdLst", &markup, &BEFORE_SLIDE_IDS)
}

/// Slide ids listed by the sections of `p14:sectionLst`, section by section.
pub fn read_section_slide_ids(xml: &str) -> Result<Vec<Vec<u32>>> {
    let Some(sections) = find_element(xml, b"sectionLst").map_err(OoxmlError::Xml)? else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for list in section_id_lists(xml, &sections.outer)? {
        let mut ids = Vec::new();
        let mut reader = Reader::from_reader(xml[list.inner].as_bytes());
        loop {
            match reader.read_event()? {
                Event::Empty(ref e) | Event::Start(ref e) if e.local_name().as_ref() == b"sldId" => {
                    if let Some(id) = attr(e, b"id")?
                        .and_then(|v| atoi_simd::parse::<u32, false, false>(v.as_bytes()).ok())
                    {
                        ids.push(id);
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }
        out.push(ids);
    }
    Ok(out)
}

/// Point every section of `p14:sectionLst` at the new slide ids.
///
/// The first section takes all of `ids`; later sections keep their names
/// and become empty. A presentation without sections is returned as is.
pub fn write_section_slide_ids(xml: &str, ids: &[u32]) -> Result<String> {
    let Some(sections) = find_element(xml, b"sectionLst").map_err(OoxmlError::Xml)? else {
        return Ok(xml.to_string());
    };
    let lists = section_id_lists(xml, &sections.outer)?;

    let mut out = xml.to_string();
    for (n, list) in lists.iter().enumerate().rev() {
        let p = list.prefix.as_deref();
        let markup = if n == 0 && !ids.is_empty() {
            let mut markup = format!("<{}>", qualified(p, "sldIdLst"));
            for id in ids {
                let _ = write!(markup, r#"<{} id="{}"/>"#, qualified(p, "sldId"), id);
            }
            let _ = write!(markup, "</{}>", qualified(p, "sldIdLst"));
            markup
        } else {
            format!("<{}/>", qualified(p, "sldIdLst"))
        };
        out.replace_range(list.outer.clone(), &markup);
    }
    Ok(out)
}

/// The `sldIdLst` of each section inside the section list at `range`.
fn section_id_lists(xml: &str, range: &std::ops::Range<usize>) -> Result<Vec<ElementSpan>> {
    Ok(find_elements(xml, b"sldIdLst")
        .map_err(OoxmlError::Xml)?
        .into_iter()
        .filter(|span| span.outer.start >= range.start && span.outer.end <= range.end)
        .collect())
}

/// Remove `custShowLst`. Custom shows name slides through relationships
/// of the template's own slides, which do not survive generation.
pub fn remove_custom_shows(xml: &str) -> Result<String> {
    let prefix = root_prefix(xml).map_err(OoxmlError::Xml)?;
    match find_prefixed_element(xml, prefix.as_deref(), b"custShowLst").map_err(OoxmlError::Xml)? {
        Some(span) => {
            log::debug!("dropping custom shows of the template");
            let mut out = xml.to_string();
            out.replace_range(span.outer, "");
            Ok(out)
        },
        None => Ok(xml.to_string()),
    }
}

/// Point `notesMasterIdLst` at the notes master with relationship `r_id`.
pub fn write_notes_master_id(xml: &str, r_id: &str) -> Result<String> {
    let prefix = root_prefix(xml).map_err(OoxmlError::Xml)?;
    let p = prefix.as_deref();
    let markup = format!(
        r#"<{list}><{item} r:id="{r_id}"/></{list}>"#,
        list = qualified(p, "notesMasterIdLst"),
        item = qualified(p, "notesMasterId"),
    );
    replace_or_insert(xml, b"notesMasterIdLst", &markup, &BEFORE_NOTES_MASTER_IDS)
}

/// Replace element `local` with `markup`, or insert `markup` after the last
/// present element of `after`, or right after the root start tag.
fn replace_or_insert(xml: &str, local: &[u8], markup: &str, after: &[&[u8]]) -> Result<String> {
    let prefix = root_prefix(xml).map_err(OoxmlError::Xml)?;
    let find = |name: &[u8]| find_prefixed_element(xml, prefix.as_deref(), name).map_err(OoxmlError::Xml);
    let mut out = String::with_capacity(xml.len() + markup.len());

    if let Some(span) = find(local)? {
        out.push_str(&xml[..span.outer.start]);
        out.push_str(markup);
        out.push_str(&xml[span.outer.end..]);
        return Ok(out);
    }
    if markup.is_empty() {
        return Ok(xml.to_string());
    }

    let mut at = None;
    for name in after.iter().rev() {
        if let Some(span) = find(name)? {
            at = Some(span.outer.end);
            break;
        }
    }
    let at = match at {
        Some(at) => at,
        None => {
            root_start_tag(xml)
                .map_err(OoxmlError::Xml)?
                .ok_or_else(|| OoxmlError::Xml("presentation has no root element".to_string()))?
                .end
        },
    };

    out.push_str(&xml[..at]);
    out.push_str(markup);
    out.push_str(&xml[at..]);
    Ok(out)
}

/// Slide partnames in presentation order.
///
/// Follows `sldIdLst` through the presentation's relationships; slides the
/// list does not mention are appended in slide-number order.
pub fn ordered_slide_partnames(package: &OpcPackage) -> Result<Vec<PackURI>> {
    let pres_name = presentation_partname(package)?;
    let pres = package.require_part(pres_name.as_str())?;

    let mut ordered: Vec<PackURI> = Vec::new();
    for entry in read_slide_ids(pres.xml_text()?)? {
        let Some(rel) = pres.rels().get(&entry.r_id) else {
            log::warn!("slide id {} refers to unknown relationship {}", entry.id, entry.r_id);
            continue;
        };
        if rel.reltype() != rt::SLIDE {
            continue;
        }
        let target = rel.target_partname()?;
        if package.contains_part(target.as_str()) && !ordered.contains(&target) {
            ordered.push(target);
        }
    }

    for (_, partname) in package.numbered_parts(SLIDES_DIR, SLIDE_STEM) {
        if !ordered.contains(&partname) {
            ordered.push(partname);
        }
    }
    Ok(ordered)
}
