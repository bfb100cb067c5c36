//! Layout manifest resolution.
//!
//! A template's layouts come either from a pre-authored manifest, trusted
//! verbatim, or from heuristic discovery over the template's own slides.
//! Both paths produce the same [`ResolvedLayouts`], which is never empty.

use crate::common::xml::contains_tag;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::pptx::manifest::{LayoutManifest, LayoutManifestEntry, Placeholder};
use crate::ooxml::pptx::shapes::{ShapeTree, scan_shapes};
use std::collections::HashMap;

/// Directory and file stem of slide parts.
pub const SLIDES_DIR: &str = "/ppt/slides";
pub const SLIDE_STEM: &str = "slide";

/// Partname of template slide N.
pub fn slide_partname(n: u32) -> Result<PackURI> {
    Ok(PackURI::new(format!("{}/{}{}.xml", SLIDES_DIR, SLIDE_STEM, n))?)
}

/// How the layouts of a template are obtained.
#[derive(Debug, Clone)]
pub enum LayoutStrategy {
    /// Use a hand-curated manifest as is
    Manifest(LayoutManifest),
    /// Discover layouts from the template's slides
    Heuristic,
}

impl LayoutStrategy {
    /// Resolve the layouts of `package`.
    ///
    /// # Errors
    /// [`OoxmlError::NoLayouts`] when the result would be empty.
    pub fn resolve(&self, package: &OpcPackage) -> Result<ResolvedLayouts> {
        let layouts = match self {
            LayoutStrategy::Manifest(manifest) => {
                manifest.validate()?;
                log::debug!("using manifest with {} layouts", manifest.len());
                manifest.layouts.clone()
            },
            LayoutStrategy::Heuristic => discover_layouts(package)?,
        };
        ResolvedLayouts::new(layouts)
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, LayoutStrategy::Heuristic)
    }
}

/// A non-empty list of layouts in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayouts(Vec<LayoutManifestEntry>);

// Never empty: `new` rejects an empty list.
#[allow(clippy::len_without_is_empty)]
impl ResolvedLayouts {
    /// Wrap a list of layouts, rejecting an empty one.
    pub fn new(layouts: Vec<LayoutManifestEntry>) -> Result<Self> {
        if layouts.is_empty() {
            return Err(OoxmlError::NoLayouts(
                "neither a manifest nor the template's slides define any layout".to_string(),
            ));
        }
        Ok(Self(layouts))
    }

    #[inline]
    pub fn entries(&self) -> &[LayoutManifestEntry] {
        &self.0
    }

    /// The first layout; always present.
    #[inline]
    pub fn first(&self) -> &LayoutManifestEntry {
        &self.0[0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutManifestEntry> {
        self.0.iter()
    }

    /// Turn the resolved layouts into a manifest, e.g. for curation.
    pub fn into_manifest(self) -> LayoutManifest {
        LayoutManifest::new(self.0)
    }
}

/// Discover layouts from the slides of a template.
///
/// Slides are visited in ascending slide number. A slide becomes a layout
/// when it has at least one placeholder; its name is the slide's own name,
/// else its slide layout's name, else `slideN`, made unique with a ` (k)`
/// suffix.
pub fn discover_layouts(package: &OpcPackage) -> Result<Vec<LayoutManifestEntry>> {
    let mut layouts: Vec<LayoutManifestEntry> = Vec::new();

    for (n, partname) in package.numbered_parts(SLIDES_DIR, SLIDE_STEM) {
        let part = package.require_part(partname.as_str())?;
        let tree = scan_shapes(part.xml_text()?)?;
        let placeholders = placeholders_from_tree(&tree);
        if placeholders.is_empty() {
            log::debug!("slide {} has no placeholders, not a layout", n);
            continue;
        }

        let (layout_name, layout_type) = slide_layout_info(package, part.rels())?;
        let base = tree
            .name
            .clone()
            .or(layout_name)
            .unwrap_or_else(|| format!("slide{}", n));
        let name = unique_name(&layouts, base);

        log::debug!(
            "discovered layout '{}' on slide {} with {} placeholders",
            name,
            n,
            placeholders.len()
        );
        layouts.push(LayoutManifestEntry {
            name,
            source_slide: n,
            layout_type,
            default: false,
            placeholders: placeholders.into_iter().map(|(_, ph)| ph).collect(),
        });
    }

    Ok(layouts)
}

/// Placeholders of a shape tree, paired with the index of their shape.
///
/// A shape declaring `<p:ph>` is a structural placeholder; a plain shape
/// whose text contains a `{{NAME}}` tag is a pattern placeholder of type
/// `textbox`; any other shape is decoration. When a type occurs more than
/// once, members without an explicit `idx` get the next free one.
pub fn placeholders_from_tree(tree: &ShapeTree) -> Vec<(usize, Placeholder)> {
    let mut found: Vec<(usize, Placeholder)> = Vec::new();

    for (i, shape) in tree.shapes.iter().enumerate() {
        let text = shape.text();
        let mut placeholder = match &shape.placeholder {
            Some(ph) => Placeholder::structural(ph.ph_type.clone(), ph.idx),
            None if contains_tag(&text) => Placeholder::pattern(text.clone()),
            None => continue,
        };
        if !text.is_empty() {
            placeholder.default_text = Some(text);
        }
        placeholder.geometry = shape.geometry;
        found.push((i, placeholder));
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for (_, ph) in &found {
        *counts.entry(ph.ph_type.clone()).or_default() += 1;
    }
    for (ph_type, count) in counts {
        if count < 2 {
            continue;
        }
        let mut next = found
            .iter()
            .filter(|(_, ph)| ph.ph_type == ph_type)
            .filter_map(|(_, ph)| ph.idx)
            .max()
            .map_or(1, |max| max + 1);
        for (_, ph) in found.iter_mut().filter(|(_, ph)| ph.ph_type == ph_type) {
            if ph.idx.is_none() {
                ph.idx = Some(next);
                next += 1;
            }
        }
    }

    found
}

/// Name (`cSld/@name`) and `type` of the slide layout a slide uses.
fn slide_layout_info(
    package: &OpcPackage,
    rels: &crate::ooxml::opc::Relationships,
) -> Result<(Option<String>, Option<String>)> {
    let Some(rel) = rels.by_type(rt::SLIDE_LAYOUT).next() else {
        return Ok((None, None));
    };
    let partname = rel.target_partname()?;
    let Some(layout) = package.part(partname.as_str()) else {
        log::warn!("slide layout {} is missing", partname);
        return Ok((None, None));
    };

    let xml = layout.xml_text()?;
    let name = scan_shapes(xml)?.name;
    let layout_type = root_attr(xml, b"type")?;
    Ok((name, layout_type))
}

/// Attribute of the document's root element.
pub(crate) fn root_attr(xml: &str, local: &[u8]) -> Result<Option<String>> {
    let range = crate::common::xml::root_start_tag(xml)
        .map_err(OoxmlError::Xml)?
        .ok_or_else(|| OoxmlError::Xml("document has no root element".to_string()))?;
    let mut reader = quick_xml::Reader::from_reader(xml[range].as_bytes());
    loop {
        match reader.read_event()? {
            quick_xml::events::Event::Start(ref e) | quick_xml::events::Event::Empty(ref e) => {
                return crate::ooxml::pptx::shapes::attr(e, local);
            },
            quick_xml::events::Event::Eof => return Ok(None),
            _ => {},
        }
    }
}

fn unique_name(existing: &[LayoutManifestEntry], base: String) -> String {
    if !existing.iter().any(|e| e.name == base) {
        return base;
    }
    (2..)
        .map(|k| format!("{} ({})", base, k))
        .find(|candidate| !existing.iter().any(|e| &e.name == candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::manifest::{PlaceholderKind, TEXTBOX_TYPE};

    fn tree(xml_shapes: &str) -> ShapeTree {
        let xml = format!(
            r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
            xml_shapes
        );
        scan_shapes(&xml).unwrap()
    }

    fn sp(nv: &str, text: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="9" name="s"/><p:cNvSpPr/><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            nv, text
        )
    }

    #[test]
    fn test_structural_pattern_and_decoration() {
        let shapes = [
            sp(r#"<p:ph type="title"/>"#, "Welcome"),
            sp("", "{{QUOTE}}"),
            sp("", "Just a label"),
        ]
        .concat();
        let found = placeholders_from_tree(&tree(&shapes));
        assert_eq!(found.len(), 2);

        assert_eq!(found[0].0, 0);
        assert_eq!(found[0].1.ph_type, "title");
        assert_eq!(found[0].1.kind, PlaceholderKind::Structural);
        assert_eq!(found[0].1.default_text.as_deref(), Some("Welcome"));

        assert_eq!(found[1].0, 1);
        assert_eq!(found[1].1.ph_type, TEXTBOX_TYPE);
        assert!(found[1].1.is_pattern());
    }

    #[test]
    fn test_repeated_types_get_idx() {
        let shapes = [
            sp(r#"<p:ph type="body" idx="3"/>"#, ""),
            sp(r#"<p:ph type="body"/>"#, ""),
            sp("", "{{LEFT}}"),
            sp("", "{{RIGHT}}"),
            sp(r#"<p:ph type="title"/>"#, ""),
        ]
        .concat();
        let found = placeholders_from_tree(&tree(&shapes));
        let ids: Vec<(String, Option<u32>)> = found
            .iter()
            .map(|(_, ph)| (ph.ph_type.clone(), ph.idx))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("body".to_string(), Some(3)),
                ("body".to_string(), Some(4)),
                (TEXTBOX_TYPE.to_string(), Some(1)),
                (TEXTBOX_TYPE.to_string(), Some(2)),
                ("title".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_empty_layouts_rejected() {
        assert!(matches!(ResolvedLayouts::new(Vec::new()), Err(OoxmlError::NoLayouts(_))));
        let strategy = LayoutStrategy::Manifest(LayoutManifest::default());
        assert!(matches!(
            strategy.resolve(&OpcPackage::new()),
            Err(OoxmlError::NoLayouts(_))
        ));
    }

    #[test]
    fn test_unique_name() {
        let existing = vec![
            LayoutManifestEntry::new("Title", 1),
            LayoutManifestEntry::new("Title (2)", 2),
        ];
        assert_eq!(unique_name(&existing, "Title".to_string()), "Title (3)");
        assert_eq!(unique_name(&existing, "Content".to_string()), "Content");
    }

    #[test]
    fn test_root_attr() {
        let xml = r#"<?xml version="1.0"?><p:sldLayout xmlns:p="p" type="secHead" preserve="1"><p:cSld/></p:sldLayout>"#;
        assert_eq!(root_attr(xml, b"type").unwrap().as_deref(), Some("secHead"));
        assert_eq!(root_attr(xml, b"missing").unwrap(), None);
    }
}
