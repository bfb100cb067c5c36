//! Slide synthesis: cloning a template slide and filling in its text.

use crate::common::xml::{ElementSpan, escape_xml, find_element, qualified};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::{OpcPackage, Part};
use crate::ooxml::pptx::manifest::LayoutManifestEntry;
use crate::ooxml::pptx::populate::{ReplacementScope, TextReplacement};
use crate::ooxml::pptx::resolver::{SLIDE_STEM, SLIDES_DIR, slide_partname};
use crate::ooxml::pptx::shapes::{ShapeInfo, ShapeKind, scan_shapes};
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::BTreeMap;
use thiserror::Error;

pub const NOTES_SLIDES_DIR: &str = "/ppt/notesSlides";
pub const NOTES_SLIDE_STEM: &str = "notesSlide";

/// Why a content record produced no slide.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("layout '{layout}' refers to slide {slide}, which is not in the template")]
    MissingSourceSlide { layout: String, slide: u32 },

    #[error("template slide {0} is not XML")]
    NotXml(u32),

    #[error("template slide {slide} could not be rewritten: {message}")]
    Rewrite { slide: u32, message: String },
}

/// Slide parts of a template, detached from the package.
///
/// Taking the slides out first means output numbering starts at `slide1` and
/// sample slides of the template never reach the output.
#[derive(Debug, Default)]
pub struct TemplateSlides {
    slides: BTreeMap<u32, Part>,
    notes: BTreeMap<u32, String>,
}

impl TemplateSlides {
    /// Remove every slide and notes slide from `package`.
    ///
    /// Text of each slide's notes is kept so it can be carried over.
    pub fn take(package: &mut OpcPackage) -> Result<Self> {
        let mut taken = Self::default();

        for (n, partname) in package.numbered_parts(SLIDES_DIR, SLIDE_STEM) {
            let Some(part) = package.remove_part(partname.as_str()) else {
                continue;
            };
            if let Some(text) = notes_text_for(package, &part)? {
                taken.notes.insert(n, text);
            }
            taken.slides.insert(n, part);
        }

        let notes_slides = package.numbered_parts(NOTES_SLIDES_DIR, NOTES_SLIDE_STEM);
        for (_, partname) in &notes_slides {
            package.remove_part(partname.as_str());
        }

        log::debug!(
            "detached {} template slides and {} notes slides",
            taken.slides.len(),
            notes_slides.len()
        );
        Ok(taken)
    }

    pub fn get(&self, n: u32) -> Option<&Part> {
        self.slides.get(&n)
    }

    /// Speaker notes text of template slide `n`, if it had any.
    pub fn notes_text(&self, n: u32) -> Option<&str> {
        self.notes.get(&n).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

fn notes_text_for(package: &OpcPackage, slide: &Part) -> Result<Option<String>> {
    let Some(rel) = slide.rels().by_type(rt::NOTES_SLIDE).next() else {
        return Ok(None);
    };
    let target = rel.target_partname()?;
    let Some(notes) = package.part(target.as_str()) else {
        return Ok(None);
    };
    let Ok(xml) = notes.xml_text() else {
        return Ok(None);
    };
    let tree = scan_shapes(xml)?;
    Ok(tree
        .first_placeholder(&["body"])
        .map(ShapeInfo::text)
        .filter(|t| !t.trim().is_empty()))
}

/// Builds output slides from detached template slides.
pub struct SlideSynthesizer<'t> {
    template: &'t TemplateSlides,
}

impl<'t> SlideSynthesizer<'t> {
    pub fn new(template: &'t TemplateSlides) -> Self {
        Self { template }
    }

    /// Clone the slide backing `layout` as output slide `output_index` and
    /// apply `replacements` to it.
    ///
    /// The clone keeps every relationship of the template slide except the
    /// one to its notes slide.
    pub fn synthesize(
        &self,
        layout: &LayoutManifestEntry,
        replacements: &[TextReplacement],
        output_index: u32,
    ) -> std::result::Result<Part, SkipReason> {
        let source = layout.source_slide;
        let template = self
            .template
            .get(source)
            .ok_or_else(|| SkipReason::MissingSourceSlide {
                layout: layout.name.clone(),
                slide: source,
            })?;
        let rewrite_failed = |e: OoxmlError| SkipReason::Rewrite {
            slide: source,
            message: e.to_string(),
        };

        let xml = template.xml_text().map_err(|_| SkipReason::NotXml(source))?;
        let mut xml = apply_literal(xml, replacements).map_err(rewrite_failed)?;
        for replacement in replacements {
            if let ReplacementScope::Placeholder { ph_type, idx, ordinal } = &replacement.scope {
                xml = fill_placeholder(&xml, ph_type, *idx, *ordinal, &replacement.value)
                    .map_err(rewrite_failed)?;
            }
        }

        let partname = slide_partname(output_index).map_err(rewrite_failed)?;
        let mut part = template
            .clone_as(partname)
            .map_err(|e| rewrite_failed(e.into()))?;
        part.set_xml(xml);
        part.rels_mut().remove_by_type(rt::NOTES_SLIDE);

        log::trace!(
            "synthesized {} from template slide {} ({} replacements)",
            part.partname(),
            source,
            replacements.len()
        );
        Ok(part)
    }
}

/// Replace every literal tag in one pass; earlier tags win on overlap.
pub fn apply_literal(xml: &str, replacements: &[TextReplacement]) -> Result<String> {
    let (tags, values): (Vec<String>, Vec<String>) = replacements
        .iter()
        .filter(|r| r.scope == ReplacementScope::Literal && !r.tag.is_empty())
        .map(|r| (escape_xml(&r.tag), escape_xml(&r.value)))
        .unzip();
    if tags.is_empty() {
        return Ok(xml.to_string());
    }

    let automaton = AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostFirst)
        .build(&tags)
        .map_err(|e| OoxmlError::Xml(format!("cannot build tag matcher: {}", e)))?;
    Ok(automaton.replace_all(xml, &values))
}

/// Replace the text body of one placeholder with `value`, one paragraph per
/// line. Paragraph and run properties of the first paragraph are kept.
///
/// The placeholder is found by type and `idx`, else as the `ordinal`-th
/// placeholder of that type. A slide without it is returned unchanged.
pub fn fill_placeholder(
    xml: &str,
    ph_type: &str,
    idx: Option<u32>,
    ordinal: usize,
    value: &str,
) -> Result<String> {
    let tree = scan_shapes(xml)?;
    let candidates: Vec<&ShapeInfo> = tree
        .shapes
        .iter()
        .filter(|s| s.kind == ShapeKind::Shape && s.is_placeholder_of(&[ph_type]))
        .collect();
    let shape = candidates
        .iter()
        .find(|s| s.placeholder.as_ref().is_some_and(|ph| ph.idx == idx))
        .or_else(|| candidates.get(ordinal))
        .copied();
    let Some(shape) = shape else {
        log::debug!("no {} placeholder (idx {:?}) to fill", ph_type, idx);
        return Ok(xml.to_string());
    };

    let mut out = String::with_capacity(xml.len() + value.len() + 128);
    match &shape.tx_body {
        Some(range) => {
            let body = text_body(&xml[range.clone()], shape.prefix.as_deref(), value)?;
            out.push_str(&xml[..range.start]);
            out.push_str(&body);
            out.push_str(&xml[range.end..]);
        },
        None => {
            let closing = format!("</{}>", qualified(shape.prefix.as_deref(), "sp"));
            let shape_xml = &xml[shape.span.clone()];
            if !shape_xml.ends_with(&closing) {
                return Ok(xml.to_string());
            }
            let at = shape.span.end - closing.len();
            let body = text_body("", shape.prefix.as_deref(), value)?;
            out.push_str(&xml[..at]);
            out.push_str(&body);
            out.push_str(&xml[at..]);
        },
    }
    Ok(out)
}

/// A new `txBody` holding `value`, reusing formatting from `existing`.
fn text_body(existing: &str, prefix: Option<&str>, value: &str) -> Result<String> {
    let find = |local: &[u8]| -> Result<Option<ElementSpan>> {
        if existing.is_empty() {
            return Ok(None);
        }
        find_element(existing, local).map_err(OoxmlError::Xml)
    };
    let body_pr = find(b"bodyPr")?;
    let a = body_pr
        .as_ref()
        .and_then(|s| s.prefix.clone())
        .unwrap_or_else(|| "a".to_string());
    let a = Some(a.as_str());
    let slice = |span: Option<ElementSpan>| span.map(|s| existing[s.outer].to_string());

    let body_pr = slice(body_pr).unwrap_or_else(|| format!("<{}/>", qualified(a, "bodyPr")));
    let lst_style = slice(find(b"lstStyle")?).unwrap_or_else(|| format!("<{}/>", qualified(a, "lstStyle")));
    let p_pr = slice(find(b"pPr")?).unwrap_or_default();
    let r_pr = slice(find(b"rPr")?)
        .unwrap_or_else(|| format!(r#"<{} lang="en-US" dirty="0"/>"#, qualified(a, "rPr")));

    let tx_body = qualified(prefix, "txBody");
    let (p, r, t) = (qualified(a, "p"), qualified(a, "r"), qualified(a, "t"));

    let mut out = String::with_capacity(256 + value.len());
    out.push_str(&format!("<{}>{}{}", tx_body, body_pr, lst_style));
    for line in value.split('\n') {
        if line.is_empty() {
            out.push_str(&format!("<{p}>{p_pr}</{p}>"));
        } else {
            out.push_str(&format!(
                "<{p}>{p_pr}<{r}>{r_pr}<{t}>{text}</{t}></{r}></{p}>",
                text = escape_xml(line)
            ));
        }
    }
    out.push_str(&format!("</{}>", tx_body));
    Ok(out)
}
