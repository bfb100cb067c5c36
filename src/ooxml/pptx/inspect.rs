//! Read-only summaries of presentation packages.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::OpcPackage;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::pptx::presentation::ordered_slide_partnames;
use crate::ooxml::pptx::shapes::{ShapeInfo, scan_shapes};
use serde::Serialize;

const MEDIA_DIR: &str = "/ppt/media";

/// Summary of one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideSummary {
    /// 1-based position in the presentation
    pub number: usize,
    pub partname: String,
    /// Text of the first title placeholder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// All slide text, truncated
    pub text_preview: String,
    pub shape_count: usize,
    pub image_count: usize,
    pub has_notes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Summary of a whole deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeckSummary {
    pub slides: Vec<SlideSummary>,
    /// Partnames of embedded media
    pub media: Vec<String>,
    /// Partname of the package thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl DeckSummary {
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slide titles in order; slides without a title are skipped.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.slides.iter().filter_map(|s| s.title.as_deref())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| OoxmlError::Manifest(format!("Failed to serialize deck summary: {}", e)))
    }
}

/// Summarize `package` without changing it.
///
/// Previews are cut to `preview_len` characters.
pub fn inspect(package: &OpcPackage, preview_len: usize) -> Result<DeckSummary> {
    let mut summary = DeckSummary::default();

    for (number, partname) in (1..).zip(ordered_slide_partnames(package)?) {
        let part = package.require_part(partname.as_str())?;
        let tree = scan_shapes(part.xml_text()?)?;

        let title = tree
            .first_placeholder(&["title", "ctrTitle"])
            .map(ShapeInfo::text)
            .filter(|t| !t.is_empty());
        let text: Vec<String> = tree
            .shapes
            .iter()
            .filter(|s| s.has_text())
            .map(ShapeInfo::text)
            .collect();

        let notes = match part.rels().by_type(rt::NOTES_SLIDE).next() {
            Some(rel) => {
                let target = rel.target_partname()?;
                match package.part(target.as_str()) {
                    Some(notes) => scan_shapes(notes.xml_text()?)?
                        .first_placeholder(&["body"])
                        .map(ShapeInfo::text),
                    None => None,
                }
            },
            None => None,
        };

        summary.slides.push(SlideSummary {
            number,
            partname: partname.to_string(),
            title,
            text_preview: preview(&text.join("\n"), preview_len),
            shape_count: tree.shapes.len(),
            image_count: tree.pictures().count(),
            has_notes: notes.is_some(),
            notes: notes.filter(|n| !n.is_empty()),
        });
    }

    summary.media = package
        .iter_parts()
        .filter(|p| p.partname().base_uri() == MEDIA_DIR)
        .map(|p| p.partname().to_string())
        .collect();
    summary.thumbnail = package
        .rels()
        .by_type(rt::THUMBNAIL)
        .find_map(|rel| rel.target_partname().ok())
        .filter(|t| package.contains_part(t.as_str()))
        .map(|t| t.to_string());

    log::debug!(
        "inspected {} slides, {} media parts",
        summary.slides.len(),
        summary.media.len()
    );
    Ok(summary)
}

/// Load package bytes and summarize them.
pub fn inspect_bytes(bytes: &[u8], preview_len: usize) -> Result<DeckSummary> {
    inspect(&OpcPackage::from_bytes(bytes)?, preview_len)
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("héllo wörld", 5), "héllo…");
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("", 3), "");
    }

    #[test]
    fn test_summary_yaml() {
        let summary = DeckSummary {
            slides: vec![SlideSummary {
                number: 1,
                partname: "/ppt/slides/slide1.xml".to_string(),
                title: Some("Q&A <Session>".to_string()),
                text_preview: "Q&A <Session>".to_string(),
                shape_count: 2,
                image_count: 0,
                has_notes: false,
                notes: None,
            }],
            media: vec!["/ppt/media/image1.png".to_string()],
            thumbnail: None,
        };
        let yaml = summary.to_yaml().unwrap();
        assert!(yaml.contains("shape_count: 2"));
        assert!(yaml.contains("/ppt/media/image1.png"));
        assert!(!yaml.contains("thumbnail"));
        assert_eq!(summary.titles().collect::<Vec<_>>(), vec!["Q&A <Session>"]);
    }
}
