//! Turning a content record into text replacements for a layout.
//!
//! The mapping from placeholders to record fields is fixed:
//!
//! | placeholder                        | field |
//! |------------------------------------|-------|
//! | `title`, `ctrTitle`                | title |
//! | `body`, `obj`, `subTitle`          | body  |
//! | tag `TITLE`, `HEADING`, `HEADLINE` | title |
//! | tag `BODY`, `CONTENT`, `TEXT`, `BULLETS`, `SUBTITLE` | body |
//! | tag `NOTES`, `SPEAKER_NOTES`       | notes |
//!
//! A tag name with a known field wins; a placeholder of either kind holding a
//! single unknown tag falls back to its declared type. Anything without a
//! field keeps the template's text.

use crate::common::xml::find_tags;
use crate::ooxml::pptx::manifest::{LayoutManifestEntry, Placeholder, PlaceholderKind};
use crate::ooxml::pptx::record::ContentSlideRecord;

/// A field of a content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Title,
    Body,
    Notes,
}

impl RecordField {
    /// Value of this field on `record`; an absent field is the empty string.
    pub fn value(self, record: &ContentSlideRecord, separator: &str) -> String {
        match self {
            RecordField::Title => record.title.clone(),
            RecordField::Body => record.content_lines.join(separator),
            RecordField::Notes => record.notes.clone().unwrap_or_default(),
        }
    }
}

/// Field filled by a placeholder declared as `ph_type`.
pub fn field_for_type(ph_type: &str) -> Option<RecordField> {
    match ph_type {
        "title" | "ctrTitle" => Some(RecordField::Title),
        "body" | "obj" | "subTitle" => Some(RecordField::Body),
        _ => None,
    }
}

/// Field named by a tag (case-insensitive).
pub fn field_for_tag(name: &str) -> Option<RecordField> {
    match name.to_ascii_uppercase().as_str() {
        "TITLE" | "HEADING" | "HEADLINE" => Some(RecordField::Title),
        "BODY" | "CONTENT" | "TEXT" | "BULLETS" | "SUBTITLE" => Some(RecordField::Body),
        "NOTES" | "SPEAKER_NOTES" => Some(RecordField::Notes),
        _ => None,
    }
}

/// Where a replacement applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementScope {
    /// Every occurrence of the tag text in the slide part
    Literal,
    /// The whole text body of one placeholder shape. `ordinal` is the
    /// placeholder's position among same-typed placeholders of the layout.
    Placeholder {
        ph_type: String,
        idx: Option<u32>,
        ordinal: usize,
    },
}

/// One substitution to apply to a synthesized slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReplacement {
    /// Unescaped text to look for; for placeholder scope, the text being replaced
    pub tag: String,
    /// Unescaped replacement text
    pub value: String,
    pub scope: ReplacementScope,
}

impl TextReplacement {
    pub fn literal(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
            scope: ReplacementScope::Literal,
        }
    }
}

/// Replacements that fill `layout` with `record`.
///
/// Tagged text becomes literal replacements, one per distinct tag. A
/// structural placeholder without tags is filled as a whole, one paragraph
/// per line.
pub fn populate(
    layout: &LayoutManifestEntry,
    record: &ContentSlideRecord,
    separator: &str,
) -> Vec<TextReplacement> {
    let mut out: Vec<TextReplacement> = Vec::new();

    for (i, placeholder) in layout.placeholders.iter().enumerate() {
        let text = placeholder.text().unwrap_or("");
        let tags: Vec<_> = find_tags(text).collect();

        if tags.is_empty() {
            if placeholder.kind != PlaceholderKind::Structural {
                continue;
            }
            let Some(field) = field_for_type(&placeholder.ph_type) else {
                continue;
            };
            out.push(TextReplacement {
                tag: text.to_string(),
                value: field.value(record, "\n"),
                scope: ReplacementScope::Placeholder {
                    ph_type: placeholder.ph_type.clone(),
                    idx: placeholder.idx,
                    ordinal: ordinal(&layout.placeholders[..i], placeholder),
                },
            });
            continue;
        }

        let single = tags.len() == 1;
        for tag in tags {
            let field = field_for_tag(tag.name)
                .or_else(|| field_for_type(&placeholder.ph_type).filter(|_| single));
            let Some(field) = field else {
                log::trace!("tag {} in layout '{}' has no field", tag.literal, layout.name);
                continue;
            };
            if out.iter().any(|r| r.tag == tag.literal && r.scope == ReplacementScope::Literal) {
                continue;
            }
            out.push(TextReplacement::literal(tag.literal, field.value(record, separator)));
        }
    }

    out
}

fn ordinal(before: &[Placeholder], placeholder: &Placeholder) -> usize {
    before
        .iter()
        .filter(|p| p.kind == PlaceholderKind::Structural && p.ph_type == placeholder.ph_type)
        .count()
}
