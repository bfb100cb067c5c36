//! Content records supplied by the caller.

use crate::ooxml::error::{OoxmlError, Result};
use serde::{Deserialize, Serialize};

/// One slide's worth of content, typed by what the slide is for.
///
/// Records are read-only input: the pipeline never changes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSlideRecord {
    /// What the slide is for (`title`, `content`, `quote`, ...), used to pick a layout
    pub semantic_type: String,

    pub title: String,

    /// Body lines, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_lines: Vec<String>,

    /// Speaker notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ContentSlideRecord {
    pub fn new(semantic_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            semantic_type: semantic_type.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the body lines.
    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Set the speaker notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Whether the record carries non-blank speaker notes.
    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

/// Parse a YAML list of records.
///
/// ```
/// use slideforge::ooxml::pptx::records_from_yaml;
///
/// let records = records_from_yaml(
///     "- semantic_type: title\n  title: Welcome\n- semantic_type: content\n  title: Agenda\n  content_lines: [Intro, Q&A]\n",
/// ).unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].content_lines, ["Intro", "Q&A"]);
/// ```
pub fn records_from_yaml(yaml: &str) -> Result<Vec<ContentSlideRecord>> {
    serde_saphyr::from_str(yaml)
        .map_err(|e| OoxmlError::Manifest(format!("Failed to parse content records: {}", e)))
}
