//! Options controlling deck generation.

use crate::ooxml::error::{OoxmlError, Result};
use serde::{Deserialize, Serialize};

/// Configuration options for deck generation.
///
/// # Examples
///
/// ```rust
/// use slideforge::ooxml::pptx::GeneratorOptions;
///
/// // Create with defaults
/// let options = GeneratorOptions::default();
/// assert_eq!(options.body_separator, "\n");
///
/// // Or customize
/// let options = GeneratorOptions::new()
///     .with_default_aliases(["main", "general"])
///     .with_emit_notes(false);
///
/// // Or load from YAML
/// let options = GeneratorOptions::from_yaml("body_separator: \" / \"\npreview_len: 40\n").unwrap();
/// assert_eq!(options.preview_len, 40);
/// assert!(options.emit_notes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Layout names that designate the general-purpose layout, tried in order
    pub default_aliases: Vec<String>,
    /// Separator used to join content lines into a single tag value
    pub body_separator: String,
    /// Whether records' speaker notes become notes slides
    pub emit_notes: bool,
    /// Whether edges from cloned template slides to their notes are dropped
    pub drop_template_notes: bool,
    /// Maximum number of characters in an inspector text preview
    pub preview_len: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            default_aliases: vec![
                "general".to_string(),
                "default".to_string(),
                "content".to_string(),
            ],
            body_separator: "\n".to_string(),
            emit_notes: true,
            drop_template_notes: true,
            preview_len: 120,
        }
    }
}

impl GeneratorOptions {
    /// Create a new `GeneratorOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from YAML; missing fields keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| OoxmlError::Manifest(format!("Failed to parse generator options: {}", e)))
    }

    /// Set the general-layout aliases.
    pub fn with_default_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Set the separator for joined content lines.
    pub fn with_body_separator(mut self, separator: impl Into<String>) -> Self {
        self.body_separator = separator.into();
        self
    }

    /// Set whether speaker notes are written.
    pub fn with_emit_notes(mut self, emit: bool) -> Self {
        self.emit_notes = emit;
        self
    }

    /// Set whether notes edges inherited from template slides are dropped.
    pub fn with_drop_template_notes(mut self, drop: bool) -> Self {
        self.drop_template_notes = drop;
        self
    }

    /// Set the inspector preview length in characters.
    pub fn with_preview_len(mut self, len: usize) -> Self {
        self.preview_len = len;
        self
    }
}
