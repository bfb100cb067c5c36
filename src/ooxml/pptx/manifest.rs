//! Layout manifests: the catalog of layouts a template offers.
//!
//! A manifest is either discovered from the template's slides or written by
//! hand and stored next to the template as YAML:
//!
//! ```yaml
//! layouts:
//!   - name: title
//!     source_slide: 1
//!     layout_type: title
//!     placeholders:
//!       - type: ctrTitle
//!         default_text: "{{TITLE}}"
//!   - name: content
//!     source_slide: 2
//!     default: true
//!     placeholders:
//!       - type: title
//!       - type: body
//!         idx: 1
//! ```

use crate::ooxml::error::{OoxmlError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder type given to plain text boxes that carry a `{{NAME}}` tag.
pub const TEXTBOX_TYPE: &str = "textbox";

/// How a placeholder was recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    /// Declared as a placeholder in the slide tree (`<p:ph>`)
    #[default]
    Structural,
    /// A plain shape whose text contains a substitution tag
    Pattern,
}

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// A content slot within a layout.
///
/// Identity within a layout is `(ph_type, idx)`; `idx` is only needed when
/// the same type occurs more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    #[serde(rename = "type")]
    pub ph_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<u32>,

    /// Text the template shows in this slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_text: Option<String>,

    #[serde(default)]
    pub kind: PlaceholderKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

impl Placeholder {
    pub fn structural(ph_type: impl Into<String>, idx: Option<u32>) -> Self {
        Self {
            ph_type: ph_type.into(),
            idx,
            default_text: None,
            kind: PlaceholderKind::Structural,
            geometry: None,
        }
    }

    /// A tagged text box; `text` is the box's text, tags included.
    pub fn pattern(text: impl Into<String>) -> Self {
        Self {
            ph_type: TEXTBOX_TYPE.to_string(),
            idx: None,
            default_text: Some(text.into()),
            kind: PlaceholderKind::Pattern,
            geometry: None,
        }
    }

    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = Some(text.into());
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    #[inline]
    pub fn is_pattern(&self) -> bool {
        self.kind == PlaceholderKind::Pattern
    }

    /// Default text, treating an empty string as absent.
    pub fn text(&self) -> Option<&str> {
        self.default_text.as_deref().filter(|t| !t.is_empty())
    }
}

/// One layout available for population, backed by a template slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutManifestEntry {
    /// Unique within a manifest
    pub name: String,

    /// N of the backing `/ppt/slides/slideN.xml`
    pub source_slide: u32,

    /// `type` of the slide layout the backing slide uses (`title`, `obj`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_type: Option<String>,

    /// Designated fallback for unmatched content types
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,

    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
}

impl LayoutManifestEntry {
    pub fn new(name: impl Into<String>, source_slide: u32) -> Self {
        Self {
            name: name.into(),
            source_slide,
            layout_type: None,
            default: false,
            placeholders: Vec::new(),
        }
    }

    pub fn with_layout_type(mut self, layout_type: impl Into<String>) -> Self {
        self.layout_type = Some(layout_type.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholders.push(placeholder);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Placeholder with the given identity.
    pub fn placeholder(&self, ph_type: &str, idx: Option<u32>) -> Option<&Placeholder> {
        self.placeholders
            .iter()
            .find(|p| p.ph_type == ph_type && p.idx == idx)
    }
}

/// A catalog of layouts, in discovery (or authoring) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutManifest {
    /// Template identity this manifest was curated for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default)]
    pub layouts: Vec<LayoutManifestEntry>,
}

impl LayoutManifest {
    pub fn new(layouts: Vec<LayoutManifestEntry>) -> Self {
        Self {
            template: None,
            layouts,
        }
    }

    /// Parse a manifest from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_saphyr::from_str(yaml)
            .map_err(|e| OoxmlError::Manifest(format!("Failed to parse layout manifest: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read a manifest file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Serialize the manifest to YAML, e.g. to hand-curate a discovered one.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| OoxmlError::Manifest(format!("Failed to serialize layout manifest: {}", e)))
    }

    /// Reject manifests whose entries cannot be told apart.
    pub fn validate(&self) -> Result<()> {
        for (i, entry) in self.layouts.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(OoxmlError::Manifest(format!("layout #{} has no name", i + 1)));
            }
            if self.layouts[..i].iter().any(|e| e.name == entry.name) {
                return Err(OoxmlError::Manifest(format!(
                    "duplicate layout name '{}'",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Option<&LayoutManifestEntry> {
        self.layouts.iter().find(|e| e.name == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
template: corporate
layouts:
  - name: title
    source_slide: 1
    layout_type: title
    placeholders:
      - type: ctrTitle
        default_text: "{{TITLE}}"
  - name: content
    source_slide: 2
    default: true
    placeholders:
      - type: title
      - type: body
        idx: 1
        geometry: { x: 457200, y: 1600200, cx: 8229600, cy: 4525963 }
      - type: textbox
        kind: pattern
        default_text: "{{NOTES}}"
"#;

    #[test]
    fn test_from_yaml() {
        let manifest = LayoutManifest::from_yaml(MANIFEST).unwrap();
        assert_eq!(manifest.template.as_deref(), Some("corporate"));
        assert_eq!(manifest.len(), 2);

        let content = manifest.entry("content").unwrap();
        assert!(content.default);
        assert_eq!(content.source_slide, 2);

        let body = content.placeholder("body", Some(1)).unwrap();
        assert_eq!(body.kind, PlaceholderKind::Structural);
        assert_eq!(body.geometry.unwrap().cx, 8229600);
        assert!(content.placeholders[2].is_pattern());
    }

    #[test]
    fn test_yaml_round_trip() {
        let manifest = LayoutManifest::from_yaml(MANIFEST).unwrap();
        let yaml = manifest.to_yaml().unwrap();
        assert_eq!(LayoutManifest::from_yaml(&yaml).unwrap(), manifest);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yaml = "layouts:\n  - name: a\n    source_slide: 1\n  - name: a\n    source_slide: 2\n";
        assert!(matches!(LayoutManifest::from_yaml(yaml), Err(OoxmlError::Manifest(_))));
    }

    #[test]
    fn test_pattern_placeholder_text() {
        let ph = Placeholder::pattern("{{QUOTE}}");
        assert_eq!(ph.ph_type, TEXTBOX_TYPE);
        assert_eq!(ph.text(), Some("{{QUOTE}}"));
        assert_eq!(Placeholder::structural("title", None).with_default_text("").text(), None);
    }
}
