//! The `[Content_Types].xml` registry.
//!
//! Maps file extensions (`Default`) and individual partnames (`Override`) to
//! content types. Entries keep the order they were read in so a package that
//! is loaded and written back without edits keeps its registry layout.

use crate::common::xml::{escape_xml, unescape_xml};
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

/// Content type registry of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// Default content types by lowercase extension
    defaults: Vec<(String, String)>,

    /// Override content types by partname
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Registry holding only the `rels` and `xml` defaults every package needs.
    pub fn new() -> Self {
        let mut types = Self::default();
        types.add_default("rels", ct::OPC_RELATIONSHIPS);
        types.add_default("xml", ct::XML);
        types
    }

    /// Parse `[Content_Types].xml`.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut types = Self::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let local = e.local_name();
                    let key: &[u8] = match local.as_ref() {
                        b"Default" => b"Extension",
                        b"Override" => b"PartName",
                        _ => continue,
                    };

                    let mut name = None;
                    let mut content_type = None;
                    for attr in e.attributes().flatten() {
                        let value = unescape_xml(std::str::from_utf8(&attr.value)?);
                        if attr.key.as_ref() == key {
                            name = Some(value);
                        } else if attr.key.as_ref() == b"ContentType" {
                            content_type = Some(value);
                        }
                    }

                    if let (Some(name), Some(content_type)) = (name, content_type) {
                        if key == b"Extension" {
                            types.add_default(&name, &content_type);
                        } else {
                            types.set_override(&name, &content_type);
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(format!("[Content_Types].xml: {}", e))),
                _ => {},
            }
        }

        Ok(types)
    }

    /// Content type for a partname: the override if one exists, else the
    /// default for its extension.
    pub fn content_type_for(&self, partname: &PackURI) -> Option<&str> {
        self.override_for(partname.as_str())
            .or_else(|| self.default_for(partname.ext()))
    }

    /// Default content type registered for an extension (case-insensitive).
    pub fn default_for(&self, ext: &str) -> Option<&str> {
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, t)| t.as_str())
    }

    pub fn override_for(&self, partname: &str) -> Option<&str> {
        self.overrides
            .iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(partname))
            .map(|(_, t)| t.as_str())
    }

    /// Register a default for an extension unless one already exists.
    pub fn add_default(&mut self, ext: &str, content_type: &str) {
        if self.default_for(ext).is_none() {
            self.defaults
                .push((ext.to_ascii_lowercase(), content_type.to_string()));
        }
    }

    /// Set the override for a partname, replacing any previous one in place.
    pub fn set_override(&mut self, partname: &str, content_type: &str) {
        match self
            .overrides
            .iter_mut()
            .find(|(p, _)| p.eq_ignore_ascii_case(partname))
        {
            Some(entry) => entry.1 = content_type.to_string(),
            None => self
                .overrides
                .push((partname.to_string(), content_type.to_string())),
        }
    }

    /// Remove the override for a partname. Returns whether one existed.
    pub fn remove_override(&mut self, partname: &str) -> bool {
        let before = self.overrides.len();
        self.overrides.retain(|(p, _)| !p.eq_ignore_ascii_case(partname));
        before != self.overrides.len()
    }

    /// Remove every override carrying `content_type` and return how many went.
    pub fn remove_overrides_with(&mut self, content_type: &str) -> usize {
        let before = self.overrides.len();
        self.overrides.retain(|(_, t)| t != content_type);
        before - self.overrides.len()
    }

    /// Partnames overridden with `content_type`, in registry order.
    pub fn overrides_with<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.overrides
            .iter()
            .filter(move |(_, t)| t == content_type)
            .map(|(p, _)| p.as_str())
    }

    /// Record the content type of a part, using an override only when the
    /// extension default does not already say the same thing.
    pub fn register(&mut self, partname: &PackURI, content_type: &str) {
        let ext = partname.ext();
        match self.default_for(ext) {
            Some(default) if default == content_type => {
                self.remove_override(partname.as_str());
            },
            Some(_) => self.set_override(partname.as_str(), content_type),
            None if is_default_content_type(ext, content_type) => {
                self.add_default(ext, content_type);
            },
            None => self.set_override(partname.as_str(), content_type),
        }
    }

    /// Serialize to `[Content_Types].xml`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.overrides.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        let _ = write!(xml, r#"<Types xmlns="{}">"#, namespace::OPC_CONTENT_TYPES);

        for (ext, content_type) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            );
        }
        for (partname, content_type) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            );
        }

        xml.push_str("</Types>");
        xml
    }
}

/// Whether an extension/content-type pair is a standard default mapping.
fn is_default_content_type(ext: &str, content_type: &str) -> bool {
    matches!(
        (ext.to_ascii_lowercase().as_str(), content_type),
        ("rels", ct::OPC_RELATIONSHIPS)
            | ("xml", ct::XML)
            | ("png", ct::PNG)
            | ("jpg", ct::JPEG)
            | ("jpeg", ct::JPEG)
            | ("gif", ct::GIF)
            | ("emf", ct::EMF)
            | ("wmf", ct::WMF)
            | ("svg", ct::SVG)
    )
}
