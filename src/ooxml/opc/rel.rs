//! Relationship-related objects for OPC packages.
//!
//! A relationship is a typed, directed edge from a source part (or the
//! package itself) to a target part or external URL, stored in the source's
//! sibling `.rels` part.

use crate::common::xml::{escape_xml, unescape_xml};
use crate::ooxml::opc::constants::{namespace, target_mode};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a relative part reference or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Target reference as written in the `.rels` part.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Absolute partname of the target. Fails for external relationships.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external, it has no target partname",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref)
    }

    /// Numeric part of an `rIdN` identifier.
    fn number(&self) -> Option<u32> {
        r_id_number(&self.r_id)
    }
}

/// Numeric suffix of an `rIdN` identifier; `None` for other id schemes.
#[inline]
pub fn r_id_number(r_id: &str) -> Option<u32> {
    let digits = r_id.strip_prefix("rId")?;
    atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok()
}

/// Ordered collection of relationships from a single source.
///
/// Order is the order read from the `.rels` part followed by additions,
/// which keeps serialization stable across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,

    rels: Vec<Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: Vec::new(),
        }
    }

    /// Parse a `.rels` part.
    ///
    /// # Arguments
    /// * `base_uri` - Directory of the source part, used to resolve targets
    /// * `xml` - The raw `.rels` content
    pub fn from_xml(base_uri: &str, xml: &[u8]) -> Result<Self> {
        let mut rels = Self::new(base_uri);
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target = None;
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = unescape_xml(std::str::from_utf8(&attr.value)?);
                        match attr.key.as_ref() {
                            b"Id" => r_id = Some(value),
                            b"Type" => reltype = Some(value),
                            b"Target" => target = Some(value),
                            b"TargetMode" => external = value == target_mode::EXTERNAL,
                            _ => {},
                        }
                    }

                    match (r_id, reltype, target) {
                        (Some(r_id), Some(reltype), Some(target)) => {
                            rels.add_relationship(reltype, target, r_id, external);
                        },
                        _ => {
                            log::warn!("ignoring incomplete relationship under {}", base_uri);
                        },
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "relationships under {}: {}",
                        base_uri, e
                    )));
                },
                _ => {},
            }
        }

        Ok(rels)
    }

    /// Directory the relative targets are resolved against.
    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Add a relationship with an explicit id, replacing any existing
    /// relationship that has the same id.
    pub fn add_relationship(
        &mut self,
        reltype: impl Into<String>,
        target_ref: impl Into<String>,
        r_id: impl Into<String>,
        is_external: bool,
    ) -> &Relationship {
        let rel = Relationship::new(
            r_id.into(),
            reltype.into(),
            target_ref.into(),
            self.base_uri.clone(),
            is_external,
        );
        let pos = match self.rels.iter().position(|r| r.r_id == rel.r_id) {
            Some(pos) => {
                self.rels[pos] = rel;
                pos
            },
            None => {
                self.rels.push(rel);
                self.rels.len() - 1
            },
        };
        &self.rels[pos]
    }

    /// Add an internal relationship to `target` under a freshly allocated id
    /// and return that id.
    pub fn add(&mut self, reltype: &str, target: &PackURI) -> String {
        let r_id = self.next_r_id();
        let target_ref = target.relative_ref(&self.base_uri);
        self.add_relationship(reltype.to_string(), target_ref, r_id.clone(), false);
        r_id
    }

    /// Get or add an internal relationship of `reltype` to `target`.
    ///
    /// An existing edge with the same type and resolved target is reused,
    /// so repeated calls never create duplicates.
    pub fn get_or_add(&mut self, reltype: &str, target: &PackURI) -> String {
        let existing = self.rels.iter().find(|rel| {
            rel.reltype == reltype
                && !rel.is_external
                && rel.target_partname().is_ok_and(|t| &t == target)
        });
        match existing {
            Some(rel) => rel.r_id.clone(),
            None => self.add(reltype, target),
        }
    }

    /// Next free relationship id: one past the highest `rIdN` in use.
    ///
    /// Gaps are never reused, so an id removed earlier in a pass cannot be
    /// handed out again to a different target.
    pub fn next_r_id(&self) -> String {
        let max = self.rels.iter().filter_map(Relationship::number).max().unwrap_or(0);
        format!("rId{}", max + 1)
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// The single relationship of `reltype`.
    ///
    /// Errors if there is none or more than one.
    pub fn part_with_reltype<'a>(&'a self, reltype: &'a str) -> Result<&'a Relationship> {
        let mut matching = self.by_type(reltype);
        match (matching.next(), matching.next()) {
            (Some(rel), None) => Ok(rel),
            (None, _) => Err(OpcError::RelationshipNotFound(format!(
                "no relationship of type '{}' under {}",
                reltype, self.base_uri
            ))),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "multiple relationships of type '{}' under {}",
                reltype, self.base_uri
            ))),
        }
    }

    /// All relationships of `reltype`, in order.
    pub fn by_type<'a>(&'a self, reltype: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.rels.iter().filter(move |rel| rel.reltype == reltype)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Remove a relationship by its ID.
    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        let pos = self.rels.iter().position(|rel| rel.r_id == r_id)?;
        Some(self.rels.remove(pos))
    }

    /// Remove every relationship of `reltype` and return them.
    pub fn remove_by_type(&mut self, reltype: &str) -> Vec<Relationship> {
        let (removed, kept) = std::mem::take(&mut self.rels)
            .into_iter()
            .partition(|rel| rel.reltype == reltype);
        self.rels = kept;
        removed
    }

    /// Keep only the relationships for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Relationship) -> bool) {
        self.rels.retain(keep);
    }

    /// Copy of this collection re-anchored at another source directory.
    ///
    /// Internal targets are rewritten so they keep pointing at the same parts.
    pub fn rebased(&self, base_uri: &str) -> Result<Self> {
        let mut out = Self::new(base_uri);
        for rel in &self.rels {
            let target_ref = if rel.is_external {
                rel.target_ref.clone()
            } else {
                rel.target_partname()?.relative_ref(base_uri)
            };
            out.add_relationship(rel.reltype.clone(), target_ref, rel.r_id.clone(), rel.is_external);
        }
        Ok(out)
    }

    /// Serialize relationships to XML format.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        let _ = write!(xml, r#"<Relationships xmlns="{}">"#, namespace::OPC_RELATIONSHIPS);

        for rel in &self.rels {
            let mode = if rel.is_external {
                r#" TargetMode="External""#
            } else {
                ""
            };
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(&rel.r_id),
                escape_xml(&rel.reltype),
                escape_xml(&rel.target_ref),
                mode
            );
        }

        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/")
    }
}
