//! Turns the members of a physical package into parts.
//!
//! Resolves each member's content type through `[Content_Types].xml` and
//! attaches the relationships found in its sibling `.rels` member.

use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::{PhysMember, PhysPkgReader};
use crate::ooxml::opc::rel::Relationships;
use std::collections::HashMap;

/// Content type used for members the registry says nothing about.
const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// A package read into parts, before it becomes an `OpcPackage`.
#[derive(Debug)]
pub struct PackageReader {
    pub content_types: ContentTypes,
    pub pkg_rels: Relationships,
    /// Parts in archive order
    pub parts: Vec<Part>,
}

impl PackageReader {
    /// Read a package from its physical members.
    pub fn from_phys_reader(phys: PhysPkgReader) -> Result<Self> {
        let mut rels_blobs: HashMap<String, Vec<u8>> = HashMap::new();
        let mut content_types = None;
        let mut others: Vec<PhysMember> = Vec::new();

        for member in phys.into_members() {
            if member.partname.as_str().eq_ignore_ascii_case(CONTENT_TYPES_URI) {
                content_types = Some(ContentTypes::from_xml(&member.blob)?);
            } else if let Some(source) = member.partname.rels_source() {
                rels_blobs.insert(source.to_string(), member.blob);
            } else {
                others.push(member);
            }
        }

        let content_types = content_types.ok_or_else(|| {
            OpcError::InvalidPackage("missing [Content_Types].xml".to_string())
        })?;

        let pkg_rels = match rels_blobs.remove(PACKAGE_URI) {
            Some(blob) => Relationships::from_xml(PACKAGE_URI, &blob)?,
            None => {
                return Err(OpcError::InvalidPackage(
                    "missing package relationships (_rels/.rels)".to_string(),
                ));
            },
        };

        let mut parts = Vec::with_capacity(others.len());
        for member in others {
            let content_type = match content_types.content_type_for(&member.partname) {
                Some(content_type) => content_type.to_string(),
                None => {
                    log::warn!("no content type registered for {}", member.partname);
                    UNKNOWN_CONTENT_TYPE.to_string()
                },
            };

            let mut part = Part::load(member.partname, content_type, member.blob);
            if let Some(blob) = rels_blobs.remove(part.partname().as_str()) {
                let rels = Relationships::from_xml(part.partname().base_uri(), &blob)?;
                part.set_rels(rels);
            }
            parts.push(part);
        }

        for orphan in rels_blobs.keys() {
            log::warn!("ignoring relationships for missing part {}", orphan);
        }

        Ok(Self {
            content_types,
            pkg_rels,
            parts,
        })
    }

    /// Read a package held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_phys_reader(PhysPkgReader::from_bytes(data)?)
    }

    /// Partnames in archive order.
    pub fn partnames(&self) -> impl Iterator<Item = &PackURI> {
        self.parts.iter().map(Part::partname)
    }
}
