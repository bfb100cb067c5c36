//! In-memory OPC package.
//!
//! `OpcPackage` is the part store of the pipeline: a map of partname to
//! part, the package-level relationships and the content type registry. It
//! is loaded once, edited in place and serialized once.

use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Main API class for working with OPC packages.
#[derive(Debug, Clone)]
pub struct OpcPackage {
    /// Package-level relationships
    rels: Relationships,

    content_types: ContentTypes,

    /// All parts in the package, ordered by partname
    parts: BTreeMap<PackURI, Part>,
}

impl OpcPackage {
    /// Create a new empty OPC package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI),
            content_types: ContentTypes::new(),
            parts: BTreeMap::new(),
        }
    }

    /// Open an OPC package from a file.
    ///
    /// # Example
    /// ```no_run
    /// use slideforge::ooxml::opc::OpcPackage;
    ///
    /// let pkg = OpcPackage::open("deck.pptx").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let phys_reader = PhysPkgReader::open(path)?;
        Self::unmarshal(PackageReader::from_phys_reader(phys_reader)?)
    }

    /// Load an OPC package held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::unmarshal(PackageReader::from_bytes(data)?)
    }

    fn unmarshal(reader: PackageReader) -> Result<Self> {
        let parts = reader
            .parts
            .into_iter()
            .map(|part| (part.partname().clone(), part))
            .collect();

        let package = Self {
            rels: reader.pkg_rels,
            content_types: reader.content_types,
            parts,
        };
        // A package without a main document is not an office document.
        package.main_document_partname()?;
        Ok(package)
    }

    /// Serialize the package to zip bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self)
    }

    /// Save the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        PackageWriter::write(path, self)
    }

    /// Partname of the main document part (`/ppt/presentation.xml`).
    pub fn main_document_partname(&self) -> Result<PackURI> {
        let rel = self
            .rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?;
        let partname = rel.target_partname()?;
        if !self.parts.contains_key(&partname) {
            return Err(OpcError::InvalidPackage(format!(
                "main document part {} is missing",
                partname
            )));
        }
        Ok(partname)
    }

    /// Get a part by its partname.
    #[inline]
    pub fn part(&self, partname: &str) -> Option<&Part> {
        self.parts.get(partname)
    }

    #[inline]
    pub fn part_mut(&mut self, partname: &str) -> Option<&mut Part> {
        self.parts.get_mut(partname)
    }

    /// Get a part, failing with `PartNotFound` when it is absent.
    pub fn require_part(&self, partname: &str) -> Result<&Part> {
        self.parts
            .get(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    pub fn require_part_mut(&mut self, partname: &str) -> Result<&mut Part> {
        self.parts
            .get_mut(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// XML text of a part.
    pub fn xml_text(&self, partname: &str) -> Result<&str> {
        self.require_part(partname)?.xml_text()
    }

    #[inline]
    pub fn contains_part(&self, partname: &str) -> bool {
        self.parts.contains_key(partname)
    }

    /// Insert a part, registering its content type. Returns the part it
    /// replaced, if any.
    pub fn put_part(&mut self, part: Part) -> Option<Part> {
        self.content_types
            .register(part.partname(), part.content_type());
        self.parts.insert(part.partname().clone(), part)
    }

    /// Remove a part together with its content type override. Its
    /// relationship part goes with it since relationships live on the part.
    pub fn remove_part(&mut self, partname: &str) -> Option<Part> {
        let part = self.parts.remove(partname)?;
        self.content_types.remove_override(partname);
        Some(part)
    }

    /// Iterate over all parts in partname order.
    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Numbered parts `<dir>/<stem>N.<ext>`, sorted by N.
    ///
    /// # Example
    /// ```no_run
    /// # use slideforge::ooxml::opc::OpcPackage;
    /// # let pkg = OpcPackage::new();
    /// for (n, slide) in pkg.numbered_parts("/ppt/slides", "slide") {
    ///     println!("{} -> {}", n, slide);
    /// }
    /// ```
    pub fn numbered_parts(&self, dir: &str, stem: &str) -> Vec<(u32, PackURI)> {
        let mut found: Vec<(u32, PackURI)> = self
            .parts
            .keys()
            .filter(|uri| uri.base_uri() == dir && uri.filename().starts_with(stem))
            .filter_map(|uri| {
                let rest = &uri.filename()[stem.len()..];
                let digits = rest.split('.').next()?;
                let n = atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok()?;
                Some((n, uri.clone()))
            })
            .collect();
        found.sort();
        found
    }

    /// Find the next available partname for a template containing `%d`.
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        (1u32..=10_000)
            .map(|n| template.replace("%d", &n.to_string()))
            .find(|candidate| !self.parts.contains_key(candidate.as_str()))
            .map(PackURI::new)
            .unwrap_or_else(|| {
                Err(OpcError::InvalidPackUri(format!(
                    "no free partname for {}",
                    template
                )))
            })
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    #[inline]
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    #[inline]
    pub fn content_types_mut(&mut self) -> &mut ContentTypes {
        &mut self.content_types
    }

    /// Drop internal relationships whose target part does not exist.
    ///
    /// Returns how many edges were removed.
    pub fn prune_dangling_relationships(&mut self) -> usize {
        let existing: HashSet<PackURI> = self.parts.keys().cloned().collect();
        let dangling = |rel: &crate::ooxml::opc::rel::Relationship| {
            !rel.is_external()
                && rel
                    .target_partname()
                    .map_or(true, |target| !existing.contains(&target))
        };

        let mut removed = 0;
        for rels in std::iter::once(&mut self.rels)
            .chain(self.parts.values_mut().map(Part::rels_mut))
        {
            let before = rels.len();
            rels.retain(|rel| {
                let gone = dangling(rel);
                if gone {
                    log::debug!("dropping dangling relationship {} -> {}", rel.r_id(), rel.target_ref());
                }
                !gone
            });
            removed += before - rels.len();
        }
        removed
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}
