//! Package writer for OPC packages.
//!
//! Serializes `[Content_Types].xml`, the package relationships and then
//! every part followed by its relationship part, in partname order.

use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use std::path::Path;

/// Package writer that serializes an OPC package to a ZIP archive.
pub struct PackageWriter;

impl PackageWriter {
    /// Write an OPC package to a file.
    pub fn write<P: AsRef<Path>>(path: P, package: &OpcPackage) -> Result<()> {
        let bytes = Self::to_bytes(package)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize an OPC package to bytes.
    pub fn to_bytes(package: &OpcPackage) -> Result<Vec<u8>> {
        let mut phys_writer = PhysPkgWriter::new();

        let content_types_uri = PackURI::new(CONTENT_TYPES_URI)?;
        phys_writer.write(&content_types_uri, package.content_types().to_xml().as_bytes())?;

        let pkg_rels_uri = PackURI::new(PACKAGE_URI)?.rels_uri()?;
        phys_writer.write(&pkg_rels_uri, package.rels().to_xml().as_bytes())?;

        for part in package.iter_parts() {
            phys_writer.write(part.partname(), part.blob())?;

            // Slides always carry a relationship part, even an empty one.
            if !part.rels().is_empty() || part.content_type() == ct::PML_SLIDE {
                let rels_uri = part.partname().rels_uri()?;
                phys_writer.write(&rels_uri, part.rels().to_xml().as_bytes())?;
            }
        }

        log::debug!("serialized package with {} parts", package.part_count());
        phys_writer.finish()
    }
}
