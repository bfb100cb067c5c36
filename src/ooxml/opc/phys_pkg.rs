//! Physical (zip) layer of a package.
//!
//! Reading yields every file member in archive order. Writing compresses
//! every member with deflate and stamps it with a fixed DOS timestamp, so the
//! same parts written in the same order always give the same bytes.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// One file member of an archive.
#[derive(Debug)]
pub struct PhysMember {
    pub partname: PackURI,
    pub blob: Vec<u8>,
}

/// Reads every member of a zip archive into memory.
#[derive(Debug)]
pub struct PhysPkgReader {
    members: Vec<PhysMember>,
}

impl PhysPkgReader {
    /// Open a package file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or isn't a valid ZIP file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }

        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Read a package held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| OpcError::InvalidPackage(format!("not a zip archive: {}", e)))?;

        let mut members = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            let partname = PackURI::from_membername(file.name())?;
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;
            members.push(PhysMember { partname, blob });
        }

        Ok(Self { members })
    }

    /// Bytes of the member with this partname.
    pub fn blob_for(&self, partname: &str) -> Option<&[u8]> {
        self.members
            .iter()
            .find(|m| m.partname.as_str() == partname)
            .map(|m| m.blob.as_slice())
    }

    /// Consume the reader and hand out the members in archive order.
    pub fn into_members(self) -> Vec<PhysMember> {
        self.members
    }
}

/// Writes members into a new in-memory zip archive.
pub struct PhysPkgWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PhysPkgWriter {
    pub fn new() -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options,
        }
    }

    /// Add one member.
    pub fn write(&mut self, partname: &PackURI, blob: &[u8]) -> Result<()> {
        self.zip.start_file(partname.membername(), self.options)?;
        self.zip.write_all(blob)?;
        Ok(())
    }

    /// Finish the archive and return its bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}
