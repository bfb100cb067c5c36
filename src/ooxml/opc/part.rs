//! Parts of an OPC package.
//!
//! A part is the unit of content in a package: a unique partname, a content
//! type, the payload and the relationships that originate from it. XML parts
//! are held as text so the presentation layer can edit them in place.

use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;

/// Payload of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartData {
    /// UTF-8 XML text.
    Xml(String),
    /// Anything else (media, thumbnails, embedded objects).
    Binary(Vec<u8>),
}

/// One named entry of a package together with its outgoing relationships.
#[derive(Debug, Clone)]
pub struct Part {
    /// The partname (URI) of this part
    partname: PackURI,

    /// The content type of this part
    content_type: String,

    data: PartData,

    /// Relationships from this part to other parts
    rels: Relationships,
}

impl Part {
    /// Create an XML part with no relationships.
    pub fn xml(partname: PackURI, content_type: impl Into<String>, xml: impl Into<String>) -> Self {
        let rels = Relationships::new(partname.base_uri());
        Self {
            partname,
            content_type: content_type.into(),
            data: PartData::Xml(xml.into()),
            rels,
        }
    }

    /// Create a binary part with no relationships.
    pub fn binary(partname: PackURI, content_type: impl Into<String>, blob: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri());
        Self {
            partname,
            content_type: content_type.into(),
            data: PartData::Binary(blob),
            rels,
        }
    }

    /// Build a part from serialized bytes, keeping XML content as text when
    /// the content type says it is XML and the bytes are valid UTF-8.
    pub fn load(partname: PackURI, content_type: String, blob: Vec<u8>) -> Self {
        if is_xml_content_type(&content_type) {
            match String::from_utf8(blob) {
                Ok(text) => return Self::xml(partname, content_type, text),
                Err(e) => {
                    log::warn!("{} is declared as XML but is not UTF-8; keeping it binary", partname);
                    return Self::binary(partname, content_type, e.into_bytes());
                },
            }
        }
        Self::binary(partname, content_type, blob)
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    pub fn data(&self) -> &PartData {
        &self.data
    }

    /// Raw bytes of the part as they will be written to the archive.
    pub fn blob(&self) -> &[u8] {
        match &self.data {
            PartData::Xml(text) => text.as_bytes(),
            PartData::Binary(blob) => blob,
        }
    }

    /// XML text of the part.
    pub fn xml_text(&self) -> Result<&str> {
        match &self.data {
            PartData::Xml(text) => Ok(text),
            PartData::Binary(_) => Err(OpcError::NotXmlPart(self.partname.to_string())),
        }
    }

    /// Replace the XML text of the part.
    pub fn set_xml(&mut self, xml: String) {
        self.data = PartData::Xml(xml);
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Replace the relationships of this part.
    pub fn set_rels(&mut self, rels: Relationships) {
        self.rels = rels;
    }

    /// Copy of this part under a new partname.
    ///
    /// Relationship targets are re-anchored at the new location so they keep
    /// resolving to the same parts.
    pub fn clone_as(&self, partname: PackURI) -> Result<Self> {
        let rels = self.rels.rebased(partname.base_uri())?;
        Ok(Self {
            partname,
            content_type: self.content_type.clone(),
            data: self.data.clone(),
            rels,
        })
    }
}

/// Whether a content type denotes XML text.
pub fn is_xml_content_type(content_type: &str) -> bool {
    content_type.ends_with("+xml") || content_type == ct::XML || content_type == "text/xml"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    #[test]
    fn test_load_keeps_xml_as_text() {
        let uri = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        let part = Part::load(uri, ct::PML_SLIDE.to_string(), b"<p:sld/>".to_vec());
        assert_eq!(part.xml_text().unwrap(), "<p:sld/>");

        let uri = PackURI::new("/ppt/media/image1.png").unwrap();
        let part = Part::load(uri, ct::PNG.to_string(), vec![0x89, b'P', b'N', b'G']);
        assert!(part.xml_text().is_err());
        assert_eq!(part.blob().len(), 4);
    }

    #[test]
    fn test_invalid_utf8_stays_binary() {
        let uri = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        let part = Part::load(uri, ct::PML_SLIDE.to_string(), vec![0xff, 0xfe, 0x00]);
        assert!(matches!(part.data(), PartData::Binary(_)));
    }

    #[test]
    fn test_clone_as_rebases_rels() {
        let uri = PackURI::new("/ppt/slides/slide3.xml").unwrap();
        let mut part = Part::xml(uri, ct::PML_SLIDE, "<p:sld/>");
        let layout = PackURI::new("/ppt/slideLayouts/slideLayout1.xml").unwrap();
        part.rels_mut().add(rt::SLIDE_LAYOUT, &layout);

        let copy = part.clone_as(PackURI::new("/ppt/slides/slide1.xml").unwrap()).unwrap();
        assert_eq!(copy.partname().as_str(), "/ppt/slides/slide1.xml");
        let rel = copy.rels().part_with_reltype(rt::SLIDE_LAYOUT).unwrap();
        assert_eq!(rel.target_partname().unwrap(), layout);
    }
}
