//! Shape tree scanner for slide, layout and notes parts.
//!
//! Walks a part once with `quick-xml` and records every leaf shape (`sp`,
//! `pic`, `graphicFrame`, `cxnSp`) in document order. Group shapes are
//! flattened: their children are reported as ordinary shapes. Each shape
//! keeps the byte range it occupies in the part so callers can copy or
//! rewrite it without re-serializing the rest of the document.

use crate::common::xml::unescape_xml;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::manifest::Geometry;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::ops::Range;

/// Placeholder type assumed when `<p:ph>` has no `type` attribute.
pub const DEFAULT_PH_TYPE: &str = "obj";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Shape,
    Picture,
    GraphicFrame,
    Connector,
}

impl ShapeKind {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(ShapeKind::Shape),
            b"pic" => Some(ShapeKind::Picture),
            b"graphicFrame" => Some(ShapeKind::GraphicFrame),
            b"cxnSp" => Some(ShapeKind::Connector),
            _ => None,
        }
    }
}

/// The `<p:ph>` declaration of a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    pub ph_type: String,
    pub idx: Option<u32>,
}

/// One shape found in a shape tree.
#[derive(Debug, Clone)]
pub struct ShapeInfo {
    pub kind: ShapeKind,
    pub id: Option<u32>,
    pub name: String,
    pub placeholder: Option<PlaceholderRef>,
    /// Unescaped text, one entry per paragraph
    pub paragraphs: Vec<String>,
    pub geometry: Option<Geometry>,
    /// `r:embed` of the shape's picture fill, if any
    pub image_ref: Option<String>,
    /// Byte range of the whole shape element
    pub span: Range<usize>,
    /// Byte range of the `txBody` element, if the shape has one
    pub tx_body: Option<Range<usize>>,
    /// Namespace prefix of the shape element (`p` for `<p:sp>`)
    pub prefix: Option<String>,
}

impl ShapeInfo {
    /// Paragraph texts joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }

    pub fn has_text(&self) -> bool {
        self.paragraphs.iter().any(|p| !p.is_empty())
    }

    /// Whether the shape is a placeholder of one of `types`.
    pub fn is_placeholder_of(&self, types: &[&str]) -> bool {
        self.placeholder
            .as_ref()
            .is_some_and(|ph| types.contains(&ph.ph_type.as_str()))
    }
}

/// All shapes of one part.
#[derive(Debug, Clone, Default)]
pub struct ShapeTree {
    /// `name` attribute of `<p:cSld>`
    pub name: Option<String>,
    pub shapes: Vec<ShapeInfo>,
    pub group_count: usize,
}

impl ShapeTree {
    pub fn pictures(&self) -> impl Iterator<Item = &ShapeInfo> {
        self.shapes.iter().filter(|s| s.kind == ShapeKind::Picture)
    }

    /// First placeholder shape of one of `types`.
    pub fn first_placeholder(&self, types: &[&str]) -> Option<&ShapeInfo> {
        self.shapes.iter().find(|s| s.is_placeholder_of(types))
    }
}

struct ShapeBuilder {
    kind: ShapeKind,
    local_name: Vec<u8>,
    start: usize,
    prefix: Option<String>,
    id: Option<u32>,
    name: Option<String>,
    placeholder: Option<PlaceholderRef>,
    paragraphs: Vec<String>,
    paragraph: Option<String>,
    text_start: Option<usize>,
    tx_start: Option<usize>,
    tx_body: Option<Range<usize>>,
    in_xfrm: bool,
    offset: Option<(i64, i64)>,
    extent: Option<(i64, i64)>,
    image_ref: Option<String>,
}

impl ShapeBuilder {
    fn new(kind: ShapeKind, e: &BytesStart<'_>, start: usize) -> Self {
        let qname = e.name();
        let prefix = qname
            .prefix()
            .and_then(|p| std::str::from_utf8(p.as_ref()).ok().map(str::to_string));
        Self {
            kind,
            local_name: e.local_name().as_ref().to_vec(),
            start,
            prefix,
            id: None,
            name: None,
            placeholder: None,
            paragraphs: Vec::new(),
            paragraph: None,
            text_start: None,
            tx_start: None,
            tx_body: None,
            in_xfrm: false,
            offset: None,
            extent: None,
            image_ref: None,
        }
    }

    /// Handle a start or empty tag inside the shape.
    fn open(&mut self, e: &BytesStart<'_>, empty: bool, before: usize, after: usize) -> Result<()> {
        match e.local_name().as_ref() {
            b"cNvPr" if self.id.is_none() => {
                self.id = attr(e, b"id")?
                    .and_then(|v| atoi_simd::parse::<u32, false, false>(v.as_bytes()).ok());
                self.name = attr(e, b"name")?;
            },
            b"ph" => {
                let ph_type = attr(e, b"type")?.unwrap_or_else(|| DEFAULT_PH_TYPE.to_string());
                let idx = attr(e, b"idx")?
                    .and_then(|v| atoi_simd::parse::<u32, false, false>(v.as_bytes()).ok());
                self.placeholder = Some(PlaceholderRef { ph_type, idx });
            },
            b"xfrm" if !empty => self.in_xfrm = true,
            b"off" if self.in_xfrm && self.offset.is_none() => {
                self.offset = Some((int_attr(e, b"x")?, int_attr(e, b"y")?));
            },
            b"ext" if self.in_xfrm && self.extent.is_none() => {
                self.extent = Some((int_attr(e, b"cx")?, int_attr(e, b"cy")?));
            },
            b"blip" if self.image_ref.is_none() => self.image_ref = attr(e, b"embed")?,
            b"txBody" => {
                if empty {
                    self.tx_body = Some(before..after);
                } else {
                    self.tx_start = Some(before);
                }
            },
            b"p" => {
                if empty {
                    self.paragraphs.push(String::new());
                } else {
                    self.paragraph = Some(String::new());
                }
            },
            b"t" if !empty => self.text_start = Some(after),
            b"br" => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.push('\n');
                }
            },
            _ => {},
        }
        Ok(())
    }

    /// Handle an end tag inside the shape.
    fn close(&mut self, local: &[u8], xml: &str, before: usize, after: usize) {
        match local {
            b"xfrm" => self.in_xfrm = false,
            b"t" => {
                if let (Some(start), Some(paragraph)) = (self.text_start.take(), self.paragraph.as_mut()) {
                    paragraph.push_str(&unescape_xml(&xml[start..before]));
                }
            },
            b"p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.paragraphs.push(paragraph);
                }
            },
            b"txBody" => {
                if let Some(start) = self.tx_start.take() {
                    self.tx_body = Some(start..after);
                }
            },
            _ => {},
        }
    }

    fn finish(self, end: usize) -> ShapeInfo {
        let geometry = match (self.offset, self.extent) {
            (Some((x, y)), Some((cx, cy))) => Some(Geometry { x, y, cx, cy }),
            _ => None,
        };
        ShapeInfo {
            kind: self.kind,
            id: self.id,
            name: self.name.unwrap_or_default(),
            placeholder: self.placeholder,
            paragraphs: self.paragraphs,
            geometry,
            image_ref: self.image_ref,
            span: self.start..end,
            tx_body: self.tx_body,
            prefix: self.prefix,
        }
    }
}

/// Scan the shape tree of a slide, layout, master or notes part.
pub fn scan_shapes(xml: &str) -> Result<ShapeTree> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut tree = ShapeTree::default();
    let mut current: Option<ShapeBuilder> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| OoxmlError::Xml(format!("shape tree at byte {}: {}", before, e)))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(ref e) => {
                if let Some(shape) = current.as_mut() {
                    shape.open(e, false, before, after)?;
                } else if let Some(kind) = ShapeKind::from_local_name(e.local_name().as_ref()) {
                    current = Some(ShapeBuilder::new(kind, e, before));
                } else {
                    match e.local_name().as_ref() {
                        b"grpSp" => tree.group_count += 1,
                        b"cSld" => tree.name = attr(e, b"name")?.filter(|n| !n.is_empty()),
                        _ => {},
                    }
                }
            },
            Event::Empty(ref e) => {
                if let Some(shape) = current.as_mut() {
                    shape.open(e, true, before, after)?;
                } else if e.local_name().as_ref() == b"cSld" {
                    tree.name = attr(e, b"name")?.filter(|n| !n.is_empty());
                }
            },
            Event::End(ref e) => {
                let local = e.local_name();
                let finished = match current.as_mut() {
                    Some(shape) if shape.local_name == local.as_ref() => true,
                    Some(shape) => {
                        shape.close(local.as_ref(), xml, before, after);
                        false
                    },
                    None => false,
                };
                if finished {
                    if let Some(shape) = current.take() {
                        tree.shapes.push(shape.finish(after));
                    }
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(tree)
}

/// Unescaped value of the attribute with the given local name.
pub(crate) fn attr(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>> {
    for a in e.attributes().flatten() {
        if a.key.local_name().as_ref() == local {
            let raw = std::str::from_utf8(&a.value)
                .map_err(|err| OoxmlError::Xml(format!("attribute is not UTF-8: {}", err)))?;
            return Ok(Some(unescape_xml(raw)));
        }
    }
    Ok(None)
}

fn int_attr(e: &BytesStart<'_>, local: &[u8]) -> Result<i64> {
    Ok(attr(e, local)?
        .and_then(|v| atoi_simd::parse::<i64, false, false>(v.as_bytes()).ok())
        .unwrap_or(0))
}
