//! Locating elements inside raw XML by byte range.
//!
//! Parts are edited as text: these helpers find where an element starts and
//! ends so callers can splice replacement markup without re-serializing the
//! whole document.
use quick_xml::Reader;
use quick_xml::events::Event;
use std::ops::Range;

/// Byte span of one element in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpan {
    /// From `<` of the start tag to `>` of the end tag (inclusive).
    pub outer: Range<usize>,
    /// Content between the start and end tags; empty for `<x/>`.
    pub inner: Range<usize>,
    /// Namespace prefix used on the element, if any.
    pub prefix: Option<String>,
}

impl ElementSpan {
    /// Whether the element was written as a self-closing tag.
    #[inline]
    pub fn is_empty_tag(&self) -> bool {
        self.inner.is_empty() && self.inner.start == self.outer.end
    }
}

/// Find the first element with the given local name.
///
/// Returns `Ok(None)` when the element is absent. Errors are reported as
/// strings so each layer can wrap them in its own error type.
pub fn find_element(xml: &str, local_name: &[u8]) -> Result<Option<ElementSpan>, String> {
    Ok(scan(xml, local_name, |_| true, true)?.pop())
}

/// Find the first element with the given local name written with exactly
/// `prefix` (`None` for an unprefixed element).
///
/// Keeps `p:sldIdLst` apart from an extension's `p14:sldIdLst`.
pub fn find_prefixed_element(
    xml: &str,
    prefix: Option<&str>,
    local_name: &[u8],
) -> Result<Option<ElementSpan>, String> {
    let wanted = prefix.map(str::as_bytes);
    Ok(scan(xml, local_name, |qname| prefix_bytes(qname) == wanted, true)?.pop())
}

/// Every outermost element with the given local name, in document order.
pub fn find_elements(xml: &str, local_name: &[u8]) -> Result<Vec<ElementSpan>, String> {
    scan(xml, local_name, |_| true, false)
}

fn scan(
    xml: &str,
    local_name: &[u8],
    accept: impl Fn(&[u8]) -> bool,
    first_only: bool,
) -> Result<Vec<ElementSpan>, String> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut found = Vec::new();
    let mut open: Option<(usize, usize, Option<String>)> = None;
    let mut depth = 0usize;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| format!("XML error at byte {}: {}", before, e))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(ref e) if e.local_name().as_ref() == local_name && accept(e.name().as_ref()) => {
                if open.is_some() {
                    depth += 1;
                } else {
                    open = Some((before, after, prefix_of(e.name().as_ref())));
                    depth = 1;
                }
            },
            Event::Empty(ref e)
                if open.is_none() && e.local_name().as_ref() == local_name && accept(e.name().as_ref()) =>
            {
                found.push(ElementSpan {
                    outer: before..after,
                    inner: after..after,
                    prefix: prefix_of(e.name().as_ref()),
                });
            },
            Event::End(ref e) if e.local_name().as_ref() == local_name && accept(e.name().as_ref()) => {
                if let Some((start, inner_start, ref prefix)) = open {
                    depth -= 1;
                    if depth == 0 {
                        found.push(ElementSpan {
                            outer: start..after,
                            inner: inner_start..before,
                            prefix: prefix.clone(),
                        });
                        open = None;
                    }
                }
            },
            Event::Eof => return Ok(found),
            _ => {},
        }
        if first_only && !found.is_empty() {
            return Ok(found);
        }
    }
}

/// Namespace prefix of the document's root element (`p` for `<p:presentation>`).
pub fn root_prefix(xml: &str) -> Result<Option<String>, String> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                return Ok(prefix_of(e.name().as_ref()));
            },
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(e.to_string()),
            _ => {},
        }
    }
}

/// Byte range of the root element's start tag.
pub fn root_start_tag(xml: &str) -> Result<Option<Range<usize>>, String> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(_)) | Ok(Event::Empty(_)) => {
                return Ok(Some(before..reader.buffer_position() as usize));
            },
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(e.to_string()),
            _ => {},
        }
    }
}

/// Qualify a local name with an optional prefix.
#[inline]
pub fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    }
}

fn prefix_bytes(qname: &[u8]) -> Option<&[u8]> {
    memchr::memchr(b':', qname).map(|pos| &qname[..pos])
}

fn prefix_of(qname: &[u8]) -> Option<String> {
    std::str::from_utf8(prefix_bytes(qname)?).ok().map(str::to_string)
}
