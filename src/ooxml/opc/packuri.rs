//! Part names inside a package.
//!
//! A `PackURI` is the absolute, slash-separated name of a part such as
//! `/ppt/slides/slide3.xml`. The zip member name is the same string without
//! the leading slash.

use crate::ooxml::opc::error::{OpcError, Result};
use std::borrow::Borrow;

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

/// Absolute name of a part within a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a PackURI; the string must begin with a forward slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(OpcError::InvalidPackUri(format!(
                "PackURI must begin with slash, got '{}'",
                uri
            )));
        }
        Ok(PackURI { uri })
    }

    /// Create a PackURI from a zip member name (`ppt/slides/slide1.xml`).
    pub fn from_membername(name: &str) -> Result<Self> {
        Self::new(format!("/{}", name.trim_start_matches('/')))
    }

    /// Resolve a relationship target (`../slideLayouts/slideLayout1.xml`)
    /// against the directory of the source part (`/ppt/slides`).
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };

        let mut segments: Vec<&str> = Vec::new();
        for segment in joined.split('/') {
            match segment {
                "" | "." => {},
                ".." => {
                    segments.pop();
                },
                other => segments.push(other),
            }
        }
        Self::new(format!("/{}", segments.join("/")))
    }

    /// Directory portion: `/ppt/slides` for `/ppt/slides/slide1.xml`.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// File name portion: `slide1.xml` for `/ppt/slides/slide1.xml`.
    pub fn filename(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or("")
    }

    /// Extension without the leading period.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Numeric suffix of a tuple partname: 21 for `/ppt/slides/slide21.xml`,
    /// `None` for singleton partnames like `/ppt/presentation.xml`.
    pub fn idx(&self) -> Option<u32> {
        let filename = self.filename();
        let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);
        let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 || digits == stem.len() {
            return None;
        }
        atoi_simd::parse::<u32, false, false>(stem[stem.len() - digits..].as_bytes()).ok()
    }

    /// Zip member name (the URI without its leading slash).
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this part, as written in a
    /// relationship `Target` attribute.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == PACKAGE_URI {
            return self.membername().to_string();
        }

        let from: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

        let mut parts: Vec<&str> = vec![".."; from.len() - common];
        parts.extend_from_slice(&to[common..]);
        parts.join("/")
    }

    /// PackURI of the relationship part for this part:
    /// `/ppt/slides/_rels/slide1.xml.rels` for `/ppt/slides/slide1.xml`.
    pub fn rels_uri(&self) -> Result<PackURI> {
        if self.uri == PACKAGE_URI {
            return Self::new("/_rels/.rels");
        }
        let base = self.base_uri();
        let prefix = if base == PACKAGE_URI { "" } else { base };
        Self::new(format!("{}/_rels/{}.rels", prefix, self.filename()))
    }

    /// Inverse of [`rels_uri`](Self::rels_uri): the source part a relationship
    /// part belongs to, or `None` if this is not a relationship part.
    pub fn rels_source(&self) -> Option<PackURI> {
        let filename = self.filename().strip_suffix(".rels")?;
        let dir = self.base_uri().strip_suffix("/_rels")?;
        Some(PackURI {
            uri: format!("{}/{}", dir, filename),
        })
    }

    /// Whether this is a relationship part (`*/_rels/*.rels`).
    #[inline]
    pub fn is_rels_part(&self) -> bool {
        self.rels_source().is_some()
    }

    /// Get the full URI string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

impl Borrow<str> for PackURI {
    fn borrow(&self) -> &str {
        &self.uri
    }
}
