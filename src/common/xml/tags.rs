//! `{{NAME}}` substitution tags.
//!
//! A tag is two opening braces, a name made of ASCII letters, digits, `_`,
//! `-` or `.`, and two closing braces. Tags are matched inside a single
//! text run only; a tag split over adjacent runs is not found.
use memchr::memmem;

/// Opening delimiter of a substitution tag.
pub const TAG_OPEN: &str = "{{";

/// Closing delimiter of a substitution tag.
pub const TAG_CLOSE: &str = "}}";

/// A tag occurrence inside a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    /// The full tag including braces, e.g. `{{TITLE}}`.
    pub literal: &'a str,
    /// The bare name, e.g. `TITLE`.
    pub name: &'a str,
}

#[inline]
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')
}

/// Iterate over every well-formed tag in `text`, in order of appearance.
///
/// # Examples
///
/// ```
/// use slideforge::common::xml::find_tags;
/// let names: Vec<_> = find_tags("{{TITLE}} by {{ author }} {{BODY}}")
///     .map(|t| t.name)
///     .collect();
/// assert_eq!(names, ["TITLE", "BODY"]);
/// ```
pub fn find_tags(text: &str) -> impl Iterator<Item = Tag<'_>> + '_ {
    let bytes = text.as_bytes();
    let finder = memmem::Finder::new(TAG_OPEN.as_bytes());
    let mut pos = 0usize;

    std::iter::from_fn(move || {
        while let Some(rel) = finder.find(&bytes[pos..]) {
            let start = pos + rel;
            let name_start = start + TAG_OPEN.len();
            let name_len = bytes[name_start..]
                .iter()
                .take_while(|&&b| is_name_byte(b))
                .count();
            let name_end = name_start + name_len;

            if name_len > 0 && bytes[name_end..].starts_with(TAG_CLOSE.as_bytes()) {
                let end = name_end + TAG_CLOSE.len();
                pos = end;
                return Some(Tag {
                    literal: &text[start..end],
                    name: &text[name_start..name_end],
                });
            }
            // Not a tag; resume one byte further so "{{{X}}" still finds "{{X}}".
            pos = start + 1;
        }
        None
    })
}

/// Whether `text` contains at least one well-formed tag.
#[inline]
pub fn contains_tag(text: &str) -> bool {
    find_tags(text).next().is_some()
}

/// Build the literal tag for a name.
#[inline]
pub fn tag_for(name: &str) -> String {
    format!("{TAG_OPEN}{name}{TAG_CLOSE}")
}
