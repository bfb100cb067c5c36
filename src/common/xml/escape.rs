use aho_corasick::{AhoCorasick, MatchKind};
use memchr::memmem;
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

// Use LeftmostLongest to ensure longer entities are matched first (e.g., &amp; instead of &lt;)
static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
        .expect("Failed to build XML unescaper")
});

/// Escape the five XML special characters (`& < > " '`).
///
/// The output is safe both as element text and as a quoted attribute value.
///
/// # Examples
///
/// ```
/// use slideforge::common::xml::escape_xml;
/// assert_eq!(escape_xml("Q&A <Session>"), "Q&amp;A &lt;Session&gt;");
/// assert_eq!(escape_xml("it's \"fine\""), "it&apos;s &quot;fine&quot;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Unescape XML text taken verbatim from a part.
///
/// Handles the five predefined entities plus decimal (`&#38;`) and
/// hexadecimal (`&#x26;`) character references. Unknown or malformed
/// references are left unchanged.
///
/// # Examples
///
/// ```
/// use slideforge::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("caf&#233; &#x26; bar"), "café & bar");
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// ```
pub fn unescape_xml(s: &str) -> String {
    let named = XML_UNESCAPER.replace_all(s, &["&", "<", ">", "\"", "'"]);
    if memmem::find(s.as_bytes(), b"&#").is_none() {
        return named;
    }
    // Numeric references are resolved against the original text so that
    // `&amp;#38;` stays a literal "&#38;".
    resolve_char_refs(s)
}

fn resolve_char_refs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';') {
            Some(semi) => {
                let entity = &tail[1..semi];
                match decode_entity(entity) {
                    Some(ch) => out.push(ch),
                    None => out.push_str(&tail[..=semi]),
                }
                rest = &tail[semi + 1..];
            },
            None => {
                out.push_str(tail);
                rest = "";
            },
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        },
    }
}
