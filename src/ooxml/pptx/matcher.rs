//! Picking a layout for a content record.
//!
//! Matching never fails. Rules are tried in order and the earliest entry in
//! discovery order wins within a rule:
//!
//! 1. the entry whose normalized name equals the normalized semantic type
//! 2. an entry whose slide layout type corresponds to the semantic type
//! 3. the general entry: the first flagged `default`, else the first whose
//!    name matches a configured alias, aliases tried in order
//! 4. the first entry

use crate::ooxml::pptx::manifest::LayoutManifestEntry;
use crate::ooxml::pptx::resolver::ResolvedLayouts;

/// Which rule selected the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Name,
    LayoutType,
    Default,
    Alias,
    First,
}

/// The layout chosen for a record and why.
#[derive(Debug, Clone, Copy)]
pub struct LayoutMatch<'a> {
    pub entry: &'a LayoutManifestEntry,
    pub rule: MatchRule,
}

/// Lowercase ASCII alphanumerics only: `"Title Slide"` and `title_slide`
/// both become `titleslide`.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Slide layout types (`sldLayout/@type`) that suit a semantic type.
pub fn layout_types_for(semantic_type: &str) -> &'static [&'static str] {
    match normalize(semantic_type).as_str() {
        "title" | "titleslide" | "cover" | "opening" => &["title"],
        "section" | "sectionheader" | "divider" => &["secHead"],
        "content" | "bullets" | "text" | "list" | "body" | "titleandcontent" => &["obj", "tx"],
        "twocolumn" | "twocontent" | "comparison" => &["twoObj", "twoTxTwoObj", "twoColTx"],
        "titleonly" => &["titleOnly"],
        "blank" => &["blank"],
        "picture" | "image" | "photo" => &["picTx"],
        "table" => &["tbl"],
        "chart" => &["chart"],
        "caption" | "contentwithcaption" => &["objTx"],
        _ => &[],
    }
}

/// Choose the layout for `semantic_type`.
///
/// `aliases` name the general-purpose layout, tried in order when no entry
/// is flagged as the default.
pub fn match_layout<'a, S: AsRef<str>>(
    layouts: &'a ResolvedLayouts,
    semantic_type: &str,
    aliases: &[S],
) -> LayoutMatch<'a> {
    let wanted = normalize(semantic_type);

    if !wanted.is_empty() {
        if let Some(entry) = layouts.iter().find(|e| normalize(&e.name) == wanted) {
            return LayoutMatch {
                entry,
                rule: MatchRule::Name,
            };
        }
    }

    let types = layout_types_for(semantic_type);
    if let Some(entry) = layouts.iter().find(|e| {
        e.layout_type
            .as_deref()
            .is_some_and(|t| types.contains(&t))
    }) {
        return LayoutMatch {
            entry,
            rule: MatchRule::LayoutType,
        };
    }

    if let Some(entry) = layouts.iter().find(|e| e.default) {
        return LayoutMatch {
            entry,
            rule: MatchRule::Default,
        };
    }

    for alias in aliases {
        let alias = normalize(alias.as_ref());
        if let Some(entry) = layouts.iter().find(|e| normalize(&e.name) == alias) {
            return LayoutMatch {
                entry,
                rule: MatchRule::Alias,
            };
        }
    }

    LayoutMatch {
        entry: layouts.first(),
        rule: MatchRule::First,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALIASES: [&str; 3] = ["general", "default", "content"];

    fn layouts(entries: Vec<LayoutManifestEntry>) -> ResolvedLayouts {
        ResolvedLayouts::new(entries).unwrap()
    }

    #[test]
    fn test_name_match_is_normalized() {
        let l = layouts(vec![
            LayoutManifestEntry::new("Title Slide", 1),
            LayoutManifestEntry::new("Two-Column", 2),
        ]);
        let m = match_layout(&l, "two_column", &ALIASES);
        assert_eq!(m.entry.name, "Two-Column");
        assert_eq!(m.rule, MatchRule::Name);
    }

    #[test]
    fn test_layout_type_match() {
        let l = layouts(vec![
            LayoutManifestEntry::new("Opening", 1).with_layout_type("title"),
            LayoutManifestEntry::new("Main", 2).with_layout_type("obj"),
            LayoutManifestEntry::new("Other", 3).with_layout_type("obj"),
        ]);
        let m = match_layout(&l, "bullets", &ALIASES);
        assert_eq!(m.entry.name, "Main");
        assert_eq!(m.rule, MatchRule::LayoutType);
    }

    #[test]
    fn test_default_flag_beats_alias() {
        let l = layouts(vec![
            LayoutManifestEntry::new("title", 1),
            LayoutManifestEntry::new("general", 2),
            LayoutManifestEntry::new("fallback", 3).as_default(),
        ]);
        let m = match_layout(&l, "unknown-type", &ALIASES);
        assert_eq!(m.entry.name, "fallback");
        assert_eq!(m.rule, MatchRule::Default);
    }

    #[test]
    fn test_aliases_tried_in_order() {
        let l = layouts(vec![
            LayoutManifestEntry::new("title", 1),
            LayoutManifestEntry::new("content", 2),
            LayoutManifestEntry::new("quote", 3),
            LayoutManifestEntry::new("Default", 4),
        ]);
        let m = match_layout(&l, "mystery", &ALIASES);
        assert_eq!(m.entry.name, "Default");
        assert_eq!(m.rule, MatchRule::Alias);
    }

    #[test]
    fn test_first_entry_fallback() {
        let l = layouts(vec![
            LayoutManifestEntry::new("cover", 1),
            LayoutManifestEntry::new("quote", 2),
        ]);
        let m = match_layout(&l, "", &ALIASES);
        assert_eq!(m.entry.name, "cover");
        assert_eq!(m.rule, MatchRule::First);
    }
}
