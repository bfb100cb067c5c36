//! XML text utilities shared by the package and presentation layers.

mod escape;
mod span;
mod tags;

pub use escape::{escape_xml, unescape_xml};
pub use span::{
    ElementSpan, find_element, find_elements, find_prefixed_element, qualified, root_prefix, root_start_tag,
};
pub use tags::{TAG_CLOSE, TAG_OPEN, Tag, contains_tag, find_tags, tag_for};
