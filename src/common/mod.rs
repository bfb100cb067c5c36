//! Utilities shared across the package and presentation layers.

pub mod xml;
