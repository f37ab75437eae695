//! Value types shared by the scanner, masking engine, vault and re-identifier.

pub mod mapping;
pub mod policy;
pub mod span;

pub use mapping::TokenMapping;
pub use policy::{Policy, RedactionMode, DEFAULT_CONFIDENCE_SCORE};
pub use span::{resolve_overlaps, DetectedSpan};
