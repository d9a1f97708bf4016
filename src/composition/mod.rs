//! Collage document model and its XML decoder.

pub mod model;
pub mod parse;
