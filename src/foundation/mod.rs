//! Shared primitives: geometry, colors and the error type.

pub mod color;
pub mod core;
pub mod error;
