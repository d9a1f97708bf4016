//! Image source resolution, decoding and loading.

pub mod decode;
pub mod path;
pub mod store;
