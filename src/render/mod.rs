//! Rasterization of draw plans and encoding of rendered frames.

/// Frame type and backend contract.
pub mod backend;
pub(crate) mod blur;
pub(crate) mod composite;
/// `vello_cpu` rasterizer.
pub mod cpu;
/// One-shot render helpers and encoders.
pub mod pipeline;
