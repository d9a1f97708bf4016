//! Pure geometry: canvas and node rectangles, aspect-fit crops.

pub mod crop;
pub mod solver;
