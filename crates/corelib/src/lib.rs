//! Core math shared by the loader: glam re-exports and bounding boxes.

pub use glam::{Vec3, vec3};

pub mod bounds;

pub use bounds::{Bounds, BoundsSeed, DEFAULT_SCALE_DIVISOR};
