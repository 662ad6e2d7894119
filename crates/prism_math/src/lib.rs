//! PRISM Math - vectors, rays, intervals, bounding boxes and random sampling.
//!
//! Vector algebra comes straight from glam's `Vec3`; this crate adds the
//! small amount the path tracer needs on top.

// Re-export glam for convenience
pub use glam::*;

// PRISM math types
mod aabb;
mod interval;
mod ray;
pub mod sample;
mod vector;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use vector::Vec3Ext;
