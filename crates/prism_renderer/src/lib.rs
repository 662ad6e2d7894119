//! PRISM Renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer for spheres with diffuse, metal and glass
//! materials, a thin-lens camera with motion blur, and a threaded render
//! session that fills an RGBA8 framebuffer row by row.

mod camera;
mod engine;
mod framebuffer;
mod hittable;
mod material;
mod renderer;
mod sphere;

pub use camera::{Camera, CameraConfig};
pub use engine::{Engine, EngineError, Progress, MAX_IMAGE_DIMENSION};
pub use framebuffer::Framebuffer;
pub use hittable::{HitRecord, Hittable, Object, ObjectList};
pub use material::{reflect, refract, Color, Dielectric, Lambertian, Material, Metal, ScatterResult};
pub use renderer::{
    chunk_rng, color_to_rgba, framebuffer_row, linear_to_gamma, ray_color, render, render_pixel,
    render_scanline, sky_gradient, RenderConfig, PIXEL_CHUNK,
};
pub use sphere::{MovingSphere, Sphere};

/// Re-export Vec3 and common math types from prism_math
pub use prism_math::{Aabb, Interval, Ray, Vec3};
