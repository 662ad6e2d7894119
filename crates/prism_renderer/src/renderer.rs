//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with configurable depth
//! - Gamma correction
//! - Anti-aliasing via multi-sampling

use crate::{Camera, Color, Framebuffer, Hittable, Ray};
use prism_math::sample::gen_f32;
use prism_math::Interval;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

/// Number of pixels one rayon task renders before other workers can steal.
///
/// Small, because per-pixel cost varies wildly with path depth.
pub const PIXEL_CHUNK: usize = 10;

/// Exponent applied to each channel on writeback.
const GAMMA: f32 = 2.2;

/// Nearest hit distance considered, to avoid self-intersection acne.
const T_MIN: f32 = 0.001;

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Output width in pixels
    pub image_width: u32,
    /// Output height in pixels
    pub image_height: u32,
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Image width / height
    pub aspect_ratio: f32,
    /// Base seed every per-task generator is derived from
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_width: 480,
            image_height: 400,
            samples_per_pixel: 100,
            max_depth: 50,
            aspect_ratio: 480.0 / 400.0,
            seed: 0x5eed_2024,
        }
    }
}

/// Compute the color seen by a ray.
///
/// Traces the ray through the scene, bouncing off surfaces and
/// multiplying in each material's attenuation.
pub fn ray_color(ray: &Ray, world: &dyn Hittable, depth: u32, rng: &mut dyn RngCore) -> Color {
    // Bounce budget exhausted, no more light is gathered
    if depth == 0 {
        return Color::ZERO;
    }

    match world.hit(ray, Interval::new(T_MIN, f32::INFINITY)) {
        Some(rec) => match rec.material.scatter(ray, &rec, rng) {
            Some(result) => {
                result.attenuation * ray_color(&result.scattered, world, depth - 1, rng)
            }
            None => Color::ZERO,
        },
        None => sky_gradient(ray),
    }
}

/// Background seen by rays that escape the scene.
///
/// White at the horizon blending to sky blue at the zenith.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    (1.0 - a) * white + a * blue
}

/// Gamma-correct a linear channel value already clamped to [0, 1].
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    linear.powf(1.0 / GAMMA)
}

/// Convert an accumulated sample sum to 8-bit RGBA.
///
/// Averages over `samples`, clamps to [0, 1], gamma-corrects and rounds.
pub fn color_to_rgba(sum: Color, samples: u32) -> [u8; 4] {
    let color = sum / samples as f32;
    let quantize = |c: f32| (255.0 * linear_to_gamma(Interval::UNIT.clamp(c))).round() as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z), 255]
}

/// Render a single pixel with multi-sampling.
///
/// `(i, j)` has its origin at the lower left of the viewport. Returns the
/// sum of all samples; [`color_to_rgba`] does the averaging.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    i: u32,
    j: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let width_span = config.image_width.saturating_sub(1).max(1) as f32;
    let height_span = config.image_height.saturating_sub(1).max(1) as f32;

    let mut pixel_color = Color::ZERO;
    for _ in 0..config.samples_per_pixel {
        let u = (i as f32 + gen_f32(rng)) / width_span;
        let v = (j as f32 + gen_f32(rng)) / height_span;
        let ray = camera.get_ray(u, v, rng);
        pixel_color += ray_color(&ray, world, config.max_depth, rng);
    }
    pixel_color
}

/// Generator for one chunk of one scanline.
///
/// Derived only from the seed and the chunk's position so output does not
/// depend on which worker picks the chunk up.
pub fn chunk_rng(seed: u64, j: u32, chunk: usize) -> StdRng {
    let position = ((j as u64) << 32) | chunk as u64;
    StdRng::seed_from_u64(seed ^ position.wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

/// Render scanline `j` into `row`, one RGBA pixel per column.
///
/// Columns are split into [`PIXEL_CHUNK`]-sized tasks on the rayon pool;
/// every task writes a disjoint slice of `row`.
pub fn render_scanline(
    camera: &Camera,
    world: &dyn Hittable,
    config: &RenderConfig,
    j: u32,
    row: &mut [[u8; 4]],
) {
    row.par_chunks_mut(PIXEL_CHUNK)
        .enumerate()
        .for_each(|(chunk, pixels)| {
            let mut rng = chunk_rng(config.seed, j, chunk);
            for (k, pixel) in pixels.iter_mut().enumerate() {
                let i = (chunk * PIXEL_CHUNK + k) as u32;
                let sum = render_pixel(camera, world, i, j, config, &mut rng);
                *pixel = color_to_rgba(sum, config.samples_per_pixel);
            }
        });
}

/// Framebuffer row that scanline `j` is stored in.
///
/// Scanlines are rendered from `j = height - 1` (top of the viewport) down
/// to 0 and land in rows 0, 1, ... in that order.
#[inline]
pub fn framebuffer_row(j: u32, image_height: u32) -> u32 {
    (image_height - 1) - j
}

/// Render the entire scene into a new framebuffer on the calling thread's
/// rayon pool, without progress reporting or cancellation.
pub fn render(camera: &Camera, world: &dyn Hittable, config: &RenderConfig) -> Framebuffer {
    let mut image = Framebuffer::new(config.image_width, config.image_height);
    let mut row = vec![[0u8; 4]; config.image_width as usize];

    for j in (0..config.image_height).rev() {
        render_scanline(camera, world, config, j, &mut row);
        image.write_row(framebuffer_row(j, config.image_height), &row);
    }

    image
}

/// Sky-only image built by replaying each chunk generator sample by sample.
///
/// Matches [`render`] exactly for a world nothing can hit, since escaping
/// rays draw nothing past the camera.
#[cfg(test)]
pub(crate) fn sky_reference(camera: &Camera, config: &RenderConfig) -> Framebuffer {
    let (width, height) = (config.image_width, config.image_height);
    let width_span = width.saturating_sub(1).max(1) as f32;
    let height_span = height.saturating_sub(1).max(1) as f32;
    let mut image = Framebuffer::new(width, height);

    for j in (0..height).rev() {
        let mut row = vec![[0u8; 4]; width as usize];
        for (chunk, pixels) in row.chunks_mut(PIXEL_CHUNK).enumerate() {
            let mut rng = chunk_rng(config.seed, j, chunk);
            for (k, pixel) in pixels.iter_mut().enumerate() {
                let i = chunk * PIXEL_CHUNK + k;
                let mut sum = Color::ZERO;
                for _ in 0..config.samples_per_pixel {
                    let u = (i as f32 + gen_f32(&mut rng)) / width_span;
                    let v = (j as f32 + gen_f32(&mut rng)) / height_span;
                    sum += sky_gradient(&camera.get_ray(u, v, &mut rng));
                }
                *pixel = color_to_rgba(sum, config.samples_per_pixel);
            }
        }
        image.write_row(framebuffer_row(j, height), &row);
    }

    image
}
