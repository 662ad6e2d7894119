//! Thin-lens camera for ray generation.

use prism_math::sample::{gen_range, random_in_unit_disk};
use prism_math::Vec3;
use rand::RngCore;

use crate::Ray;

/// Parameters a [`Camera`] is derived from.
///
/// Kept alongside the camera so a scene can be written back out.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    // Camera positioning
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub vup: Vec3,

    // Lens settings
    pub vfov: f32,         // Vertical field of view in degrees
    pub aspect_ratio: f32, // Viewport width / height
    pub aperture: f32,     // Lens diameter
    pub focus_dist: f32,   // Distance from camera to plane of perfect focus

    // Shutter interval for motion blur
    pub time0: f32,
    pub time1: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            look_from: Vec3::new(13.0, 2.0, 3.0),
            look_at: Vec3::ZERO,
            vup: Vec3::Y,
            vfov: 20.0,
            aspect_ratio: 1.2,
            aperture: 0.1,
            focus_dist: 10.0,
            time0: 0.0,
            time1: 1.0,
        }
    }
}

impl CameraConfig {
    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, aperture: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.aperture = aperture;
        self.focus_dist = focus_dist;
        self
    }

    /// Set the viewport aspect ratio.
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Set the shutter interval rays are time-sampled from.
    pub fn with_shutter(mut self, time0: f32, time1: f32) -> Self {
        self.time0 = time0;
        self.time1 = time1;
        self
    }
}

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    config: CameraConfig,

    // Derived once from the config
    origin: Vec3,
    lower_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    lens_radius: f32,
}

impl Camera {
    /// Build a camera from its configuration.
    pub fn new(config: CameraConfig) -> Self {
        let theta = config.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = config.aspect_ratio * viewport_height;

        // Calculate camera basis vectors
        let w = (config.look_from - config.look_at).normalize();
        let u = config.vup.cross(w).normalize();
        let v = w.cross(u);

        let origin = config.look_from;
        let horizontal = config.focus_dist * viewport_width * u;
        let vertical = config.focus_dist * viewport_height * v;
        let lower_left = origin - horizontal / 2.0 - vertical / 2.0 - config.focus_dist * w;

        Self {
            lens_radius: config.aperture / 2.0,
            config,
            origin,
            lower_left,
            horizontal,
            vertical,
            u,
            v,
            w,
        }
    }

    /// Generate a ray through normalized viewport coordinates `(s, t)`.
    ///
    /// The origin is jittered across the lens and the time is drawn from
    /// the shutter interval.
    pub fn get_ray(&self, s: f32, t: f32, rng: &mut dyn RngCore) -> Ray {
        let rd = self.lens_radius * random_in_unit_disk(rng);
        let offset = self.u * rd.x + self.v * rd.y;

        let direction =
            self.lower_left + s * self.horizontal + t * self.vertical - self.origin - offset;
        let time = gen_range(rng, self.config.time0, self.config.time1);

        Ray::new(self.origin + offset, direction, time)
    }

    /// The configuration this camera was built from.
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}
