//! Render session: settings, scene, camera and a background render pass.
//!
//! The [`Engine`] owns everything a render needs. [`Engine::start`] snapshots
//! the camera, scene and settings and hands them to a worker thread which
//! renders scanline by scanline, committing each finished row to the shared
//! [`Framebuffer`]. Progress can be polled while the pass runs.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info};
use thiserror::Error;

use crate::renderer::{framebuffer_row, render_scanline};
use crate::{Camera, CameraConfig, Framebuffer, Object, ObjectList, RenderConfig};

/// Largest accepted image width or height, in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 1 << 15;

/// Errors returned by [`Engine`] mutators.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("cannot change render settings while a render is in progress")]
    RenderInProgress,

    #[error("invalid {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },
}

/// State shared between the engine and its render worker.
#[derive(Debug)]
struct RenderShared {
    running: AtomicBool,
    image_ready: AtomicBool,
    stop: AtomicBool,
    rows_remaining: AtomicU32,
    render_time: Mutex<Option<Duration>>,
    framebuffer: Mutex<Framebuffer>,
}

impl RenderShared {
    fn new(width: u32, height: u32) -> Self {
        Self {
            running: AtomicBool::new(false),
            image_ready: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            rows_remaining: AtomicU32::new(0),
            render_time: Mutex::new(None),
            framebuffer: Mutex::new(Framebuffer::new(width, height)),
        }
    }

    fn framebuffer(&self) -> MutexGuard<'_, Framebuffer> {
        self.framebuffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render_time(&self) -> MutexGuard<'_, Option<Duration>> {
        self.render_time.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the running flag when the worker exits, even by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Snapshot of a render pass's progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub total_rows: u32,
    pub rows_remaining: u32,
    pub elapsed: Duration,
    pub running: bool,
}

impl Progress {
    /// Fraction of rows finished, in [0, 1].
    pub fn fraction(&self) -> f32 {
        if self.total_rows == 0 {
            return 1.0;
        }
        let done = self.total_rows.saturating_sub(self.rows_remaining);
        (done as f32 / self.total_rows as f32).clamp(0.0, 1.0)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = 40;
        let percent = self.fraction();
        let filled = ((width - 1) as f32 * percent).round() as usize;
        write!(
            f,
            "[{empty:=>left$}>{empty:.<right$}] {pct:.1}% {rows} rows left, {secs:.1}s",
            empty = "",
            left = filled,
            right = width - 1 - filled,
            pct = 100.0 * percent,
            rows = self.rows_remaining,
            secs = self.elapsed.as_secs_f32(),
        )
    }
}

/// A render session.
///
/// At most one render is in flight; every mutator fails with
/// [`EngineError::RenderInProgress`] while it runs.
#[derive(Debug)]
pub struct Engine {
    config: RenderConfig,
    camera: Camera,
    world: Arc<ObjectList>,
    shared: Arc<RenderShared>,
    worker: Option<JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl Default for Engine {
    fn default() -> Self {
        let config = RenderConfig::default();
        let camera = CameraConfig::default().with_aspect_ratio(config.aspect_ratio);
        Self::build(config, camera, ObjectList::new())
    }
}

impl Engine {
    /// Create an engine with an empty scene.
    pub fn new(config: RenderConfig, camera: CameraConfig) -> Result<Self, EngineError> {
        validate(&config)?;
        Ok(Self::build(config, camera, ObjectList::new()))
    }

    fn build(config: RenderConfig, camera: CameraConfig, world: ObjectList) -> Self {
        let shared = RenderShared::new(config.image_width, config.image_height);
        Self {
            config,
            camera: Camera::new(camera),
            world: Arc::new(world),
            shared: Arc::new(shared),
            worker: None,
            started_at: None,
        }
    }

    // ===== Settings =====

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn image_width(&self) -> u32 {
        self.config.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.config.image_height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.config.samples_per_pixel
    }

    pub fn max_depth(&self) -> u32 {
        self.config.max_depth
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.aspect_ratio
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Set the output width; the aspect ratio follows.
    pub fn set_image_width(&mut self, width: u32) -> Result<(), EngineError> {
        self.ensure_idle()?;
        dimension("image_width", width)?;
        self.config.image_width = width;
        self.config.aspect_ratio = width as f32 / self.config.image_height as f32;
        Ok(())
    }

    /// Set the output height; the aspect ratio follows.
    pub fn set_image_height(&mut self, height: u32) -> Result<(), EngineError> {
        self.ensure_idle()?;
        dimension("image_height", height)?;
        self.config.image_height = height;
        self.config.aspect_ratio = self.config.image_width as f32 / height as f32;
        Ok(())
    }

    /// Set both output dimensions at once.
    pub fn set_image_size(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.ensure_idle()?;
        dimension("image_width", width)?;
        dimension("image_height", height)?;
        self.config.image_width = width;
        self.config.image_height = height;
        self.config.aspect_ratio = width as f32 / height as f32;
        Ok(())
    }

    /// Set the aspect ratio; the height is recomputed from the width.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) -> Result<(), EngineError> {
        self.ensure_idle()?;
        let invalid = || EngineError::InvalidSetting {
            name: "aspect_ratio",
            value: aspect_ratio.to_string(),
        };
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(invalid());
        }
        let height = (self.config.image_width as f32 / aspect_ratio).trunc();
        if !(1.0..=MAX_IMAGE_DIMENSION as f32).contains(&height) {
            return Err(invalid());
        }
        self.config.aspect_ratio = aspect_ratio;
        self.config.image_height = height as u32;
        Ok(())
    }

    pub fn set_samples_per_pixel(&mut self, samples: u32) -> Result<(), EngineError> {
        self.ensure_idle()?;
        nonzero("samples_per_pixel", samples)?;
        self.config.samples_per_pixel = samples;
        Ok(())
    }

    pub fn set_max_depth(&mut self, depth: u32) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.config.max_depth = depth;
        Ok(())
    }

    pub fn set_seed(&mut self, seed: u64) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.config.seed = seed;
        Ok(())
    }

    // ===== Camera and scene =====

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Install a camera exactly as configured.
    pub fn set_camera(&mut self, config: CameraConfig) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.camera = Camera::new(config);
        Ok(())
    }

    /// Install a camera whose aspect ratio is taken from the current image settings.
    pub fn set_camera_fitted(&mut self, config: CameraConfig) -> Result<(), EngineError> {
        let aspect_ratio = self.config.aspect_ratio;
        self.set_camera(config.with_aspect_ratio(aspect_ratio))
    }

    pub fn world(&self) -> &ObjectList {
        &self.world
    }

    /// Append an object to the scene.
    pub fn add_object(&mut self, object: impl Into<Object>) -> Result<(), EngineError> {
        self.ensure_idle()?;
        Arc::make_mut(&mut self.world).add(object);
        Ok(())
    }

    /// Replace the whole scene.
    pub fn set_world(&mut self, world: ObjectList) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.world = Arc::new(world);
        Ok(())
    }

    // ===== Rendering =====

    /// Start a render pass on a background thread.
    ///
    /// Returns `false` without doing anything if a pass is already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.wait();

        let config = self.config.clone();
        let camera = self.camera.clone();
        let world = Arc::clone(&self.world);
        let shared = Arc::clone(&self.shared);

        shared.stop.store(false, Ordering::Release);
        shared.image_ready.store(false, Ordering::Release);
        shared
            .rows_remaining
            .store(config.image_height, Ordering::Release);
        *shared.render_time() = None;
        *shared.framebuffer() = Framebuffer::new(config.image_width, config.image_height);
        shared.running.store(true, Ordering::Release);

        info!(
            "Rendering {}x{} @ {} spp, depth {}, {} objects",
            config.image_width,
            config.image_height,
            config.samples_per_pixel,
            config.max_depth,
            world.len()
        );

        let started = Instant::now();
        let spawned = thread::Builder::new()
            .name("prism-render".into())
            .spawn(move || {
                let _running = RunningGuard(&shared.running);
                if render_pass(&shared, &camera, &world, &config) {
                    let elapsed = started.elapsed();
                    *shared.render_time() = Some(elapsed);
                    shared.image_ready.store(true, Ordering::Release);
                    info!("Render complete in {:.2}s", elapsed.as_secs_f32());
                }
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                self.started_at = Some(started);
                true
            }
            Err(e) => {
                error!("Failed to spawn render thread: {}", e);
                self.shared.running.store(false, Ordering::Release);
                false
            }
        }
    }

    /// Render on a background thread and block until it finishes.
    pub fn render(&mut self) -> Result<(), EngineError> {
        if !self.start() {
            return Err(EngineError::RenderInProgress);
        }
        self.wait();
        Ok(())
    }

    /// Block until the current pass, if any, has finished.
    pub fn wait(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Render thread panicked");
            }
        }
    }

    /// Stop the current pass after the row in progress and wait for it.
    ///
    /// A cancelled pass leaves the image marked as not ready.
    pub fn cancel(&mut self) {
        if self.is_running() {
            info!("Cancelling render");
        }
        self.shared.stop.store(true, Ordering::Release);
        self.wait();
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether the last pass ran to completion.
    pub fn is_image_ready(&self) -> bool {
        self.shared.image_ready.load(Ordering::Acquire)
    }

    /// Copy of the framebuffer as of the last committed row.
    pub fn framebuffer(&self) -> Framebuffer {
        self.shared.framebuffer().clone()
    }

    /// Index of the scanline being rendered; 0 once a pass completes.
    pub fn rows_remaining(&self) -> u32 {
        self.shared.rows_remaining.load(Ordering::Acquire)
    }

    /// When the last pass was started.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn progress(&self) -> Progress {
        let elapsed = match *self.shared.render_time() {
            Some(total) => total,
            None => self.started_at.map(|t| t.elapsed()).unwrap_or_default(),
        };
        Progress {
            total_rows: self.shared.framebuffer().height(),
            rows_remaining: self.rows_remaining(),
            elapsed,
            running: self.is_running(),
        }
    }

    /// Fail while a pass is running; otherwise reap the finished worker
    /// so the scene is no longer shared with it.
    fn ensure_idle(&mut self) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::RenderInProgress);
        }
        self.wait();
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.wait();
    }
}

fn validate(config: &RenderConfig) -> Result<(), EngineError> {
    dimension("image_width", config.image_width)?;
    dimension("image_height", config.image_height)?;
    nonzero("samples_per_pixel", config.samples_per_pixel)
}

fn dimension(name: &'static str, value: u32) -> Result<(), EngineError> {
    if value > MAX_IMAGE_DIMENSION {
        return Err(EngineError::InvalidSetting {
            name,
            value: value.to_string(),
        });
    }
    nonzero(name, value)
}

fn nonzero(name: &'static str, value: u32) -> Result<(), EngineError> {
    if value == 0 {
        return Err(EngineError::InvalidSetting {
            name,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Render every scanline top to bottom; returns `false` if stopped early.
fn render_pass(
    shared: &RenderShared,
    camera: &Camera,
    world: &ObjectList,
    config: &RenderConfig,
) -> bool {
    let height = config.image_height;
    let mut row = vec![[0u8; 4]; config.image_width as usize];

    for j in (0..height).rev() {
        if shared.stop.load(Ordering::Acquire) {
            info!("Render cancelled with {} rows remaining", j + 1);
            return false;
        }
        shared.rows_remaining.store(j, Ordering::Release);

        render_scanline(camera, world, config, j, &mut row);
        shared.framebuffer().write_row(framebuffer_row(j, height), &row);
        debug!("Row {} done", j);
    }

    shared.rows_remaining.store(0, Ordering::Release);
    true
}
