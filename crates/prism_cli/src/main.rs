use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use prism_renderer::Engine;
use prism_scene::{document, random_scene, SceneDocument};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// How often the progress line is logged while rendering.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Log levels selectable on the command line.
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(about = "Render a scene of spheres with a CPU path tracer")]
struct Args {
    /// Scene document to load; the random demo scene is used when absent
    #[arg(long)]
    origine: Option<PathBuf>,

    /// Where to save the scene document once rendering is done
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Where to save the rendered image; the format follows the extension
    #[arg(long = "sauvegarder-image")]
    sauvegarder_image: Option<PathBuf>,

    /// Seed for the demo scene and the render. Given a seed the output is deterministic
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value = "info", help = "Set the logging level")]
    log_level: LogLevel,
}

fn build_engine(args: &Args) -> Result<Engine> {
    let mut engine = match &args.origine {
        Some(path) => document::load(path)
            .with_context(|| format!("Failed to load scene {}", path.display()))?
            .into_engine()?,
        None => {
            let mut engine = Engine::default();
            let seed = args.seed.unwrap_or_else(|| engine.seed());
            engine.set_world(random_scene(&mut StdRng::seed_from_u64(seed)))?;
            log::info!("Generated demo scene with {} objects", engine.world().len());
            engine
        }
    };

    if let Some(seed) = args.seed {
        engine.set_seed(seed)?;
    }
    Ok(engine)
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.clone().into())
        .init();

    log::info!("Starting PRISM");

    let mut engine = build_engine(&args)?;

    if !engine.start() {
        bail!("Render could not be started");
    }

    let mut last_report = Instant::now();
    while engine.is_running() {
        thread::sleep(Duration::from_millis(50));
        if last_report.elapsed() >= PROGRESS_INTERVAL {
            log::info!("{}", engine.progress());
            last_report = Instant::now();
        }
    }
    engine.wait();

    if !engine.is_image_ready() {
        bail!("Render did not complete");
    }
    log::info!("{}", engine.progress());

    if let Some(path) = &args.sauvegarder_image {
        engine
            .framebuffer()
            .save(path)
            .with_context(|| format!("Failed to save image {}", path.display()))?;
        log::info!("Saved image to {}", path.display());
    }

    if let Some(path) = &args.dest {
        document::save(&SceneDocument::from_engine(&engine), path)
            .with_context(|| format!("Failed to save scene {}", path.display()))?;
    }

    Ok(())
}
