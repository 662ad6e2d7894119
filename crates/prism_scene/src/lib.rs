//! PRISM Scene - scene documents and demo scenes.
//!
//! This crate provides:
//!
//! - **Scene documents**: JSON read/write of render settings, camera and objects
//! - **Demo scene**: the randomly generated sphere field used when no document is given
//!
//! # Example
//!
//! ```ignore
//! use prism_scene::document;
//!
//! let mut engine = document::load("scene.json")?.into_engine()?;
//! engine.render()?;
//! engine.framebuffer().save("scene.png")?;
//! ```

pub mod demo;
pub mod document;

// Re-export commonly used types
pub use demo::random_scene;
pub use document::{load, load_from_str, save, DocumentError, DocumentResult, SceneDocument};
