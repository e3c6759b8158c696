//! Core 2-D particle simulation and interaction engine.
//!
//! Main components:
//! - [`engine`]: the [`engine::Engine`] state machine and per-frame update.
//! - [`particle`]: a single particle, its evolution and its drawing.
//! - [`pairwise`]: linking lines, attraction and contact bounce.
//! - [`pointer`]: pointer state, click sessions, grab/bubble/repulse.
//! - [`density`]: keeps the population proportional to the surface area.
//! - [`config`]: the serde configuration tree and its defaults.
//! - [`render`]: the canvas-like [`render::Renderer`] seam and a recording
//!   implementation.
//! - [`frame`]: frame scheduling and clock abstractions.
//! - [`types`]: colors, shapes and surface size.
//! - [`error`]: the crate error type.

pub mod config;
pub mod density;
pub mod engine;
pub mod error;
pub mod frame;
pub mod pairwise;
pub mod particle;
pub mod pointer;
pub mod render;
pub mod types;

pub use error::{Error, Result};
