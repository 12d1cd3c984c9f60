//! lumen2d: a small 2D game engine core
//!
//! - `ecs`: identifier-keyed dense storage, component registry, views
//! - `scene`: frame driver with transform hierarchy, behaviors, deferred
//!   calls, end-of-frame deletion and camera resolution
//! - `config` / `logging`: startup plumbing for binaries
//!
//! Windowing, drawing and input polling live outside the core behind the
//! `Renderer` and `InputSource` traits, so the whole scene runs headless
//! in tests.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod ecs;
pub mod logging;
pub mod math;
pub mod scene;

pub use config::{ConfigError, EngineConfig};
pub use ecs::{EcsError, EntityRegistry, Identifier};
pub use scene::{Scene, SceneError};
