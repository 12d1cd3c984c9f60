//! lumen2d demo runner
//!
//! Opens a macroquad window sized from `lumen2d.ron` (defaults if the file
//! is absent) and drives the demo scene until it stops running.

mod demo;
mod platform;

use lumen2d::config::EngineConfig;
use lumen2d::scene::Scene;
use macroquad::prelude::{get_frame_time, next_frame, Conf};

const CONFIG_PATH: &str = "lumen2d.ron";

fn window_conf() -> Conf {
    // Errors are reported from main once logging is up
    let config = EngineConfig::load_or_default(CONFIG_PATH).unwrap_or_default();
    Conf {
        window_title: format!("{} v{}", config.window.title, lumen2d::VERSION),
        window_width: config.window.width,
        window_height: config.window.height,
        window_resizable: config.window.resizable,
        high_dpi: true,
        ..Default::default()
    }
}

async fn run() -> anyhow::Result<()> {
    let config = EngineConfig::load_or_default(CONFIG_PATH)?;
    lumen2d::logging::init(&config.log_filter);
    tracing::info!(version = lumen2d::VERSION, "starting");

    let mut scene = Scene::new(config.scene.clone(), demo::behaviors())?;
    demo::build(&mut scene)?;

    let mut input = platform::MacroquadInput::new();
    let mut renderer = platform::MacroquadRenderer::new();

    while scene.is_running() {
        input.collect();
        scene.process_input(&mut input)?;
        scene.update(get_frame_time())?;
        scene.render(&mut renderer)?;
        next_frame().await;
    }

    tracing::info!(frames = scene.frame_count(), "scene closed");
    Ok(())
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    if let Err(err) = run().await {
        tracing::error!("fatal: {err:#}");
        eprintln!("lumen2d: {err:#}");
        std::process::exit(1);
    }
}
