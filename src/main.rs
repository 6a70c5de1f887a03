mod app;
mod config;
mod engine;
mod scene;
mod util;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::scene::Scene;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Number of nodes in the generated demo scene.
    #[arg(long, default_value_t = 240)]
    nodes: usize,

    /// JSON file overriding the engine tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)),
        )
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    tracing::info!(
        frame_interval_ms = config.frame_interval_ms,
        index_threshold = config.index_threshold,
        "engine configured"
    );

    let scene = Scene::demo(args.nodes);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "nodeweave",
        options,
        Box::new(move |cc| Ok(Box::new(app::GraphEditorApp::new(cc, scene, config)))),
    )
    .map_err(|err| anyhow::anyhow!("editor window failed: {err}"))
}
