mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use renderkit_common::CullMode;
use renderkit_render::{FrameOutcome, RecordingBackend, RenderError, Renderer};
use renderkit_view::ViewConfig;
use renderkit_wgpu::{RendererConfig, WgpuRenderer};
use tracing_subscriber::EnvFilter;

use crate::scene::{Scene, install_spin};

#[derive(Parser)]
#[command(name = "renderkit-viewer", about = "Render a scene of lit mesh instances")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a window and render the scene continuously
    View {
        /// Scene file (JSON); the built-in demo scene is used when omitted
        #[arg(long)]
        scene: Option<PathBuf>,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// MSAA sample count
        #[arg(long, default_value = "1")]
        samples: u32,
        /// Override the scene's cull mode
        #[arg(long)]
        cull: Option<CullArg>,
    },
    /// Render frames without a window and log what would be drawn
    Headless {
        #[arg(long)]
        scene: Option<PathBuf>,
        /// Number of frames to draw
        #[arg(short, long, default_value = "3")]
        frames: u32,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        #[arg(long)]
        cull: Option<CullArg>,
    },
    /// Print crate versions
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum CullArg {
    None,
    Back,
    Front,
}

impl From<CullArg> for CullMode {
    fn from(arg: CullArg) -> Self {
        match arg {
            CullArg::None => CullMode::None,
            CullArg::Back => CullMode::Back,
            CullArg::Front => CullMode::Front,
        }
    }
}

fn load_scene(path: Option<PathBuf>, cull: Option<CullArg>) -> Result<Scene> {
    let mut scene = match path {
        Some(path) => Scene::load(&path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => Scene::demo(),
    };
    if let Some(cull) = cull {
        scene.cull_mode = cull.into();
    }
    Ok(scene)
}

fn run_view(scene: Scene, width: u32, height: u32, samples: u32) -> Result<()> {
    let config = ViewConfig {
        title: "renderkit viewer".into(),
        width,
        height,
        renderer: RendererConfig {
            sample_count: samples,
            ..RendererConfig::default()
        },
    };
    renderkit_view::run(config, move |renderer: &mut WgpuRenderer| -> Result<(), RenderError> {
        let spinners = scene.apply(renderer)?;
        install_spin(renderer, spinners);
        Ok(())
    })?;
    Ok(())
}

fn run_headless(scene: Scene, frames: u32, width: u32, height: u32) -> Result<()> {
    let mut renderer = Renderer::new(RecordingBackend::with_retention(width, height, 1));
    let spinners = scene.apply(&mut renderer)?;
    install_spin(&mut renderer, spinners);

    for n in 0..frames {
        if renderer.draw() == FrameOutcome::Skipped {
            tracing::warn!(frame = n, "frame skipped");
            continue;
        }
        if let Some(frame) = renderer.backend().last_frame() {
            let indices: u64 = frame.draws.iter().map(|d| d.index_count as u64).sum();
            tracing::info!(
                frame = n,
                draws = frame.draws.len(),
                indices,
                cull = ?frame.cull_mode,
                "frame recorded"
            );
        }
    }
    println!(
        "{} frames, {} instances, {} uploads",
        renderer.backend().presented(),
        renderer.instance_count(),
        renderer.backend().uploads()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::View {
            scene,
            width,
            height,
            samples,
            cull,
        } => {
            let scene = load_scene(scene, cull)?;
            tracing::info!("renderkit-viewer starting");
            run_view(scene, width, height, samples)?;
        }
        Commands::Headless {
            scene,
            frames,
            width,
            height,
            cull,
        } => {
            let scene = load_scene(scene, cull)?;
            run_headless(scene, frames, width, height)?;
        }
        Commands::Info => {
            println!("renderkit-viewer v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", renderkit_common::crate_info());
            println!("mesh: {}", renderkit_mesh::crate_info());
            println!("render: {}", renderkit_render::crate_info());
            println!("wgpu: {}", renderkit_wgpu::crate_info());
            println!("view: {}", renderkit_view::crate_info());
        }
    }

    Ok(())
}
