mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use toydrive_config::DriveConfig;
use toydrive_kernel::DriveWorld;
use toydrive_render::{DebugTextRenderer, RenderView, Renderer, Scene};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "toydrive-cli", about = "Headless toydrive tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Drive a scripted session and print the final frame
    Drive {
        /// Input script, e.g. "w:60,w+a:30,:90"
        #[arg(short, long)]
        script: String,
        /// YAML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Binding overrides, e.g. "arrowup=accelerate,w="
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Drive a script, replay its event log and compare state hashes
    Replay {
        /// Input script, e.g. "w:60,w+a:30,:90"
        #[arg(short, long)]
        script: String,
        /// YAML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Binding overrides, e.g. "arrowup=accelerate,w="
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Load and validate a config file
    CheckConfig {
        path: PathBuf,
    },
    /// Print the default config as YAML
    DefaultConfig,
}

/// Load the config, then layer any `--bind` overrides on top.
fn load_config(path: Option<&Path>, bind: Option<&str>) -> anyhow::Result<DriveConfig> {
    let mut config = DriveConfig::load_or_default(path)?;
    if let Some(overrides) = bind {
        config
            .apply_binding_overrides(overrides)
            .context("invalid --bind")?;
    }
    Ok(config)
}

/// Build the configured world and run `script` through it.
fn scripted_world(script: &str, config: &DriveConfig) -> anyhow::Result<(DriveWorld, u64)> {
    let segments = script::parse(script).context("invalid script")?;
    let mut world = config.build_world();
    let frames = script::run(&mut world, &segments, &config.bindings);
    Ok((world, frames))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("toydrive-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: id={}", toydrive_common::EntityId::new().short());
            println!("kernel: tick={}", DriveWorld::new().tick());
            println!("input: {}", toydrive_input::crate_info());
            println!("render: {}", toydrive_render::crate_info());
            println!("config: {}", toydrive_config::crate_info());
        }
        Commands::Drive {
            script,
            config,
            bind,
        } => {
            let config = load_config(config.as_deref(), bind.as_deref())?;
            let (world, frames) = scripted_world(&script, &config)?;
            tracing::info!(frames, "script finished");

            let scene = Scene::bootstrap(&config.scene);
            let view = match world.player() {
                Some(player) => config.camera_rig()?.follow(player),
                None => RenderView::default(),
            };
            print!("{}", DebugTextRenderer::new().render(&world, &scene, &view));
        }
        Commands::Replay {
            script,
            config,
            bind,
        } => {
            let config = load_config(config.as_deref(), bind.as_deref())?;
            let (world, frames) = scripted_world(&script, &config)?;
            println!("Scripted drive: frames={frames}, events={}", world.events().len());

            let replayed = DriveWorld::replay(config.tuning, world.events());

            let original = world.state_hash();
            let copy = replayed.state_hash();
            println!("Run:    tick={}, hash={original:#018x}", world.tick());
            println!("Replay: tick={}, hash={copy:#018x}", replayed.tick());
            println!(
                "Match: {}",
                if original == copy { "OK" } else { "MISMATCH" }
            );
        }
        Commands::CheckConfig { path } => {
            let config = DriveConfig::load(&path)
                .with_context(|| format!("checking {}", path.display()))?;
            println!("{}: OK", path.display());
            println!(
                "  tuning: max_speed={} acceleration={} friction={}",
                config.tuning.max_speed, config.tuning.acceleration, config.tuning.friction
            );
            println!(
                "  camera: mode={} radius={} height=[{}, {}]",
                config.camera.mode.label(),
                config.camera.orbit.radius,
                config.camera.orbit.min_height,
                config.camera.orbit.max_height
            );
            println!("  bindings: {}", config.bindings.iter().count());
            println!("  vehicles: {}", config.vehicle_specs().len());
        }
        Commands::DefaultConfig => {
            print!("{}", DriveConfig::default().to_yaml()?);
        }
    }

    Ok(())
}
