use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edgeview_camera::Camera;
use edgeview_common::OutputSize;
use edgeview_game::{Game, GameConfig, Scene};
use edgeview_input::{InputFrame, Key, KeyboardState, ScriptedInput};
use edgeview_render::{DispatchSize, EDGE_TILE_SIZE, HeadlessBackend};
use glam::{Mat4, Vec3};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "edgeview-cli", about = "Headless tools for the edge-detection demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, defaults and the demo scene
    Info,
    /// Print the edge pass work-group grid for an output size
    Dispatch {
        #[arg(long, default_value = "1920")]
        width: u32,
        #[arg(long, default_value = "1080")]
        height: u32,
    },
    /// Run frames against the recording backend and print the command trace
    Trace {
        /// Number of frames to run
        #[arg(short, long, default_value = "1")]
        frames: u32,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Hold W for every frame
        #[arg(long)]
        walk: bool,
    },
    /// Print the view and projection matrices for a camera placement
    Camera {
        #[arg(long, num_args = 3, value_delimiter = ',', default_values_t = [0.0, 10.0, 10.0])]
        eye: Vec<f32>,
        #[arg(long, num_args = 3, value_delimiter = ',', default_values_t = [0.0, 0.0, 0.0])]
        target: Vec<f32>,
        /// Walk this distance before printing
        #[arg(long, default_value = "0")]
        walk: f32,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::from_path(path)
            .with_context(|| format!("load config {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

fn vec3(values: &[f32]) -> Result<Vec3> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => anyhow::bail!("expected three comma-separated values, got {values:?}"),
    }
}

fn print_matrix(name: &str, m: &Mat4) {
    println!("{name}:");
    for row in 0..4 {
        let r = m.row(row);
        println!("  [{:>9.4} {:>9.4} {:>9.4} {:>9.4}]", r.x, r.y, r.z, r.w);
    }
}

/// Run `frames` ticks of the game on a recording backend and return its trace.
fn run_trace(config: GameConfig, size: OutputSize, frames: u32, walk: bool) -> Result<String> {
    let mut game = Game::new(config);
    let mut backend = HeadlessBackend::new(game.default_size());
    game.initialize(&mut backend, size.width, size.height)
        .context("initialize game")?;

    let keyboard = if walk {
        KeyboardState::new().with(Key::W)
    } else {
        KeyboardState::new()
    };
    let mut input = ScriptedInput::new((0..frames).map(|_| InputFrame {
        keyboard,
        ..InputFrame::default()
    }));

    let frame_time = Duration::from_secs_f64(1.0 / 60.0);
    for _ in 0..frames {
        game.tick(&mut backend, &mut input, frame_time)?;
    }

    let mut out = backend.trace();
    let p = game.camera().position();
    out.push_str(&format!(
        "camera position ({:.3}, {:.3}, {:.3}) after {} updates\n",
        p.x,
        p.y,
        p.z,
        game.timer().frame_count()
    ));
    Ok(out)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("edgeview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("default size: {}", config.default_size);
            println!(
                "move speed: {} units/s, rotate speed: {} deg/unit",
                config.move_speed, config.rotate_speed
            );
            println!("edge tile: {EDGE_TILE_SIZE}x{EDGE_TILE_SIZE}");
            for object in Scene::demo().objects() {
                println!(
                    "  {:?} at {}",
                    object.mesh,
                    object.world.w_axis.truncate()
                );
            }
        }
        Commands::Dispatch { width, height } => {
            let size = OutputSize::validated(width, height)?;
            let groups = DispatchSize::covering(size, EDGE_TILE_SIZE);
            println!("{size} -> {} x {} x {} groups", groups.x, groups.y, groups.z);
        }
        Commands::Trace {
            frames,
            width,
            height,
            walk,
        } => {
            let size = OutputSize::validated(
                width.unwrap_or(config.default_size.width),
                height.unwrap_or(config.default_size.height),
            )?;
            print!("{}", run_trace(config, size, frames, walk)?);
        }
        Commands::Camera { eye, target, walk } => {
            let mut camera = Camera::new();
            camera.create_view(vec3(&eye)?, vec3(&target)?, Vec3::Y)?;
            camera.walk(walk);
            camera.update_view_matrix();

            let size = config.default_size;
            camera.create_proj(
                config.fov_y_degrees.to_radians(),
                size.aspect_ratio(),
                config.z_near,
                config.z_far,
            );

            let p = camera.position();
            println!("position: ({:.4}, {:.4}, {:.4})", p.x, p.y, p.z);
            print_matrix("view", &camera.view());
            print_matrix("proj", &camera.proj());
            print_matrix("view_proj", &camera.view_projection());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_lists_one_presented_frame_per_tick() {
        let trace = run_trace(GameConfig::default(), OutputSize::new(320, 240), 2, false).unwrap();
        assert!(trace.contains("presented=2"));
        assert_eq!(trace.matches("dispatch 20x15x1").count(), 2);
    }

    #[test]
    fn walking_trace_moves_the_camera() {
        let still = run_trace(GameConfig::default(), OutputSize::new(64, 64), 3, false).unwrap();
        let walked = run_trace(GameConfig::default(), OutputSize::new(64, 64), 3, true).unwrap();
        assert!(still.contains("camera position (0.000, 10.000, 10.000)"));
        assert!(!walked.contains("camera position (0.000, 10.000, 10.000)"));
    }

    #[test]
    fn vec3_needs_three_values() {
        assert_eq!(vec3(&[1.0, 2.0, 3.0]).unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(vec3(&[1.0]).is_err());
    }
}
