use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use glam::Vec3;
use tracing_subscriber::EnvFilter;
use weft_kernel::Entity;
use weft_loader::{ControllerRegistry, Scene, load_scene};
use weft_persist::{Snapshot, SnapshotStore};
use weft_sim::{Action, ScriptedController, SimConfig, Simulation};

#[derive(Parser)]
#[command(name = "weft-cli", about = "Headless driver for the weft simulation core")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a deterministic headless simulation twice and compare digests
    Run {
        /// Simulated seconds per run
        #[arg(short, long, default_value = "5.0")]
        seconds: f64,
        /// Fixed step rate
        #[arg(long, default_value = "60.0")]
        hz: f64,
    },
    /// Load a scene file and run it headless
    Scene {
        /// Path to a YAML or JSON scene file
        path: PathBuf,
        /// Simulated seconds to run
        #[arg(short, long, default_value = "2.0")]
        seconds: f64,
    },
    /// Demonstrate snapshot capture and rollback
    Snapshot {
        /// Number of entities to spawn
        #[arg(short, long, default_value = "5")]
        entities: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Run { seconds, hz } => run_deterministic(seconds, hz)?,
        Commands::Scene { path, seconds } => run_scene(&path, seconds)?,
        Commands::Snapshot { entities } => snapshot_demo(entities)?,
    }

    Ok(())
}

/// Build the demo world: a scripted patroller and a ring of obstacles.
fn demo_simulation(hz: f64) -> Simulation {
    let mut sim = Simulation::new(SimConfig {
        hz,
        ..SimConfig::default()
    });

    sim.world_mut()
        .add(Entity::new("patrol", "drone", Vec3::ZERO));
    for i in 0..4 {
        let angle = i as f32 * std::f32::consts::FRAC_PI_2;
        sim.world_mut().add(Entity::new(
            format!("marker-{i}"),
            "marker",
            Vec3::new(angle.cos() * 8.0, 0.0, angle.sin() * 8.0),
        ));
    }

    let script = vec![
        Action::continuous([("move_x", 2.0), ("move_z", 0.0)]),
        Action::continuous([("move_x", 0.0), ("move_z", 2.0)]),
        Action::continuous([("move_x", -2.0), ("move_z", 0.0)]),
        Action::continuous([("move_x", 0.0), ("move_z", -2.0)]),
    ];
    sim.register_controller("patrol", Box::new(ScriptedController::looping(script)));
    sim.world_mut().capture_initial_state();
    sim
}

fn run_headless(sim: &mut Simulation, seconds: f64) -> Result<u64> {
    sim.start();
    // Synthetic 16 ms frames; the accumulator turns them into exact dt
    // multiples regardless of the frame size we pick here.
    let frame = Duration::from_millis(16);
    let mut simulated = 0.0;
    while simulated < seconds {
        sim.advance_frame(frame)?;
        simulated += frame.as_secs_f64();
    }
    Ok(sim.world().step_count())
}

fn run_deterministic(seconds: f64, hz: f64) -> Result<()> {
    println!("Deterministic run: {seconds} s at {hz} Hz, twice");

    let mut digests = Vec::new();
    for run in 1..=2 {
        let mut sim = demo_simulation(hz);
        let steps = run_headless(&mut sim, seconds)?;
        let snap = Snapshot::capture(sim.world());
        println!(
            "Run {run}: steps={steps}, t={:.3}, digest={:#018x}",
            sim.world().timestamp(),
            snap.hash
        );
        digests.push(snap.hash);
    }

    println!(
        "Match: {}",
        if digests[0] == digests[1] {
            "OK"
        } else {
            "MISMATCH"
        }
    );
    Ok(())
}

fn run_scene(path: &PathBuf, seconds: f64) -> Result<()> {
    let scene = Scene::from_path(path)?;
    println!("Loaded scene: {} entities", scene.entities.len());

    let mut sim = Simulation::new(SimConfig::default());
    let registry = ControllerRegistry::with_defaults();
    let ids = load_scene(&scene, &mut sim, &registry)?;
    sim.world_mut().capture_initial_state();

    let steps = run_headless(&mut sim, seconds)?;
    println!("Ran {steps} steps ({:.3} s simulated)", sim.world().timestamp());
    for id in &ids {
        if let Some(entity) = sim.world().get(id) {
            let p = entity.position;
            println!("  {id}: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
        }
    }
    Ok(())
}

fn snapshot_demo(entities: usize) -> Result<()> {
    println!("Snapshot demo: spawning {entities} entities");

    let mut sim = Simulation::new(SimConfig::default());
    for i in 0..entities {
        sim.world_mut().add(
            Entity::new(format!("e{i}"), "marker", Vec3::new(i as f32 * 2.0, 0.0, 0.0))
                .with_velocity(Vec3::X),
        );
    }
    for _ in 0..30 {
        sim.step()?;
    }

    let mut store = SnapshotStore::new();
    let index = store.take_snapshot(sim.world());
    let snap = store.get(index).expect("just stored");
    println!(
        "Captured: step={}, entities={}, hash={:#018x}, valid={}",
        snap.state.step_count,
        snap.state.entities.len(),
        snap.hash,
        snap.verify()
    );

    for _ in 0..120 {
        sim.step()?;
    }
    println!(
        "After mutation: step={}, t={:.3}",
        sim.world().step_count(),
        sim.world().timestamp()
    );

    store.rollback(index, sim.world_mut());
    println!(
        "After rollback: step={}, t={:.3}",
        sim.world().step_count(),
        sim.world().timestamp()
    );
    Ok(())
}
