//! Headless gloam runner.
//!
//! Builds a demo region (player, skeletons, a tree and a floating ledge),
//! simulates it without any observer attached, and logs a summary. Handy
//! for profiling and for checking that a config or sprite catalog loads.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use gloam_core::{NodeKind, Shard, Simulation, World, WorldConfig};
use gloam_sprites::{AnimationSpec, EdgeOffsets, SpriteCatalog, SpriteSheet};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Run a gloam world headless
#[derive(Parser, Debug)]
#[command(name = "gloam-headless")]
#[command(about = "Simulate a demo gloam region without observers")]
struct Args {
    /// Ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Skeletons to spawn
    #[arg(long, default_value_t = 8)]
    skeletons: usize,

    /// World config JSON (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sprite catalog JSON (built-in demo sheets when omitted)
    #[arg(long)]
    sprites: Option<PathBuf>,

    /// Write the final world snapshot here
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            WorldConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => WorldConfig::default(),
    };
    let sprites = match &args.sprites {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading sprites {}", path.display()))?;
            SpriteCatalog::from_json(&json)
                .with_context(|| format!("parsing sprites {}", path.display()))?
        }
        None => demo_catalog(),
    };

    let world = demo_world(config, Arc::new(sprites), args.skeletons)?;
    info!(nodes = world.len(), seed = args.seed, "world built");

    let mut sim = Simulation::new(world, args.seed);
    let started = std::time::Instant::now();
    for _ in 0..args.ticks {
        sim.step();
        if sim.tick() % 100 == 0 {
            debug!(tick = sim.tick(), "progress");
        }
    }
    let elapsed = started.elapsed();

    let world = sim.world();
    let dead = world
        .nodes()
        .filter_map(|n| n.behavior())
        .filter(|b| b.base_goal.is_dead())
        .count();
    let views = world.observer_snapshots(Shard::ALL);
    info!(
        ticks = sim.tick(),
        elapsed_ms = elapsed.as_millis(),
        entities = world.nodes().filter(|n| n.behavior().is_some()).count(),
        dead,
        observers = views.len(),
        "simulation finished"
    );

    if let Some(path) = &args.snapshot {
        let json = world.to_json().context("serializing world")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "snapshot written");
    }
    Ok(())
}

/// Sheets for every sprite the default presets name.
fn demo_catalog() -> SpriteCatalog {
    let body = EdgeOffsets {
        left: 20.0,
        right: 20.0,
        top: 10.0,
        bottom: 0.0,
    };
    let goblin = SpriteSheet::new(AnimationSpec::looping(4, 0.1, 64.0, 64.0).with_edges(body))
        .with_animation("walk", AnimationSpec::looping(6, 0.25, 64.0, 64.0).with_edges(body))
        .with_animation("jump", AnimationSpec::once(3, 0.2, 64.0, 64.0).with_edges(body))
        .with_animation("attack", AnimationSpec::once(8, 0.3, 96.0, 64.0).with_offset(16.0, 0.0))
        .with_animation("flinch", AnimationSpec::once(2, 0.2, 64.0, 64.0).with_edges(body))
        .with_animation("die", AnimationSpec::once(5, 0.2, 64.0, 64.0));
    let skeleton = SpriteSheet::new(AnimationSpec::looping(4, 0.1, 48.0, 64.0))
        .with_animation("walk", AnimationSpec::looping(8, 0.2, 48.0, 64.0))
        .with_animation("attack", AnimationSpec::once(6, 0.2, 64.0, 64.0))
        .with_animation("die", AnimationSpec::once(4, 0.2, 48.0, 64.0));

    let mut catalog = SpriteCatalog::new();
    catalog.insert("goblin01", goblin);
    catalog.insert("skeleton", skeleton);
    catalog.insert("tree02", SpriteSheet::new(AnimationSpec::still(128.0, 256.0)));
    catalog
}

#[allow(clippy::cast_precision_loss)]
fn demo_world(config: WorldConfig, sprites: Arc<SpriteCatalog>, skeletons: usize) -> Result<World> {
    let mut world = World::new(config, sprites);
    let region = world.spawn_region(Vec2::new(4000.0, 720.0), 40.0)?;

    let ledge = world.spawn(NodeKind::Platform)?;
    if let Some(node) = world.node_mut(ledge) {
        node.size = Vec2::new(400.0, 20.0);
    }
    world.warp(ledge, Vec2::new(900.0, 560.0), Some(region))?;

    let tree = world.spawn(NodeKind::Tree)?;
    world.warp(tree, Vec2::new(1600.0, 552.0), Some(region))?;

    let player = world.spawn(NodeKind::Player)?;
    world.warp(player, Vec2::new(200.0, 600.0), Some(region))?;
    world.initialize_view(player, Vec2::new(1280.0, 720.0), None)?;

    for i in 0..skeletons {
        let skeleton = world.spawn(NodeKind::Skeleton)?;
        let x = 500.0 + (i as f32 * 330.0) % 3400.0;
        world.warp(skeleton, Vec2::new(x, 300.0), Some(region))?;
    }
    Ok(world)
}
