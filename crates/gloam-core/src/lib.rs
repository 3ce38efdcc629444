//! # Gloam Core
//!
//! Tick-based 2D world simulation for gloam.
//!
//! A world is a tree of [`Node`]s. Each container keeps a category index over
//! its direct children, and every spatial query is scoped to one container
//! and one category bucket. On top of that substrate sit:
//!
//! - **Physics**: gravity, damping and positional correction against solids
//! - **Behavior**: per-entity goal/action state machine with interruption
//! - **Perception**: staggered visible-set refresh with per-tick deltas
//! - **Observers**: camera model and sharded render snapshots for players
//! - **Persistence**: record trees that restore under the original ids
//!
//! ## Usage
//!
//! ```
//! use gloam_core::{NodeKind, Simulation, World, WorldConfig};
//! use gloam_sprites::SpriteCatalog;
//! use glam::Vec2;
//! use std::sync::Arc;
//!
//! let mut world = World::new(WorldConfig::default(), Arc::new(SpriteCatalog::new()));
//! let region = world.spawn_region(Vec2::new(1000.0, 600.0), 40.0).unwrap();
//! let critter = world.spawn(NodeKind::Creature).unwrap();
//! world.node_mut(critter).unwrap().size = Vec2::new(16.0, 16.0);
//! world.warp(critter, Vec2::new(500.0, 100.0), Some(region)).unwrap();
//!
//! let mut sim = Simulation::new(world, 7);
//! sim.run(120);
//!
//! let critter = sim.world().node(critter).unwrap();
//! assert!(critter.on_solid);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod behavior;
pub mod config;
pub mod error;
pub mod index;
pub mod node;
pub mod observer;
pub mod perception;
pub mod persistence;
pub mod physics;
pub mod query;
pub mod simulation;
pub mod world;

pub use behavior::{Action, ActionKind, Behavior, Goal, InputState, Keys, Revival, Stats, Swipes};
pub use config::{EntityPreset, KindPreset, ViewConfig, WorldConfig};
pub use error::{ConfigError, LoadError, WorldError};
pub use index::{Bucket, CategoryIndex};
pub use node::{Facing, Node, NodeId, NodeKind, Rect};
pub use observer::{Camera, NodePacket, ObserverSnapshot, Shard};
pub use persistence::NodeRecord;
pub use simulation::Simulation;
pub use world::{Destroyed, Strike, World};

#[cfg(test)]
mod tests;
