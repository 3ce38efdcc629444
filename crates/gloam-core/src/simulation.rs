//! The tick driver.
//!
//! [`Simulation::step`] advances the world clock and walks the container tree
//! depth-first from the root. Each node visited runs, in order:
//!
//! 1. **Timers**: immunity, sprite frame, bubble
//! 2. **Physics**: when it has a container and positive gravity
//! 3. **Behavior**: the goal/action engine, for entities
//! 4. **Children**: in ascending id order
//!
//! Children are taken from a snapshot of the container index made before
//! any of them runs. A child destroyed or moved elsewhere by an earlier
//! sibling is skipped, and a node moved ahead into an unvisited subtree is
//! not run twice: every node records the last tick it ran on.
//!
//! # Determinism
//!
//! The only source of randomness is a `ChaCha8Rng` seeded from the
//! simulation seed. Iteration is ordered by id everywhere, so two
//! simulations with the same seed, world and inputs stay identical.
//!
//! # Example
//!
//! ```
//! use gloam_core::{Simulation, World, WorldConfig};
//! use gloam_sprites::SpriteCatalog;
//! use std::sync::Arc;
//!
//! let world = World::new(WorldConfig::default(), Arc::new(SpriteCatalog::new()));
//! let mut sim = Simulation::new(world, 42);
//! sim.run(10);
//! assert_eq!(sim.tick(), 10);
//! assert_eq!(sim.seed(), 42);
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::behavior;
use crate::index::Bucket;
use crate::node::NodeId;
use crate::physics;
use crate::world::World;

/// A world plus the random stream that drives it.
#[derive(Debug, Clone)]
pub struct Simulation {
    world: World,
    rng: ChaCha8Rng,
    seed: u64,
}

impl Simulation {
    /// Wraps `world`, seeding the random stream from `seed`.
    #[must_use]
    pub fn new(world: World, seed: u64) -> Self {
        Self {
            world,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed the random stream started from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.world.tick()
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world, for setup and input between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Unwraps the world.
    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }

    /// Runs one tick over the whole tree.
    pub fn step(&mut self) {
        let tick = self.world.advance_tick();
        let root = self.world.root();
        let visited = self.update(root, tick);
        trace!(tick, visited, "tick complete");
    }

    /// Runs `ticks` ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Updates `id` and its subtree. Returns how many nodes ran.
    fn update(&mut self, id: NodeId, tick: u64) -> usize {
        let Some(node) = self.world.node_mut(id) else {
            return 0;
        };
        if node.last_tick == Some(tick) {
            return 0;
        }
        node.last_tick = Some(tick);
        node.tick_timers();

        physics::integrate(&mut self.world, id);
        behavior::run(&mut self.world, &mut self.rng, id);

        let children = self.children_of(id);
        1 + self.update_children(id, &children, tick)
    }

    /// Direct children of `id`, ascending.
    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.world
            .node(id)
            .map(|node| node.contents().members(Bucket::All).collect())
            .unwrap_or_default()
    }

    /// Updates the `children` snapshot of `id`, skipping any that are gone
    /// or have moved out of `id` since it was taken.
    fn update_children(&mut self, id: NodeId, children: &[NodeId], tick: u64) -> usize {
        let mut visited = 0;
        for &child in children {
            let still_here = self
                .world
                .node(child)
                .is_some_and(|c| c.container() == Some(id));
            if still_here {
                visited += self.update(child, tick);
            }
        }
        visited
    }
}
