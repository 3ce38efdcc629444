//! Fixtures for building worlds in tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::Vec2;
use gloam_sprites::{AnimationSpec, EdgeOffsets, SpriteCatalog, SpriteSheet};

use crate::config::WorldConfig;
use crate::index::Bucket;
use crate::node::{NodeId, NodeKind};
use crate::simulation::Simulation;
use crate::world::World;

// =============================================================================
// Sprites
// =============================================================================

/// Catalog with the sheets the default presets name.
pub fn test_catalog() -> Arc<SpriteCatalog> {
    let body = EdgeOffsets {
        left: 20.0,
        right: 20.0,
        top: 10.0,
        bottom: 0.0,
    };
    let goblin = SpriteSheet::new(
        AnimationSpec::looping(4, 0.1, 64.0, 64.0)
            .with_edges(body)
            .with_offset(4.0, -5.0),
    )
    .with_animation("idle", AnimationSpec::looping(4, 0.1, 64.0, 64.0).with_edges(body))
    .with_animation("walk", AnimationSpec::looping(6, 0.25, 64.0, 64.0).with_edges(body))
    .with_animation("jump", AnimationSpec::once(3, 0.2, 64.0, 64.0).with_edges(body))
    .with_animation("attack", AnimationSpec::once(8, 0.3, 96.0, 64.0).with_offset(16.0, 0.0))
    .with_animation("flinch", AnimationSpec::once(2, 0.2, 64.0, 64.0).with_edges(body))
    .with_animation("die", AnimationSpec::once(5, 0.2, 64.0, 64.0));

    let skeleton = SpriteSheet::new(AnimationSpec::looping(4, 0.1, 48.0, 64.0).with_edges(
        EdgeOffsets {
            left: 12.0,
            right: 12.0,
            top: 4.0,
            bottom: 0.0,
        },
    ))
    .with_animation("walk", AnimationSpec::looping(8, 0.2, 48.0, 64.0))
    .with_animation("attack", AnimationSpec::once(6, 0.2, 64.0, 64.0))
    .with_animation("die", AnimationSpec::once(4, 0.2, 48.0, 64.0));

    let tree = SpriteSheet::new(AnimationSpec::still(128.0, 256.0));

    let mut catalog = SpriteCatalog::new();
    catalog.insert("goblin01", goblin);
    catalog.insert("skeleton", skeleton);
    catalog.insert("tree02", tree);
    Arc::new(catalog)
}

// =============================================================================
// Worlds
// =============================================================================

/// Empty world with default config and [`test_catalog`].
pub fn test_world() -> World {
    World::new(WorldConfig::default(), test_catalog())
}

/// World whose perception refreshes every tick.
pub fn eager_world() -> World {
    let config = WorldConfig {
        in_view_update_delay: 1,
        ..WorldConfig::default()
    };
    World::new(config, test_catalog())
}

/// Region of 2000x600 with a 40 unit floor buffer inside `world`'s root.
pub fn arena(world: &mut World) -> NodeId {
    world
        .spawn_region(Vec2::new(2000.0, 600.0), 40.0)
        .expect("region spawns")
}

/// Spawns `kind` into `container` at `at`.
pub fn place(world: &mut World, kind: NodeKind, container: NodeId, at: Vec2) -> NodeId {
    let id = world.spawn(kind).expect("preset spawns");
    world.warp(id, at, Some(container)).expect("warp succeeds");
    id
}

/// Player, skeletons and a tree in one region, ready to simulate.
/// Returns the simulation, the region, the player and the skeletons.
pub fn populated_simulation(seed: u64, skeletons: usize) -> (Simulation, NodeId, NodeId, Vec<NodeId>) {
    let mut world = test_world();
    let region = arena(&mut world);
    place(&mut world, NodeKind::Tree, region, Vec2::new(1500.0, 432.0));
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, 500.0));
    #[allow(clippy::cast_precision_loss)]
    let bones = (0..skeletons)
        .map(|i| {
            let x = 400.0 + 120.0 * i as f32;
            place(&mut world, NodeKind::Skeleton, region, Vec2::new(x % 1900.0, 300.0))
        })
        .collect();
    (Simulation::new(world, seed), region, player, bones)
}

// =============================================================================
// Invariants
// =============================================================================

/// Checks both directions of the container/index relationship for every node.
pub fn assert_index_consistent(world: &World) {
    for node in world.nodes() {
        if let Some(container) = node.container() {
            let contents = world
                .node(container)
                .unwrap_or_else(|| panic!("{} points at missing container {container}", node.id()))
                .contents();
            assert!(
                contents.contains(Bucket::All, node.id()),
                "{} missing from All of {container}",
                node.id()
            );
            let expected: BTreeSet<&str> = node.categories().iter().map(String::as_str).collect();
            assert_eq!(
                contents.buckets_of(node.id()),
                expected,
                "buckets of {} in {container}",
                node.id()
            );
        }
        for member in node.contents().members(Bucket::All) {
            let child = world
                .node(member)
                .unwrap_or_else(|| panic!("{} indexes missing node {member}", node.id()));
            assert_eq!(child.container(), Some(node.id()));
        }
    }
}
