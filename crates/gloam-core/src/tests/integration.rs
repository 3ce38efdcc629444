//! Multi-tick scenarios through [`Simulation::step`].

use std::collections::BTreeSet;

use glam::Vec2;

use crate::behavior::{ActionKind, Goal, Keys, Revival};
use crate::index::Bucket;
use crate::node::{Facing, NodeKind};
use crate::observer::Shard;
use crate::simulation::Simulation;

use crate::config::WorldConfig;
use crate::world::World;

use super::helpers::{
    arena, assert_index_consistent, eager_world, place, populated_simulation, test_catalog, test_world,
};

/// Floor line of [`arena`] regions.
const FLOOR: f32 = 560.0;

// =============================================================================
// Movement
// =============================================================================

#[test]
fn grounded_jump_leaves_and_returns_to_floor() {
    let mut world = test_world();
    let region = arena(&mut world);
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, FLOOR - 27.0));
    let mut sim = Simulation::new(world, 3);

    sim.world_mut().inputs_mut(player).unwrap().pressed = Keys::JUMP;
    sim.step();
    let node = sim.world().node(player).unwrap();
    assert!((node.velocity.y + 10.0).abs() < f32::EPSILON);

    sim.run(3);
    let node = sim.world().node(player).unwrap();
    assert!(node.position.y < FLOOR - 27.0);
    assert!(!node.on_solid);

    sim.run(100);
    let node = sim.world().node(player).unwrap();
    assert!((node.position.y - (FLOOR - 27.0)).abs() < f32::EPSILON);
    assert!(node.on_solid);
}

#[test]
fn pressed_keys_last_one_tick() {
    let mut world = test_world();
    let region = arena(&mut world);
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, FLOOR - 27.0));
    let mut sim = Simulation::new(world, 3);

    let inputs = sim.world_mut().inputs_mut(player).unwrap();
    inputs.pressed = Keys::ATTACK;
    inputs.held = Keys::RIGHT;
    sim.step();

    let controller = sim.world().controller(player).unwrap();
    assert!(controller.inputs.pressed.is_empty());
    assert_eq!(controller.inputs.held, Keys::RIGHT);
}

#[test]
fn held_key_walks_and_faces() {
    let mut world = test_world();
    let region = arena(&mut world);
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(500.0, FLOOR - 27.0));
    let mut sim = Simulation::new(world, 3);

    sim.world_mut().inputs_mut(player).unwrap().held = Keys::LEFT;
    sim.run(20);

    let node = sim.world().node(player).unwrap();
    assert_eq!(node.facing, Facing::Left);
    assert!(node.position.x < 500.0);
    assert_eq!(node.sprite().unwrap().animation, "walk");
}

#[test]
fn falling_entities_never_sink_below_the_floor() {
    let (mut sim, region, _, skeletons) = populated_simulation(5, 6);
    for _ in 0..200 {
        sim.step();
        for id in &skeletons {
            let node = sim.world().node(*id).unwrap();
            assert!(node.position.y + node.size.y * 0.5 <= FLOOR + f32::EPSILON);
        }
    }
    assert_eq!(sim.world().node(skeletons[0]).unwrap().container(), Some(region));
}

// =============================================================================
// Death and revival
// =============================================================================

#[test]
fn death_reindexes_and_never_revives() {
    let mut world = test_world();
    let region = arena(&mut world);
    let critter = place(&mut world, NodeKind::Creature, region, Vec2::new(300.0, FLOOR));
    world.behavior_mut(critter).unwrap().stats.health = 0.0;
    let mut sim = Simulation::new(world, 11);

    sim.step();
    let world = sim.world();
    let contents = world.node(region).unwrap().contents();
    assert!(contents.contains("dead".into(), critter));
    assert!(!contents.contains("alive".into(), critter));
    let behavior = world.behavior(critter).unwrap();
    assert_eq!(behavior.base_goal, Goal::Dead(Revival::Never));
    assert_eq!(behavior.action.as_ref().map(|a| a.label()), Some("Die"));

    sim.run(50);
    assert!(sim.world().behavior(critter).unwrap().is_dead());
    assert_index_consistent(sim.world());
}

#[test]
fn player_revives_on_input() {
    let mut world = test_world();
    let region = arena(&mut world);
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, FLOOR - 27.0));
    world.behavior_mut(player).unwrap().stats.health = -5.0;
    let mut sim = Simulation::new(world, 3);

    sim.run(2);
    assert!(sim.world().behavior(player).unwrap().is_dead());
    assert_eq!(sim.world().node(player).unwrap().sprite().unwrap().animation, "die");

    sim.world_mut().inputs_mut(player).unwrap().pressed = Keys::REVIVE;
    sim.step();

    let behavior = sim.world().behavior(player).unwrap();
    assert!(!behavior.is_dead());
    assert_eq!(behavior.base_goal, Goal::PlayerInput);
    assert!((behavior.stats.health - behavior.stats.max_health).abs() < f32::EPSILON);
    let contents = sim.world().node(region).unwrap().contents();
    assert!(contents.contains("alive".into(), player));
    assert!(!contents.contains("dead".into(), player));
}

/// World whose skeletons revive with the given odds.
fn world_with_skeleton_revival(revival: Revival) -> World {
    let mut config = WorldConfig::default();
    if let Some(entity) = config
        .presets
        .get_mut(&NodeKind::Skeleton)
        .and_then(|p| p.entity.as_mut())
    {
        entity.revival = revival;
    }
    World::new(config, test_catalog())
}

#[test]
fn skeleton_stays_dead_until_the_odds_allow_revival() {
    let never = Revival::Chance {
        numerator: 0,
        denominator: 1,
    };
    let always = Revival::Chance {
        numerator: 1,
        denominator: 1,
    };
    let mut world = world_with_skeleton_revival(never);
    let region = arena(&mut world);
    let skeleton = place(&mut world, NodeKind::Skeleton, region, Vec2::new(600.0, FLOOR - 30.0));
    world.behavior_mut(skeleton).unwrap().stats.health = -5.0;
    let mut sim = Simulation::new(world, 17);

    sim.run(20);
    let behavior = sim.world().behavior(skeleton).unwrap();
    assert_eq!(behavior.base_goal, Goal::Dead(never));
    assert_eq!(behavior.action.as_ref().unwrap().label(), "Die");
    let contents = sim.world().node(region).unwrap().contents();
    assert!(contents.contains("dead".into(), skeleton));
    assert!(!contents.contains("alive".into(), skeleton));
    assert_index_consistent(sim.world());

    sim.world_mut().behavior_mut(skeleton).unwrap().base_goal = Goal::Dead(always);
    sim.step();

    let behavior = sim.world().behavior(skeleton).unwrap();
    assert_eq!(behavior.base_goal, Goal::Hunt);
    assert!(behavior.goal.is_none());
    assert!((behavior.stats.health - behavior.stats.max_health).abs() < f32::EPSILON);
    let contents = sim.world().node(region).unwrap().contents();
    assert!(contents.contains("alive".into(), skeleton));
    assert!(!contents.contains("dead".into(), skeleton));
    assert_index_consistent(sim.world());
}

#[test]
fn certain_revival_happens_in_the_tick_of_death() {
    let mut world = world_with_skeleton_revival(Revival::Chance {
        numerator: 1,
        denominator: 1,
    });
    let region = arena(&mut world);
    let skeleton = place(&mut world, NodeKind::Skeleton, region, Vec2::new(600.0, FLOOR - 30.0));
    world.behavior_mut(skeleton).unwrap().stats.health = 0.0;
    let mut sim = Simulation::new(world, 5);

    sim.step();
    let behavior = sim.world().behavior(skeleton).unwrap();
    assert!(!behavior.is_dead());
    assert_eq!(behavior.base_goal, Goal::Hunt);
    assert!((behavior.stats.health - behavior.stats.max_health).abs() < f32::EPSILON);
    assert!(sim.world().node(skeleton).unwrap().has_category("alive"));
    assert_index_consistent(sim.world());
}

// =============================================================================
// Combat
// =============================================================================

#[test]
fn attack_lands_once_per_immunity_window() {
    let mut world = test_world();
    let region = arena(&mut world);
    let target = place(&mut world, NodeKind::Skeleton, region, Vec2::new(220.0, FLOOR - 30.0));
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, FLOOR - 27.0));
    world.behavior_mut(target).unwrap().base_goal = Goal::Idle;
    let mut sim = Simulation::new(world, 1);

    sim.world_mut().inputs_mut(player).unwrap().pressed = Keys::ATTACK;
    sim.step();

    let struck = sim.world().node(target).unwrap();
    assert_eq!(struck.immunity, 30);
    let flinch = struck.behavior().unwrap().action.as_ref().unwrap();
    assert_eq!(flinch.label(), "Flinch");
    assert!((struck.behavior().unwrap().stats.health - 100.0).abs() < f32::EPSILON);

    sim.step();
    let health = sim.world().behavior(target).unwrap().stats.health;
    assert!((health - 90.0).abs() < f32::EPSILON);

    sim.run(40);
    let health = sim.world().behavior(target).unwrap().stats.health;
    assert!((health - 90.0).abs() < f32::EPSILON);
}

#[test]
fn attacker_lunges_forward_and_up_whichever_way_it_faces() {
    for facing in [Facing::Left, Facing::Right] {
        let mut world = test_world();
        let region = arena(&mut world);
        let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, FLOOR - 27.0));
        world.node_mut(player).unwrap().facing = facing;
        let mut sim = Simulation::new(world, 1);

        sim.world_mut().inputs_mut(player).unwrap().pressed = Keys::ATTACK;
        sim.step();
        let node = sim.world().node(player).unwrap();
        assert_eq!(node.facing, facing);
        assert!(node.velocity.x * facing.sign() > 0.0, "{facing:?} lunge went backwards");
        assert!(node.velocity.y < 0.0, "{facing:?} recoil went downward");
        assert_eq!(node.sprite().unwrap().animation, "attack");
    }
}

// =============================================================================
// Perception and behavior
// =============================================================================

#[test]
fn perception_reports_exact_deltas_and_interrupts() {
    let mut world = eager_world();
    let region = arena(&mut world);
    let watcher = place(&mut world, NodeKind::Creature, region, Vec2::new(1000.0, FLOOR));
    world.behavior_mut(watcher).unwrap().base_goal = Goal::Idle;
    let leaving = place(&mut world, NodeKind::Platform, region, Vec2::new(1000.0, 300.0));
    let arriving = place(&mut world, NodeKind::Platform, region, Vec2::new(1500.0, 300.0));
    let mut sim = Simulation::new(world, 2);

    sim.step();
    let perception = &sim.world().behavior(watcher).unwrap().perception;
    assert_eq!(perception.added(), &BTreeSet::from([leaving]));
    assert!(perception.in_view().contains("solid".into(), leaving));

    let world = sim.world_mut();
    world.warp(leaving, Vec2::new(200.0, 300.0), None).unwrap();
    world.warp(arriving, Vec2::new(1100.0, 300.0), None).unwrap();
    world.assign_action(watcher, ActionKind::Jump { dir: None }).unwrap();
    world.behavior_mut(watcher).unwrap().goal = Some(Goal::Hunt);
    sim.step();

    let behavior = sim.world().behavior(watcher).unwrap();
    assert_eq!(behavior.perception.added(), &BTreeSet::from([arriving]));
    assert_eq!(behavior.perception.removed(), &BTreeSet::from([leaving]));
    assert_eq!(behavior.goal, None);

    sim.step();
    let perception = &sim.world().behavior(watcher).unwrap().perception;
    assert!(perception.added().is_empty());
    assert!(perception.removed().is_empty());
    assert!(perception.in_view().contains(Bucket::All, arriving));
}

#[test]
fn deltas_clear_between_refreshes() {
    let mut world = test_world();
    let region = arena(&mut world);
    let watcher = place(&mut world, NodeKind::Creature, region, Vec2::new(1000.0, FLOOR));
    world.behavior_mut(watcher).unwrap().base_goal = Goal::Idle;
    place(&mut world, NodeKind::Platform, region, Vec2::new(1000.0, 300.0));
    let refresh_in = world.behavior(watcher).unwrap().perception.refresh_in();
    let mut sim = Simulation::new(world, 2);

    let first_refresh = u64::from(refresh_in.max(1));
    sim.run(first_refresh);
    assert!(sim.world().behavior(watcher).unwrap().perception.changed());
    sim.step();
    assert!(!sim.world().behavior(watcher).unwrap().perception.changed());
}

#[test]
fn skeleton_hunts_visible_player() {
    let mut world = eager_world();
    let region = arena(&mut world);
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, FLOOR - 27.0));
    let skeleton = place(&mut world, NodeKind::Skeleton, region, Vec2::new(450.0, FLOOR - 30.0));
    let mut sim = Simulation::new(world, 8);

    sim.run(30);
    let world = sim.world();
    let bones = world.node(skeleton).unwrap();
    assert_eq!(bones.facing, Facing::Left);
    assert!(bones.position.x < 450.0);
    assert!(bones.behavior().unwrap().perception.in_view().contains("hasbrains".into(), player));
}

#[test]
fn action_lifecycle_runs_to_completion() {
    let mut world = test_world();
    let region = arena(&mut world);
    let critter = place(&mut world, NodeKind::Creature, region, Vec2::new(300.0, FLOOR));
    world.behavior_mut(critter).unwrap().base_goal = Goal::Idle;
    let jump = world.assign_action(critter, ActionKind::Jump { dir: None }).unwrap();
    let mut sim = Simulation::new(world, 4);

    for expected in 1..=5 {
        sim.step();
        let action = sim.world().behavior(critter).unwrap().action.clone().unwrap();
        assert_eq!(action.id(), jump);
        assert_eq!(action.progress(), expected);
    }
    sim.step();
    let action = sim.world().behavior(critter).unwrap().action.clone().unwrap();
    assert!(action.id() > jump);
    assert_eq!(action.label(), "Idle");
}

// =============================================================================
// Observers
// =============================================================================

#[test]
fn shards_partition_the_snapshot() {
    let (mut sim, _, player, _) = populated_simulation(21, 8);
    sim.world_mut()
        .initialize_view(player, Vec2::new(1280.0, 720.0), None)
        .unwrap();
    sim.run(40);

    let world = sim.world();
    let full = world.observer_snapshot(player, Shard::ALL).unwrap();
    assert!(!full.in_view.is_empty());

    let mut union = BTreeSet::new();
    for index in 0..3 {
        let part = world.observer_snapshot(player, Shard::new(index, 3)).unwrap();
        assert_eq!(part.view, full.view);
        for id in part.in_view.keys() {
            assert!(union.insert(*id), "{id} appeared in two shards");
        }
    }
    assert_eq!(union, full.in_view.keys().copied().collect());
}

#[test]
fn camera_follows_player_within_region() {
    let mut world = test_world();
    let region = arena(&mut world);
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, FLOOR - 27.0));
    world
        .initialize_view(player, Vec2::new(1024.0, 768.0), None)
        .unwrap();
    let mut sim = Simulation::new(world, 3);

    sim.world_mut().inputs_mut(player).unwrap().held = Keys::RIGHT;
    sim.run(100);

    let world = sim.world();
    let x = world.node(player).unwrap().position.x;
    let camera = &world.controller(player).unwrap().camera;
    assert!(camera.origin.x >= 0.0);
    assert!(camera.origin.x + camera.size.x <= 2000.0 + f32::EPSILON);
    assert!(x > camera.origin.x && x < camera.origin.x + camera.size.x);
    assert!(camera.origin.y <= 600.0 - camera.size.y + f32::EPSILON);
}

#[test]
fn chat_message_becomes_bubble() {
    let mut world = test_world();
    let region = arena(&mut world);
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, FLOOR - 27.0));
    let mut sim = Simulation::new(world, 3);

    sim.world_mut().inputs_mut(player).unwrap().message = Some("hello".into());
    sim.step();
    let bubble = sim.world().node(player).unwrap().bubble.clone().unwrap();
    assert_eq!(bubble.message, "hello");
    assert_eq!(bubble.time, sim.world().config().message_bubble_ticks);
    assert!(sim.world().controller(player).unwrap().inputs.message.is_none());
}

#[test]
fn standing_over_activatable_shows_star() {
    let mut world = test_world();
    let region = arena(&mut world);
    let sign = place(&mut world, NodeKind::Platform, region, Vec2::new(200.0, FLOOR - 20.0));
    world.set_categories(sign, ["activatable", "visible"]).unwrap();
    world.node_mut(sign).unwrap().size = Vec2::new(40.0, 40.0);
    let player = place(&mut world, NodeKind::Player, region, Vec2::new(200.0, FLOOR - 27.0));
    let mut sim = Simulation::new(world, 3);

    sim.step();
    let world = sim.world();
    assert_eq!(world.behavior(player).unwrap().over_activatable, Some(sign));
    assert!(world.node(player).unwrap().bubble.as_ref().unwrap().star);
}

#[test]
fn moving_a_node_mid_world_keeps_indexes_consistent() {
    let (mut sim, region, _, skeletons) = populated_simulation(13, 4);
    sim.run(10);
    let world = sim.world_mut();
    let pocket = world.spawn(NodeKind::Region).unwrap();
    world.warp(pocket, Vec2::ZERO, Some(region)).unwrap();
    world.warp(skeletons[0], Vec2::new(5.0, 5.0), Some(pocket)).unwrap();
    let _ = world.destroy(skeletons[1]).unwrap();
    sim.run(10);
    assert_index_consistent(sim.world());
    assert_eq!(sim.world().node(skeletons[0]).unwrap().container(), Some(pocket));
}
