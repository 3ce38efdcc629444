//! World snapshots.
//!
//! A world serializes to a tree of [`NodeRecord`]s rooted at the universe.
//! Restoring rebuilds every node under its original id, then re-attaches
//! children to their parents with [`World::warp`], which rebuilds each
//! container's index from the children's categories. The id counter resumes
//! after the largest restored id.
//!
//! Transient state is not recorded: velocity, the running action, perception,
//! bubbles and player input all start fresh after a load.
//!
//! ```
//! use gloam_core::{NodeKind, World, WorldConfig};
//! use gloam_sprites::SpriteCatalog;
//! use glam::Vec2;
//! use std::sync::Arc;
//!
//! let sprites = Arc::new(SpriteCatalog::new());
//! let mut world = World::new(WorldConfig::default(), Arc::clone(&sprites));
//! let region = world.spawn_region(Vec2::new(800.0, 600.0), 20.0).unwrap();
//!
//! let json = world.to_json().unwrap();
//! let restored = World::from_json(&json, WorldConfig::default(), sprites).unwrap();
//! assert_eq!(restored.node(region).unwrap().size, Vec2::new(800.0, 600.0));
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::Vec2;
use gloam_sprites::SpriteCatalog;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::behavior::{Behavior, Controller, Goal, Revival, Stats};
use crate::config::WorldConfig;
use crate::error::LoadError;
use crate::index::Bucket;
use crate::node::{Facing, Node, NodeId, NodeKind, Tiling};
use crate::world::World;

/// One node and everything inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Original id
    pub id: NodeId,
    /// Type tag
    pub kind: NodeKind,
    /// Short name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category labels
    pub categories: Vec<String>,
    /// Centre in the parent's coordinates
    pub position: Vec2,
    /// Depth
    pub z: f32,
    /// Facing
    pub facing: Facing,
    /// Gravity
    pub gravity: f32,
    /// Horizontal damping
    pub linear_dampening: f32,
    /// Collision size
    pub size: Vec2,
    /// Floor buffer, for containers
    #[serde(default)]
    pub floor_buffer: f32,
    /// Sprite reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<SpriteRecord>,
    /// Behavior, for entities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<BehaviorRecord>,
    /// Direct children
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

/// Sprite reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteRecord {
    /// Sheet name
    pub name: String,
    /// Animation playing when saved
    #[serde(default = "default_animation")]
    pub animation: String,
    /// Layout hints
    #[serde(default)]
    pub tiling: Tiling,
}

fn default_animation() -> String {
    gloam_sprites::DEFAULT_ANIMATION.to_string()
}

/// Persistent part of a [`Behavior`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorRecord {
    /// Fallback goal
    pub base_goal: Goal,
    /// Override goal
    #[serde(default)]
    pub goal: Option<Goal>,
    /// Goal restored on revival
    pub intrinsic_goal: Goal,
    /// Revival policy
    #[serde(default)]
    pub revival: Revival,
    /// Numeric attributes
    #[serde(default)]
    pub stats: Stats,
    /// Opaque memories
    #[serde(default)]
    pub memory: Vec<serde_json::Value>,
    /// Whether the entity is observer-controlled
    #[serde(default)]
    pub controlled: bool,
}

impl BehaviorRecord {
    fn capture(behavior: &Behavior) -> Self {
        Self {
            base_goal: behavior.base_goal,
            goal: behavior.goal,
            intrinsic_goal: behavior.intrinsic_goal,
            revival: behavior.revival,
            stats: behavior.stats.clone(),
            memory: behavior.memory.clone(),
            controlled: behavior.controller.is_some(),
        }
    }

    fn restore(&self, id: NodeId, refresh_interval: u32) -> Behavior {
        let mut behavior = Behavior::new(id, self.base_goal, self.stats.clone(), refresh_interval)
            .with_revival(self.revival);
        behavior.goal = self.goal;
        behavior.intrinsic_goal = self.intrinsic_goal;
        behavior.memory.clone_from(&self.memory);
        if self.controlled {
            behavior = behavior.with_controller(Controller::default());
        }
        behavior
    }
}

impl World {
    /// Record of `id` and its subtree.
    #[must_use]
    pub fn to_record(&self, id: NodeId) -> Option<NodeRecord> {
        let node = self.node(id)?;
        let children = node
            .contents()
            .members(Bucket::All)
            .filter_map(|child| self.to_record(child))
            .collect();
        Some(NodeRecord {
            id,
            kind: node.kind(),
            label: node.label.clone(),
            description: node.description.clone(),
            categories: node.categories().iter().cloned().collect(),
            position: node.position,
            z: node.z,
            facing: node.facing,
            gravity: node.gravity,
            linear_dampening: node.linear_dampening,
            size: node.size,
            floor_buffer: node.floor_buffer,
            sprite: node.sprite().map(|s| SpriteRecord {
                name: s.name.clone(),
                animation: s.animation.clone(),
                tiling: s.tiling,
            }),
            behavior: node.behavior().map(BehaviorRecord::capture),
            children,
        })
    }

    /// Serializes the whole world, root first.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_record(self.root()))
    }

    /// Rebuilds a world from a record tree. The top record becomes the root.
    ///
    /// # Errors
    ///
    /// - [`LoadError::DuplicateId`] when two records share an id
    /// - [`LoadError::World`] when a record names an unknown sprite
    pub fn from_record(
        record: &NodeRecord,
        config: WorldConfig,
        sprites: Arc<SpriteCatalog>,
    ) -> Result<Self, LoadError> {
        let mut seen = BTreeSet::new();
        check_ids(record, &mut seen)?;

        let mut world = Self::restoring(record.id, config, sprites);
        restore_subtree(&mut world, record)?;
        debug!(nodes = world.len(), "world restored");
        Ok(world)
    }

    /// Parses and restores a world snapshot.
    ///
    /// # Errors
    ///
    /// [`LoadError::Malformed`] for bad JSON, otherwise as [`World::from_record`].
    pub fn from_json(
        json: &str,
        config: WorldConfig,
        sprites: Arc<SpriteCatalog>,
    ) -> Result<Self, LoadError> {
        let record: NodeRecord = serde_json::from_str(json)?;
        Self::from_record(&record, config, sprites)
    }
}

fn check_ids(record: &NodeRecord, seen: &mut BTreeSet<NodeId>) -> Result<(), LoadError> {
    if !seen.insert(record.id) {
        return Err(LoadError::DuplicateId(record.id));
    }
    record.children.iter().try_for_each(|child| check_ids(child, seen))
}

fn restore_subtree(world: &mut World, record: &NodeRecord) -> Result<(), LoadError> {
    let mut node = Node::new(record.id, record.kind, record.linear_dampening);
    node.label.clone_from(&record.label);
    node.description.clone_from(&record.description);
    node.categories_mut()
        .extend(record.categories.iter().cloned());
    node.position = record.position;
    node.z = record.z;
    node.facing = record.facing;
    node.gravity = record.gravity;
    node.size = record.size;
    node.floor_buffer = record.floor_buffer;
    if let Some(sprite) = &record.sprite {
        let (mut state, _) = world.sprite_state(&sprite.name, sprite.tiling)?;
        if let Some(sheet) = world.sprites().get(&sprite.name) {
            state.select(sheet, &sprite.animation, None);
        }
        node.sprite = Some(state);
    }
    node.behavior = record
        .behavior
        .as_ref()
        .map(|b| b.restore(record.id, world.config().in_view_update_delay));
    world.insert_restored(node);

    for child in &record.children {
        restore_subtree(world, child)?;
        world.warp(child.id, child.position, Some(record.id))?;
    }
    Ok(())
}
