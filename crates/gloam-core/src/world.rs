//! The world: node registry and container tree.
//!
//! A [`World`] owns every node of one simulated universe:
//! - Node storage with deterministic iteration order (`BTreeMap`)
//! - Id allocation (monotonic from 1; the root takes the first id)
//! - The container tree and each container's [`CategoryIndex`]
//! - Spawning from per-kind presets, sprite assignment, strikes
//!
//! # Structural invariant
//!
//! For every node `N` inside container `C`, `C`'s index holds `N` in the
//! `All` bucket and in exactly the buckets named by `N`'s categories. Every
//! operation that touches containment or categories (`warp`, `detach`,
//! `destroy`, `set_categories`, `add_category`, `remove_category`) updates
//! both sides before returning. Position, velocity and other plain fields do
//! not feed the index and are edited directly through [`World::node_mut`].
//!
//! # Example
//!
//! ```
//! use gloam_core::{NodeKind, World, WorldConfig};
//! use gloam_core::index::Bucket;
//! use gloam_sprites::SpriteCatalog;
//! use glam::Vec2;
//! use std::sync::Arc;
//!
//! let mut world = World::new(WorldConfig::default(), Arc::new(SpriteCatalog::new()));
//! let region = world.spawn_region(Vec2::new(1000.0, 600.0), 40.0).unwrap();
//!
//! let ledge = world.spawn(NodeKind::Platform).unwrap();
//! world.node_mut(ledge).unwrap().size = Vec2::new(200.0, 20.0);
//! world.warp(ledge, Vec2::new(300.0, 400.0), Some(region)).unwrap();
//!
//! let solids: Vec<_> = world.node(region).unwrap().contents().members("solid".into()).collect();
//! assert_eq!(solids, vec![ledge]);
//! assert_eq!(world.population(world.root()), 3);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use glam::Vec2;
use gloam_sprites::{AnimationSpec, SpriteCatalog};
use tracing::debug;

use crate::behavior::{Action, ActionKind, Behavior, Controller, InputState};
use crate::config::{KindPreset, WorldConfig};
use crate::error::{Result, WorldError};
use crate::index::Bucket;
use crate::node::{Facing, Node, NodeId, NodeKind, SpriteState, Tiling};

/// Outcome of [`World::destroy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Destroyed {
    /// The node was removed from its container and the registry
    Removed {
        /// Nodes removed, including descendants
        count: usize,
    },
    /// The node had no container; it was only removed from the registry
    AlreadyDetached {
        /// Nodes removed, including descendants
        count: usize,
    },
}

impl Destroyed {
    /// Nodes removed from the registry.
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Removed { count } | Self::AlreadyDetached { count } => count,
        }
    }
}

/// A blow landed by one node on another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    /// Attacker
    pub from: NodeId,
    /// Direction of the blow
    pub dir: Facing,
    /// Attacker strength
    pub strength: f32,
    /// Immunity window granted to the target
    pub immunity: u32,
}

/// Registry and container tree of one world.
#[derive(Debug, Clone)]
pub struct World {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    next_action_id: u64,
    tick: u64,
    config: WorldConfig,
    sprites: Arc<SpriteCatalog>,
}

impl World {
    /// Creates a world holding only its root ([`NodeKind::Universe`], id 1).
    #[must_use]
    pub fn new(config: WorldConfig, sprites: Arc<SpriteCatalog>) -> Self {
        let root = NodeId::new(1);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node::new(root, NodeKind::Universe, config.linear_dampening),
        );
        Self {
            nodes,
            root,
            next_id: 2,
            next_action_id: 1,
            tick: 0,
            config,
            sprites,
        }
    }

    /// Empty world awaiting restored nodes; `root` must be inserted next.
    pub(crate) fn restoring(root: NodeId, config: WorldConfig, sprites: Arc<SpriteCatalog>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            root,
            next_id: root.as_u64() + 1,
            next_action_id: 1,
            tick: 0,
            config,
            sprites,
        }
    }

    /// Registers a restored node under its own id. The id counter resumes
    /// after the largest id seen.
    pub(crate) fn insert_restored(&mut self, node: Node) {
        let id = node.id();
        self.next_id = self.next_id.max(id.as_u64() + 1);
        self.nodes.insert(id, node);
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Id of the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// World configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Sprite catalog.
    #[must_use]
    pub fn sprites(&self) -> &SpriteCatalog {
        &self.sprites
    }

    /// Shared handle to the sprite catalog.
    #[must_use]
    pub fn sprites_handle(&self) -> Arc<SpriteCatalog> {
        Arc::clone(&self.sprites)
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Looks up a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of registered nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// Behavior of an entity.
    #[must_use]
    pub fn behavior(&self, id: NodeId) -> Option<&Behavior> {
        self.node(id).and_then(Node::behavior)
    }

    /// Mutable behavior of an entity.
    pub fn behavior_mut(&mut self, id: NodeId) -> Option<&mut Behavior> {
        self.node_mut(id).and_then(Node::behavior_mut)
    }

    /// Controller of an observer-controlled entity.
    #[must_use]
    pub fn controller(&self, id: NodeId) -> Option<&Controller> {
        self.behavior(id).and_then(|b| b.controller.as_ref())
    }

    /// Mutable controller of an observer-controlled entity.
    pub fn controller_mut(&mut self, id: NodeId) -> Option<&mut Controller> {
        self.behavior_mut(id).and_then(|b| b.controller.as_mut())
    }

    /// Input state of an observer-controlled entity.
    pub fn inputs_mut(&mut self, id: NodeId) -> Option<&mut InputState> {
        self.controller_mut(id).map(|c| &mut c.inputs)
    }

    /// Ids of observer-controlled entities, ascending.
    #[must_use]
    pub fn controlled(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.behavior().is_some_and(|b| b.controller.is_some()))
            .map(Node::id)
            .collect()
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    /// Spawns a detached node using the configured preset for `kind`.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownSprite`] when the preset names a sprite the
    /// catalog does not have.
    pub fn spawn(&mut self, kind: NodeKind) -> Result<NodeId> {
        let preset = self.config.preset(kind);
        self.spawn_from(kind, &preset)
    }

    /// Spawns a detached node from an explicit preset.
    ///
    /// Entity presets get world gravity and a [`Behavior`]; size comes from
    /// the sprite's default animation minus its edge margins.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownSprite`] when the preset's sprite is not in the catalog.
    pub fn spawn_from(&mut self, kind: NodeKind, preset: &KindPreset) -> Result<NodeId> {
        let sprite = preset
            .sprite
            .as_deref()
            .map(|name| self.sprite_state(name, Tiling::default()))
            .transpose()?;

        let id = self.allocate_id();
        let mut node = Node::new(id, kind, self.config.linear_dampening);
        node.z = preset.z;
        node.categories_mut()
            .extend(preset.categories.iter().cloned());
        if let Some((state, size)) = sprite {
            node.sprite = Some(state);
            node.size = size;
        }
        if let Some(entity) = &preset.entity {
            node.gravity = self.config.gravity;
            node.behavior = Some(Behavior::from_preset(
                id,
                entity,
                &self.config.default_entity_stats,
                self.config.in_view_update_delay,
            ));
        }
        self.nodes.insert(id, node);
        debug!(%id, %kind, "node spawned");
        Ok(id)
    }

    /// Spawns a region of the given size inside the root.
    ///
    /// # Errors
    ///
    /// Propagates spawn errors from a misconfigured region preset.
    pub fn spawn_region(&mut self, size: Vec2, floor_buffer: f32) -> Result<NodeId> {
        let id = self.spawn(NodeKind::Region)?;
        if let Some(node) = self.node_mut(id) {
            node.size = size;
            node.floor_buffer = floor_buffer;
        }
        let root = self.root;
        self.warp(id, size * 0.5, Some(root))?;
        Ok(id)
    }

    /// Attaches (or replaces) a behavior capability.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`] for unknown ids.
    pub fn attach_behavior(&mut self, id: NodeId, behavior: Behavior) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(WorldError::NodeNotFound(id))?;
        node.behavior = Some(behavior);
        Ok(())
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    // =========================================================================
    // Containment
    // =========================================================================

    /// Moves `id` to `position`, and into `container` when one is given.
    ///
    /// Moving between containers updates both indexes before returning.
    /// Without a container the node is only repositioned.
    ///
    /// # Errors
    ///
    /// - [`WorldError::NodeNotFound`] for an unknown node or container
    /// - [`WorldError::RootImmutable`] when moving the root into a container
    /// - [`WorldError::ContainmentCycle`] when `container` is `id` or inside it
    pub fn warp(&mut self, id: NodeId, position: Vec2, container: Option<NodeId>) -> Result<()> {
        if !self.contains(id) {
            return Err(WorldError::NodeNotFound(id));
        }
        if let Some(container) = container {
            if id == self.root {
                return Err(WorldError::RootImmutable(id));
            }
            if !self.contains(container) {
                return Err(WorldError::NodeNotFound(container));
            }
            if container == id || self.is_ancestor(id, container) {
                return Err(WorldError::ContainmentCycle {
                    node: id,
                    container,
                });
            }
            self.unlink(id);
            self.link(id, container);
            debug!(%id, %container, "node warped");
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.position = position;
        }
        Ok(())
    }

    /// Removes `id` from its container, keeping it registered.
    ///
    /// Returns whether the node had a container.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`] or [`WorldError::RootImmutable`].
    pub fn detach(&mut self, id: NodeId) -> Result<bool> {
        if id == self.root {
            return Err(WorldError::RootImmutable(id));
        }
        if !self.contains(id) {
            return Err(WorldError::NodeNotFound(id));
        }
        Ok(self.unlink(id))
    }

    /// Removes `id` and everything inside it from the world.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`] or [`WorldError::RootImmutable`].
    pub fn destroy(&mut self, id: NodeId) -> Result<Destroyed> {
        if id == self.root {
            return Err(WorldError::RootImmutable(id));
        }
        if !self.contains(id) {
            return Err(WorldError::NodeNotFound(id));
        }
        let was_attached = self.unlink(id);

        let mut count = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                count += 1;
                stack.extend(node.contents().members(Bucket::All));
            }
        }
        debug!(%id, count, "node destroyed");

        Ok(if was_attached {
            Destroyed::Removed { count }
        } else {
            Destroyed::AlreadyDetached { count }
        })
    }

    /// Whether `ancestor` contains `id`, directly or transitively.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.node(id).and_then(Node::container);
        while let Some(container) = current {
            if container == ancestor {
                return true;
            }
            current = self.node(container).and_then(Node::container);
        }
        false
    }

    /// Size of `id` plus everything inside it, recursively. Zero for unknown ids.
    #[must_use]
    pub fn population(&self, id: NodeId) -> usize {
        let Some(node) = self.node(id) else {
            return 0;
        };
        1 + node
            .contents()
            .members(Bucket::All)
            .map(|child| self.population(child))
            .sum::<usize>()
    }

    /// Size of the container `id` lives in.
    #[must_use]
    pub fn container_size(&self, id: NodeId) -> Option<Vec2> {
        let container = self.node(id)?.container()?;
        self.node(container).map(|c| c.size)
    }

    fn unlink(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let Some(container) = node.container() else {
            return false;
        };
        node.set_container(None);
        if let Some(parent) = self.nodes.get_mut(&container) {
            parent.contents_mut().remove(id);
        }
        true
    }

    fn link(&mut self, id: NodeId, container: NodeId) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.set_container(Some(container));
        let categories: Vec<String> = node.categories().iter().cloned().collect();
        if let Some(parent) = self.nodes.get_mut(&container) {
            parent.contents_mut().insert(id, &categories);
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Replaces the categories of `id`, reindexing its container.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`] for unknown ids.
    pub fn set_categories<I, S>(&mut self, id: NodeId, categories: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories: BTreeSet<String> = categories.into_iter().map(Into::into).collect();
        self.recategorize(id, |current| {
            *current = categories;
            true
        })
        .map(|_| ())
    }

    /// Adds a category. Returns `false` if it was already present.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`] for unknown ids.
    pub fn add_category(&mut self, id: NodeId, category: &str) -> Result<bool> {
        self.recategorize(id, |current| current.insert(category.to_string()))
    }

    /// Removes a category. Returns `false` if it was not present.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`] for unknown ids.
    pub fn remove_category(&mut self, id: NodeId, category: &str) -> Result<bool> {
        self.recategorize(id, |current| current.remove(category))
    }

    /// Replaces `from` with `to` if present.
    pub(crate) fn swap_category(&mut self, id: NodeId, from: &str, to: &str) {
        let swapped = self.recategorize(id, |current| {
            if current.remove(from) {
                current.insert(to.to_string());
                true
            } else {
                false
            }
        });
        if matches!(swapped, Ok(true)) {
            debug!(%id, from, to, "category swapped");
        }
    }

    /// Applies `edit` to the category set and, when it reports a change,
    /// reindexes the node inside its container.
    fn recategorize<F>(&mut self, id: NodeId, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut BTreeSet<String>) -> bool,
    {
        let node = self.nodes.get_mut(&id).ok_or(WorldError::NodeNotFound(id))?;
        if !edit(node.categories_mut()) {
            return Ok(false);
        }
        let container = node.container();
        let categories: Vec<String> = node.categories().iter().cloned().collect();
        if let Some(parent) = container.and_then(|c| self.nodes.get_mut(&c)) {
            parent.contents_mut().reindex(id, &categories);
        }
        Ok(true)
    }

    // =========================================================================
    // Sprites
    // =========================================================================

    /// Assigns a sprite sheet and derives the node's size from its default
    /// animation minus the edge margins.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`] or [`WorldError::UnknownSprite`].
    pub fn set_sprite(&mut self, id: NodeId, name: &str, tiling: Tiling) -> Result<()> {
        if !self.contains(id) {
            return Err(WorldError::NodeNotFound(id));
        }
        let (state, size) = self.sprite_state(name, tiling)?;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.sprite = Some(state);
            node.size = size;
        }
        Ok(())
    }

    /// Selects an animation; unknown names fall back to `"default"`.
    ///
    /// Returns whether the animation changed. Nodes without a sprite are
    /// left alone.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`] for unknown ids.
    pub fn set_animation(
        &mut self,
        id: NodeId,
        animation: &str,
        frame_speed: Option<f32>,
    ) -> Result<bool> {
        let node = self.nodes.get_mut(&id).ok_or(WorldError::NodeNotFound(id))?;
        let Some(sprite) = node.sprite.as_mut() else {
            return Ok(false);
        };
        Ok(self
            .sprites
            .get(&sprite.name)
            .is_some_and(|sheet| sprite.select(sheet, animation, frame_speed)))
    }

    pub(crate) fn select_animation(&mut self, id: NodeId, animation: &str, frame_speed: Option<f32>) {
        // Missing nodes and sprite-less nodes are both fine here.
        let _ = self.set_animation(id, animation, frame_speed);
    }

    pub(crate) fn sprite_mut(&mut self, id: NodeId) -> Option<&mut SpriteState> {
        self.nodes.get_mut(&id).and_then(|n| n.sprite.as_mut())
    }

    /// Geometry of `animation` in the node's sheet (with default fallback).
    #[must_use]
    pub fn animation_spec(&self, id: NodeId, animation: &str) -> Option<&AnimationSpec> {
        let sprite = self.node(id)?.sprite()?;
        self.sprites.animation(&sprite.name, animation)
    }

    /// Geometry of the animation the node is currently showing.
    #[must_use]
    pub fn current_animation(&self, id: NodeId) -> Option<&AnimationSpec> {
        let sprite = self.node(id)?.sprite()?;
        self.sprites.animation(&sprite.name, &sprite.animation)
    }

    pub(crate) fn sprite_state(&self, name: &str, tiling: Tiling) -> Result<(SpriteState, Vec2)> {
        let sheet = self
            .sprites
            .get(name)
            .ok_or_else(|| WorldError::UnknownSprite(name.to_string()))?;
        let spec = sheet.default_animation();
        Ok((
            SpriteState::new(name, sheet, tiling),
            Vec2::new(spec.body_width(), spec.body_height()),
        ))
    }

    // =========================================================================
    // Actions
    // =========================================================================

    pub(crate) fn new_action(&mut self, kind: ActionKind) -> Action {
        let id = self.next_action_id;
        self.next_action_id += 1;
        Action::new(id, kind)
    }

    /// Replaces the current action of an entity. Returns the new action's id.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`] or [`WorldError::NotAnEntity`].
    pub fn assign_action(&mut self, id: NodeId, kind: ActionKind) -> Result<u64> {
        match self.node(id) {
            None => return Err(WorldError::NodeNotFound(id)),
            Some(node) if !node.is_entity() => return Err(WorldError::NotAnEntity(id)),
            Some(_) => {}
        }
        let action = self.new_action(kind);
        let action_id = action.id();
        if let Some(behavior) = self.behavior_mut(id) {
            behavior.action = Some(action);
        }
        Ok(action_id)
    }

    /// Lands a strike on `target`.
    ///
    /// An immune target (or the attacker itself) is left untouched and
    /// `false` is returned. Otherwise the target gains the strike's immunity
    /// window and, if it is an entity, its action becomes a
    /// [`ActionKind::Flinch`].
    pub fn strike(&mut self, target: NodeId, strike: Strike) -> bool {
        if target == strike.from {
            return false;
        }
        match self.node(target) {
            Some(node) if node.immunity == 0 => {}
            _ => return false,
        }
        let flinch = self.new_action(ActionKind::Flinch {
            dir: strike.dir,
            strength: strike.strength,
        });
        let Some(node) = self.nodes.get_mut(&target) else {
            return false;
        };
        node.immunity = strike.immunity;
        if let Some(behavior) = node.behavior.as_mut() {
            behavior.action = Some(flinch);
        }
        debug!(%target, from = %strike.from, strength = strike.strength, "strike landed");
        true
    }
}
