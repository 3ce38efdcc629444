//! World nodes.
//!
//! Every object in a gloam world is a [`Node`]: the universe, regions,
//! scenery, platforms and creatures alike. A node has:
//! - [`NodeId`]: unique, monotonically assigned per world
//! - [`NodeKind`]: type tag used to pick presets and for persistence
//! - Geometry: centre position, full size, depth and velocity
//! - Category labels, mirrored into its container's [`CategoryIndex`]
//! - Optional sprite state and an optional [`Behavior`] capability
//!
//! # Ownership of invariants
//!
//! Fields that feed the container index (id, categories, container, contents)
//! are private and only change through [`crate::World`]. Everything else is
//! plain data and can be edited freely through [`crate::World::node_mut`].
//!
//! # Example
//!
//! ```
//! use gloam_core::node::{Facing, Rect};
//! use glam::Vec2;
//!
//! let a = Rect::from_center(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
//! let b = Rect::from_center(Vec2::new(9.0, 0.0), Vec2::new(10.0, 10.0));
//! assert!(a.overlaps(&b));
//!
//! assert_eq!(Facing::Left.sign(), -1.0);
//! ```

pub mod sprite;

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::behavior::Behavior;
use crate::index::CategoryIndex;

pub use sprite::{SpriteState, Tiling};

// =============================================================================
// Identity
// =============================================================================

/// Unique identifier for a node.
///
/// Ids are allocated from a per-world counter starting at 1 and never reused
/// within a world. They order by numeric value, which fixes iteration order
/// for every bucket and registry walk.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a `NodeId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<NodeId> for u64 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Type tag for a node.
///
/// Kinds carry no behavior of their own. They select a
/// [`crate::config::KindPreset`] at spawn time and are recorded in snapshots.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The world root
    Universe,
    /// A playable area; its size and floor buffer bound physics
    Region,
    /// Background scenery
    Landscape,
    /// Scenery tree
    Tree,
    /// Something to stand on
    Platform,
    /// Generic behavior-driven entity
    Creature,
    /// Entity driven by an observer's input
    Player,
    /// Undead entity that hunts anything with brains
    Skeleton,
}

impl NodeKind {
    /// Whether nodes of this kind carry a behavior capability by default.
    #[must_use]
    pub const fn is_entity(self) -> bool {
        matches!(self, Self::Creature | Self::Player | Self::Skeleton)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Universe => "Universe",
            Self::Region => "Region",
            Self::Landscape => "Landscape",
            Self::Tree => "Tree",
            Self::Platform => "Platform",
            Self::Creature => "Creature",
            Self::Player => "Player",
            Self::Skeleton => "Skeleton",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Horizontal facing.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing towards negative x
    Left,
    /// Facing towards positive x
    #[default]
    Right,
}

impl Facing {
    /// `-1.0` for left, `1.0` for right.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// The opposite facing.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Facing that points from `from` towards `to` along x. Ties face right.
    #[must_use]
    pub fn towards(from: f32, to: f32) -> Self {
        if to < from {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Axis-aligned rectangle in container-local coordinates (y grows downward).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub left: f32,
    /// Top edge
    pub top: f32,
    /// Right edge
    pub right: f32,
    /// Bottom edge
    pub bottom: f32,
}

impl Rect {
    /// Creates a rectangle from its edges.
    #[must_use]
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates the box `center ± size / 2`.
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self::new(
            center.x - half.x,
            center.y - half.y,
            center.x + half.x,
            center.y + half.y,
        )
    }

    /// Strict overlap: touching edges do not count.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Strict containment: points on an edge are outside.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x > self.left && point.x < self.right && point.y > self.top && point.y < self.bottom
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Transient speech or emote bubble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    /// Text shown in the bubble (empty for emotes)
    pub message: String,
    /// Show the "interact here" star instead of text
    pub star: bool,
    /// Ticks left before the bubble is removed
    pub time: u32,
}

impl Bubble {
    /// A chat bubble.
    #[must_use]
    pub fn message(message: impl Into<String>, time: u32) -> Self {
        Self {
            message: message.into(),
            star: false,
            time,
        }
    }

    /// The "interact here" star.
    #[must_use]
    pub fn star(time: u32) -> Self {
        Self {
            message: String::new(),
            star: true,
            time,
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// A world node.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    categories: BTreeSet<String>,
    container: Option<NodeId>,
    contents: CategoryIndex,

    /// Short name
    pub label: Option<String>,
    /// Longer description
    pub description: Option<String>,
    /// Centre, in the container's coordinates
    pub position: Vec2,
    /// Depth for draw ordering
    pub z: f32,
    /// Full collision width and height
    pub size: Vec2,
    /// Units per tick
    pub velocity: Vec2,
    /// Current facing
    pub facing: Facing,
    /// Added to vertical speed each tick; physics runs only when positive
    pub gravity: f32,
    /// Horizontal speed lost per tick
    pub linear_dampening: f32,
    /// Distance from the bottom edge to the floor line, for containers
    pub floor_buffer: f32,
    /// Resting on the floor or on a solid after the last physics step
    pub on_solid: bool,
    /// Ticks left during which strikes are ignored
    pub immunity: u32,
    /// Transient bubble
    pub bubble: Option<Bubble>,

    pub(crate) sprite: Option<SpriteState>,
    pub(crate) behavior: Option<Behavior>,
    pub(crate) last_tick: Option<u64>,
}

impl Node {
    /// Creates a detached node with no categories and zeroed geometry.
    #[must_use]
    pub(crate) fn new(id: NodeId, kind: NodeKind, linear_dampening: f32) -> Self {
        Self {
            id,
            kind,
            categories: BTreeSet::new(),
            container: None,
            contents: CategoryIndex::new(),
            label: None,
            description: None,
            position: Vec2::ZERO,
            z: 0.0,
            size: Vec2::ZERO,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            gravity: 0.0,
            linear_dampening,
            floor_buffer: 0.0,
            on_solid: false,
            immunity: 0,
            bubble: None,
            sprite: None,
            behavior: None,
            last_tick: None,
        }
    }

    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Type tag.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Category labels, sorted.
    #[must_use]
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Whether the node carries `category`.
    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    /// The node this one is directly inside.
    #[must_use]
    pub const fn container(&self) -> Option<NodeId> {
        self.container
    }

    /// Index over the nodes directly inside this one.
    #[must_use]
    pub fn contents(&self) -> &CategoryIndex {
        &self.contents
    }

    /// Sprite state, if a sprite is set.
    #[must_use]
    pub fn sprite(&self) -> Option<&SpriteState> {
        self.sprite.as_ref()
    }

    /// Behavior capability, if this node is an entity.
    ///
    /// Returns `None` while the node's own behavior step is running.
    #[must_use]
    pub fn behavior(&self) -> Option<&Behavior> {
        self.behavior.as_ref()
    }

    /// Mutable behavior capability.
    pub fn behavior_mut(&mut self) -> Option<&mut Behavior> {
        self.behavior.as_mut()
    }

    /// Whether a behavior capability is attached.
    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.behavior.is_some()
    }

    /// Bounding box `position ± size / 2`.
    #[must_use]
    pub fn bbox(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }

    /// Strict bounding-box overlap with another node.
    #[must_use]
    pub fn collides(&self, other: &Node) -> bool {
        self.bbox().overlaps(&other.bbox())
    }

    /// Euclidean distance from this node's centre to `point`.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    pub(crate) fn categories_mut(&mut self) -> &mut BTreeSet<String> {
        &mut self.categories
    }

    pub(crate) fn set_container(&mut self, container: Option<NodeId>) {
        self.container = container;
    }

    pub(crate) fn contents_mut(&mut self) -> &mut CategoryIndex {
        &mut self.contents
    }

    /// Advances per-tick timers: immunity, sprite frame and bubble.
    pub(crate) fn tick_timers(&mut self) {
        self.immunity = self.immunity.saturating_sub(1);
        if let Some(sprite) = self.sprite.as_mut() {
            sprite.advance();
        }
        if self.bubble.as_ref().is_some_and(|b| b.time == 0) {
            self.bubble = None;
        } else if let Some(bubble) = self.bubble.as_mut() {
            bubble.time -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(id: u64, position: Vec2, size: Vec2) -> Node {
        let mut node = Node::new(NodeId::new(id), NodeKind::Creature, 0.5);
        node.position = position;
        node.size = size;
        node
    }

    mod id_tests {
        use super::*;

        #[test]
        fn ids_order_numerically() {
            assert!(NodeId::new(2) < NodeId::new(10));
        }

        #[test]
        fn display_and_debug() {
            let id = NodeId::new(7);
            assert_eq!(format!("{id}"), "7");
            assert_eq!(format!("{id:?}"), "NodeId(7)");
        }

        #[test]
        fn conversions_round_trip() {
            let raw: u64 = NodeId::from(42).into();
            assert_eq!(raw, 42);
        }
    }

    mod rect_tests {
        use super::*;

        #[test]
        fn touching_edges_do_not_overlap() {
            let a = Rect::new(0.0, 0.0, 10.0, 10.0);
            let b = Rect::new(10.0, 0.0, 20.0, 10.0);
            assert!(!a.overlaps(&b));
        }

        #[test]
        fn point_on_edge_is_outside() {
            let r = Rect::new(0.0, 0.0, 10.0, 10.0);
            assert!(!r.contains(Vec2::new(10.0, 5.0)));
            assert!(r.contains(Vec2::new(9.9, 5.0)));
        }

        #[test]
        fn from_center_uses_half_extents() {
            let r = Rect::from_center(Vec2::new(50.0, 20.0), Vec2::new(10.0, 4.0));
            assert_eq!(r, Rect::new(45.0, 18.0, 55.0, 22.0));
            assert!((r.width() - 10.0).abs() < f32::EPSILON);
            assert!((r.height() - 4.0).abs() < f32::EPSILON);
        }
    }

    mod node_tests {
        use super::*;

        #[test]
        fn collides_is_symmetric() {
            let a = node_at(1, Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
            let b = node_at(2, Vec2::new(8.0, 3.0), Vec2::new(4.0, 4.0));
            assert!(a.collides(&b));
            assert!(b.collides(&a));
        }

        #[test]
        fn immunity_counts_down_to_zero() {
            let mut node = node_at(1, Vec2::ZERO, Vec2::ONE);
            node.immunity = 1;
            node.tick_timers();
            node.tick_timers();
            assert_eq!(node.immunity, 0);
        }

        #[test]
        fn bubble_expires_after_its_time() {
            let mut node = node_at(1, Vec2::ZERO, Vec2::ONE);
            node.bubble = Some(Bubble::message("hi", 2));
            node.tick_timers();
            node.tick_timers();
            assert!(node.bubble.is_some());
            node.tick_timers();
            assert!(node.bubble.is_none());
        }

        #[test]
        fn facing_towards() {
            assert_eq!(Facing::towards(10.0, 3.0), Facing::Left);
            assert_eq!(Facing::towards(10.0, 30.0), Facing::Right);
            assert_eq!(Facing::Left.flip(), Facing::Right);
        }
    }
}
