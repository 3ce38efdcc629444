//! Observer side: the camera and the per-tick snapshots sent to players.
//!
//! # Camera
//!
//! A [`Camera`] is a screen-sized rectangle in world units. Each tick it
//! follows its entity so the entity stays inside the buffered interior, then
//! clamps to the container: left and right edges, and the bottom edge. The
//! top is left open so tall jumps can scroll above the region.
//!
//! # Snapshots
//!
//! A [`NodePacket`] is what a renderer needs to draw one node. An
//! [`ObserverSnapshot`] bundles the camera origin with packets for the
//! observer's in-view set plus the container's `landscape` bucket. Large sets
//! are split into [`Shard`]s: the `i`-th node (ascending id) belongs to shard
//! `i % count`.
//!
//! Building snapshots only reads the world, so [`World::observer_snapshots`]
//! builds them for every player in parallel.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ViewConfig;
use crate::error::{Result, WorldError};
use crate::node::{Bubble, Facing, NodeId};
use crate::world::World;

/// Category always included in player snapshots.
pub const LANDSCAPE: &str = "landscape";

// =============================================================================
// Camera
// =============================================================================

/// A player's view rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Top-left corner in world units
    pub origin: Vec2,
    /// Width and height in world units
    pub size: Vec2,
    /// Follow margins in world units
    pub buffer: Vec2,
    /// World units per screen pixel
    pub scale: f32,
    /// Pan speed
    pub speed: f32,
    /// Skip following; clamping still applies
    pub unrestricted: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            size: Vec2::ZERO,
            buffer: Vec2::ZERO,
            scale: 1.0,
            speed: 0.0,
            unrestricted: false,
        }
    }
}

impl Camera {
    /// Camera centred on `center` for a screen of `screen` pixels.
    ///
    /// Without an explicit `scale`, screens narrower than
    /// `view.narrow_screen_width` get twice the configured scale.
    #[must_use]
    pub fn for_screen(screen: Vec2, center: Vec2, view: &ViewConfig, scale: Option<f32>) -> Self {
        let scale = scale.unwrap_or(if screen.x < view.narrow_screen_width {
            view.scale * 2.0
        } else {
            view.scale
        });
        let size = screen * scale;
        Self {
            origin: center - size * 0.5,
            size,
            buffer: size * Vec2::new(view.x_buffer, view.y_buffer),
            scale,
            speed: view.speed * scale,
            unrestricted: false,
        }
    }

    /// Moves the view so `target` sits inside the buffered interior.
    pub fn follow(&mut self, target: Vec2) {
        if target.x > self.origin.x + self.size.x - self.buffer.x {
            self.origin.x = target.x + self.buffer.x - self.size.x;
        } else if target.x < self.origin.x + self.buffer.x {
            self.origin.x = target.x - self.buffer.x;
        }
        if target.y > self.origin.y + self.size.y - self.buffer.y {
            self.origin.y = target.y + self.buffer.y - self.size.y;
        } else if target.y < self.origin.y + self.buffer.y {
            self.origin.y = target.y - self.buffer.y;
        }
    }

    /// Keeps the view inside a container of size `bounds`.
    pub fn clamp(&mut self, bounds: Vec2) {
        if self.origin.x < 0.0 {
            self.origin.x = 0.0;
        }
        if self.origin.x + self.size.x > bounds.x {
            self.origin.x = bounds.x - self.size.x;
        }
        if self.origin.y > bounds.y - self.size.y {
            self.origin.y = bounds.y - self.size.y;
        }
    }

    /// Converts a screen point to world coordinates.
    #[must_use]
    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        screen * self.scale + self.origin
    }
}

// =============================================================================
// Packets
// =============================================================================

/// Sprite part of a [`NodePacket`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpritePacket {
    /// Sheet name
    pub name: String,
    /// Animation name
    pub animation: String,
    /// Whole frame index
    pub frame: u32,
    /// Facing, for mirroring
    pub mirror: Facing,
    /// Repeat horizontally
    pub tile_x: bool,
    /// Repeat vertically
    pub tile_y: bool,
    /// Parallax factor
    pub scroll_speed: f32,
    /// Frame width
    pub width: f32,
    /// Frame height
    pub height: f32,
}

/// Render state of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePacket {
    /// Node id
    pub id: NodeId,
    /// Sprite, when the node has one
    pub sprite: Option<SpritePacket>,
    /// Drawn width (animation frame, or node size without a sprite)
    pub width: f32,
    /// Drawn height
    pub height: f32,
    /// Draw position: centre shifted by the animation offset, mirrored by facing
    pub position: Vec2,
    /// Depth
    pub z: f32,
    /// Transient bubble
    pub bubble: Option<Bubble>,
    /// Top edge of the solid underneath, for shadows
    pub below_y: Option<f32>,
}

/// Shard selector for splitting a snapshot across deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// Which shard to build
    pub index: usize,
    /// Total shards; 0 is treated as 1
    pub count: usize,
}

impl Shard {
    /// Everything in one shard.
    pub const ALL: Self = Self { index: 0, count: 1 };

    /// Creates a shard selector.
    #[must_use]
    pub const fn new(index: usize, count: usize) -> Self {
        Self { index, count }
    }

    /// Whether position `i` belongs to this shard.
    #[must_use]
    pub const fn includes(self, i: usize) -> bool {
        let count = if self.count == 0 { 1 } else { self.count };
        i % count == self.index
    }
}

impl Default for Shard {
    fn default() -> Self {
        Self::ALL
    }
}

/// What one player receives for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverSnapshot {
    /// Camera origin
    pub view: Vec2,
    /// Packets for this shard, by id
    pub in_view: BTreeMap<NodeId, NodePacket>,
}

impl World {
    /// Sets up the camera of controlled entity `id` for a screen of `screen`
    /// pixels, centred on the entity.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeNotFound`], or [`WorldError::NotAnEntity`] when the
    /// node has no controller.
    pub fn initialize_view(&mut self, id: NodeId, screen: Vec2, scale: Option<f32>) -> Result<()> {
        let center = self.node(id).ok_or(WorldError::NodeNotFound(id))?.position;
        let camera = Camera::for_screen(screen, center, &self.config().view, scale);
        let controller = self.controller_mut(id).ok_or(WorldError::NotAnEntity(id))?;
        controller.camera = camera;
        Ok(())
    }

    /// Render packet for one node.
    #[must_use]
    pub fn packet(&self, id: NodeId) -> Option<NodePacket> {
        let node = self.node(id)?;
        let below_y = self
            .node_below(id)
            .and_then(|below| self.node(below))
            .map(|below| below.bbox().top);

        let sprite = node.sprite().and_then(|state| {
            let spec = self.sprites().animation(&state.name, &state.animation)?;
            Some((state, spec))
        });
        let (width, height, position, sprite) = match sprite {
            Some((state, spec)) => {
                let offset = Vec2::new(spec.x_offset * node.facing.sign(), spec.y_offset);
                let packet = SpritePacket {
                    name: state.name.clone(),
                    animation: state.animation.clone(),
                    frame: state.frame_index(),
                    mirror: node.facing,
                    tile_x: state.tiling.tile_x,
                    tile_y: state.tiling.tile_y,
                    scroll_speed: state.tiling.scroll_speed,
                    width: spec.width,
                    height: spec.height,
                };
                (spec.width, spec.height, node.position + offset, Some(packet))
            }
            None => (node.size.x, node.size.y, node.position, None),
        };

        Some(NodePacket {
            id,
            sprite,
            width,
            height,
            position,
            z: node.z,
            bubble: node.bubble.clone(),
            below_y,
        })
    }

    /// Snapshot for controlled entity `id`, or `None` if it has no controller.
    #[must_use]
    pub fn observer_snapshot(&self, id: NodeId, shard: Shard) -> Option<ObserverSnapshot> {
        let node = self.node(id)?;
        let behavior = node.behavior()?;
        let controller = behavior.controller.as_ref()?;

        let mut visible: BTreeSet<NodeId> = behavior.perception.in_view().all().clone();
        if let Some(container) = node.container().and_then(|c| self.node(c)) {
            visible.extend(container.contents().members(LANDSCAPE.into()));
        }

        let in_view = visible
            .into_iter()
            .enumerate()
            .filter(|(i, _)| shard.includes(*i))
            .filter_map(|(_, seen)| self.packet(seen).map(|p| (seen, p)))
            .collect();

        Some(ObserverSnapshot {
            view: controller.camera.origin,
            in_view,
        })
    }

    /// Snapshots for every controlled entity, built in parallel.
    #[must_use]
    pub fn observer_snapshots(&self, shard: Shard) -> Vec<(NodeId, ObserverSnapshot)> {
        self.controlled()
            .par_iter()
            .filter_map(|id| self.observer_snapshot(*id, shard).map(|s| (*id, s)))
            .collect()
    }
}
