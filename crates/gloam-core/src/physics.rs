//! Per-tick motion integration.
//!
//! Runs for nodes that have a container and positive gravity. Vertical and
//! horizontal axes are resolved separately, each against the container's
//! `solid` bucket:
//!
//! - **Vertical**: if the next step would reach the container's floor line
//!   (`height - floor_buffer`), rest on it. Otherwise accelerate by gravity,
//!   move, snap out of any solid along the direction of travel, and clamp at
//!   the ceiling (`y >= 0`).
//! - **Horizontal**: speeds within the damping band stop dead; faster ones lose
//!   `linear_dampening` per tick, move, snap out of solids, and clamp to
//!   `[0, width]`.
//!
//! `on_solid` is set when the node rests on the floor or lands on a solid.

use crate::node::NodeId;
use crate::query::SOLID;
use crate::world::World;

/// Advances `id` by one physics step. Returns `false` when the node was
/// skipped (missing, detached or weightless).
pub fn integrate(world: &mut World, id: NodeId) -> bool {
    let Some(node) = world.node(id) else {
        return false;
    };
    if node.gravity <= 0.0 {
        return false;
    }
    let Some(bounds) = node.container().and_then(|c| world.node(c)) else {
        return false;
    };
    let floor = bounds.size.y - bounds.floor_buffer;
    let width = bounds.size.x;

    vertical(world, id, floor);
    horizontal(world, id, width);
    true
}

fn vertical(world: &mut World, id: NodeId, floor: f32) {
    let Some(node) = world.node_mut(id) else {
        return;
    };
    let half = node.size.y * 0.5;
    if node.position.y + half + node.velocity.y >= floor {
        node.position.y = floor - half;
        node.velocity.y = 0.0;
        node.on_solid = true;
        return;
    }

    node.on_solid = false;
    node.velocity.y += node.gravity;
    node.position.y += node.velocity.y;

    if let Some(solid) = world.instance_place(id, SOLID.into(), None) {
        let other = world.node(solid).map(|n| (n.position.y, n.size.y * 0.5));
        if let (Some((other_y, other_half)), Some(node)) = (other, world.node_mut(id)) {
            let falling = node.velocity.y > 0.0;
            node.position.y = if falling {
                other_y - other_half - half
            } else {
                other_y + other_half + half
            };
            node.velocity.y = 0.0;
            node.on_solid = falling;
        }
    }

    if let Some(node) = world.node_mut(id) {
        if node.position.y < 0.0 {
            node.position.y = 0.0;
            node.velocity.y = 0.0;
        }
    }
}

fn horizontal(world: &mut World, id: NodeId, width: f32) {
    let Some(node) = world.node_mut(id) else {
        return;
    };
    let damping = node.linear_dampening;
    if node.velocity.x.abs() <= damping {
        node.velocity.x = 0.0;
        return;
    }
    node.velocity.x -= damping.copysign(node.velocity.x);
    node.position.x += node.velocity.x;
    let half = node.size.x * 0.5;

    if let Some(solid) = world.instance_place(id, SOLID.into(), None) {
        let other = world.node(solid).map(|n| (n.position.x, n.size.x * 0.5));
        if let (Some((other_x, other_half)), Some(node)) = (other, world.node_mut(id)) {
            node.position.x = if node.velocity.x > 0.0 {
                other_x - other_half - half
            } else {
                other_x + other_half + half
            };
            node.velocity.x = 0.0;
        }
    }

    if let Some(node) = world.node_mut(id) {
        if node.position.x < 0.0 {
            node.position.x = 0.0;
            node.velocity.x = 0.0;
        } else if node.position.x > width {
            node.position.x = width;
            node.velocity.x = 0.0;
        }
    }
}
