//! Spatial queries scoped to a node's container.
//!
//! Every query walks one bucket of the querying node's container index in
//! ascending id order, so "first match" and nearest-distance ties resolve to
//! the lowest id. Detached nodes, unknown ids and empty or unknown buckets
//! yield no match; none of these are errors.

use glam::Vec2;

use crate::index::Bucket;
use crate::node::{Node, NodeId, Rect};
use crate::world::World;

/// Category physics collides against.
pub const SOLID: &str = "solid";

impl World {
    /// Members of `id`'s container in `bucket`, resolved to nodes.
    fn neighbours<'w>(
        &'w self,
        id: NodeId,
        bucket: Bucket<'w>,
    ) -> impl Iterator<Item = &'w Node> + 'w {
        self.node(id)
            .and_then(Node::container)
            .and_then(|c| self.node(c))
            .into_iter()
            .flat_map(move |container| container.contents().members(bucket))
            .filter_map(move |member| self.node(member))
    }

    /// First member of `bucket` overlapping `id`'s box placed at `at`
    /// (its current position when `None`), excluding `id` itself.
    #[must_use]
    pub fn instance_place(&self, id: NodeId, bucket: Bucket<'_>, at: Option<Vec2>) -> Option<NodeId> {
        let node = self.node(id)?;
        let probe = Rect::from_center(at.unwrap_or(node.position), node.size);
        self.neighbours(id, bucket)
            .find(|other| other.id() != id && probe.overlaps(&other.bbox()))
            .map(Node::id)
    }

    /// First member of `bucket` whose box strictly contains `point`.
    #[must_use]
    pub fn instance_point(&self, id: NodeId, bucket: Bucket<'_>, point: Vec2) -> Option<NodeId> {
        self.neighbours(id, bucket)
            .find(|other| other.bbox().contains(point))
            .map(Node::id)
    }

    /// First member of `bucket` whose box overlaps `rect`.
    #[must_use]
    pub fn instance_rect(&self, id: NodeId, bucket: Bucket<'_>, rect: Rect) -> Option<NodeId> {
        self.neighbours(id, bucket)
            .find(|other| other.bbox().overlaps(&rect))
            .map(Node::id)
    }

    /// Every member of `bucket` whose box overlaps `rect`, ascending by id.
    #[must_use]
    pub fn instances_rect(&self, id: NodeId, bucket: Bucket<'_>, rect: Rect) -> Vec<NodeId> {
        self.neighbours(id, bucket)
            .filter(|other| other.bbox().overlaps(&rect))
            .map(Node::id)
            .collect()
    }

    /// Member of `bucket` closest to `point` (`id`'s position when `None`),
    /// excluding `id` itself.
    #[must_use]
    pub fn instance_nearest(&self, id: NodeId, bucket: Bucket<'_>, point: Option<Vec2>) -> Option<NodeId> {
        let node = self.node(id)?;
        let point = point.unwrap_or(node.position);
        let container = self.node(node.container()?)?;
        self.nearest_among(id, container.contents().members(bucket), point)
    }

    /// Closest of `candidates` to `point`, skipping `exclude` and unknown ids.
    /// Ties keep the earliest candidate.
    pub(crate) fn nearest_among<I>(&self, exclude: NodeId, candidates: I, point: Vec2) -> Option<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut best: Option<(NodeId, f32)> = None;
        for candidate in candidates {
            if candidate == exclude {
                continue;
            }
            let Some(other) = self.node(candidate) else {
                continue;
            };
            let distance = other.position.distance(point);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((candidate, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Nearest member of `bucket` among what entity `id` perceives.
    ///
    /// With `include_distant`, an empty result falls back to the whole
    /// container bucket. Nodes without behavior always use the container.
    #[must_use]
    pub fn nearest_in_view(&self, id: NodeId, bucket: Bucket<'_>, include_distant: bool) -> Option<NodeId> {
        let node = self.node(id)?;
        let Some(behavior) = node.behavior() else {
            return self.instance_nearest(id, bucket, None);
        };
        let seen = behavior.perception.in_view().members(bucket);
        self.nearest_among(id, seen, node.position)
            .or_else(|| include_distant.then(|| self.instance_nearest(id, bucket, None)).flatten())
    }

    /// Nearest solid whose top edge is at or below `id`'s bottom edge and
    /// which overlaps it horizontally. Used for shadow placement.
    #[must_use]
    pub fn node_below(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id)?;
        let own = node.bbox();
        let mut best: Option<(NodeId, f32)> = None;
        for other in self.neighbours(id, Bucket::Category(SOLID)) {
            if other.id() == id {
                continue;
            }
            let bbox = other.bbox();
            if bbox.top < own.bottom || bbox.right <= own.left || bbox.left >= own.right {
                continue;
            }
            let gap = bbox.top - own.bottom;
            if best.map_or(true, |(_, g)| gap < g) {
                best = Some((other.id(), gap));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Strict bounding-box overlap between two nodes. Unknown ids never collide.
    #[must_use]
    pub fn collides(&self, a: NodeId, b: NodeId) -> bool {
        match (self.node(a), self.node(b)) {
            (Some(a), Some(b)) => a.collides(b),
            _ => false,
        }
    }
}
