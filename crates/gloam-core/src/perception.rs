//! Perception: each entity's visible-neighbour set and its per-tick deltas.
//!
//! An entity refreshes its in-view snapshot on a staggered countdown seeded
//! from its id, so a population does not rescan on the same tick. A refresh
//! scans the container's `visible` bucket for nodes strictly within the
//! perception radius (excluding the entity itself), builds a fresh
//! [`CategoryIndex`] and diffs it against the previous one.
//!
//! `added` and `removed` describe only what changed on the current tick: they
//! are emptied at the start of every tick, refresh or not.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::index::{Bucket, CategoryIndex};
use crate::node::NodeId;
use crate::world::World;

/// Category scanned for perception.
pub const VISIBLE: &str = "visible";

/// One entity's view of its surroundings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Perception {
    in_view: CategoryIndex,
    added: BTreeSet<NodeId>,
    removed: BTreeSet<NodeId>,
    refresh_in: u32,
}

/// Summary of one refresh, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptionDelta {
    /// Nodes that came into view
    pub added: usize,
    /// Nodes that left view
    pub removed: usize,
    /// Nodes now in view
    pub visible: usize,
}

impl Perception {
    /// Empty perception with the first refresh `id % interval` ticks away.
    #[must_use]
    pub fn new(id: NodeId, interval: u32) -> Self {
        let interval = u64::from(interval.max(1));
        Self {
            refresh_in: u32::try_from(id.as_u64() % interval).unwrap_or(0),
            ..Self::default()
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn in_view(&self) -> &CategoryIndex {
        &self.in_view
    }

    /// Nodes that came into view this tick.
    #[must_use]
    pub fn added(&self) -> &BTreeSet<NodeId> {
        &self.added
    }

    /// Nodes that left view this tick.
    #[must_use]
    pub fn removed(&self) -> &BTreeSet<NodeId> {
        &self.removed
    }

    /// Whether anything entered or left view this tick.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Ticks until the next refresh.
    #[must_use]
    pub const fn refresh_in(&self) -> u32 {
        self.refresh_in
    }

    /// Clears last tick's deltas.
    pub fn begin_tick(&mut self) {
        self.added.clear();
        self.removed.clear();
    }

    /// Counts down; returns `true` (and rearms to `interval`) when a refresh is due.
    pub fn countdown(&mut self, interval: u32) -> bool {
        self.refresh_in = self.refresh_in.saturating_sub(1);
        if self.refresh_in == 0 {
            self.refresh_in = interval.max(1);
            true
        } else {
            false
        }
    }

    /// Replaces the snapshot and records the difference.
    pub fn replace(&mut self, fresh: CategoryIndex) -> PerceptionDelta {
        self.added = fresh.all().difference(self.in_view.all()).copied().collect();
        self.removed = self.in_view.all().difference(fresh.all()).copied().collect();
        self.in_view = fresh;
        PerceptionDelta {
            added: self.added.len(),
            removed: self.removed.len(),
            visible: self.in_view.len(),
        }
    }
}

impl World {
    /// Builds a fresh in-view snapshot for `id`: members of its container's
    /// `visible` bucket strictly closer than `radius`, excluding `id`.
    ///
    /// Returns `None` when the node is missing or detached.
    #[must_use]
    pub fn scan_visible(&self, id: NodeId, radius: f32) -> Option<CategoryIndex> {
        let node = self.node(id)?;
        let container = self.node(node.container()?)?;
        let mut snapshot = CategoryIndex::new();
        for other in container.contents().members(Bucket::Category(VISIBLE)) {
            if other == id {
                continue;
            }
            let Some(seen) = self.node(other) else {
                continue;
            };
            if node.distance_to(seen.position) < radius {
                snapshot.insert(other, seen.categories());
            }
        }
        Some(snapshot)
    }
}
