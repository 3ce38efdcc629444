//! Behavior capability and the per-tick decision engine.
//!
//! A node becomes an entity when a [`Behavior`] is attached to it. The engine
//! runs once per tick for every entity, after the node's timers and physics:
//!
//! 1. **Perceive**: clear last tick's deltas, refresh the in-view snapshot
//!    when the staggered countdown expires.
//! 2. **Interrupt**: if anything entered or left view, drop the override goal.
//! 3. **Death**: at zero health, drop action and goal and switch the base goal
//!    to [`Goal::Dead`] with the entity's revival policy.
//! 4. **Decide**: when there is no action or it has run its course, take the
//!    override goal (or the base goal) and ask it for the next action.
//! 5. **Act**: apply the action's effect, pick its animation, advance progress.
//! 6. **Upkeep**: for controlled entities, track activatables, bubbles, the
//!    camera, and clear one-shot input events.
//!
//! The engine holds the behavior outside the node while it runs, so queries
//! against the world and mutations of other nodes never alias it.

pub mod action;
pub mod goal;
pub mod input;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::EntityPreset;
use crate::index::Bucket;
use crate::node::{Bubble, NodeId};
use crate::observer::Camera;
use crate::perception::Perception;
use crate::world::World;

pub use action::{Action, ActionKind};
pub use goal::{Decision, DecisionContext, Goal, Revival};
pub use input::{InputState, Keys, Swipes};

/// Category an entity carries while alive.
pub const ALIVE: &str = "alive";
/// Category an entity carries while dead.
pub const DEAD: &str = "dead";
/// Category of nodes a player can interact with.
pub const ACTIVATABLE: &str = "activatable";

/// Numeric attributes of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    /// Current health; the entity dies at zero or below
    pub health: f32,
    /// Health restored on revival
    pub max_health: f32,
    /// Attack power
    pub strength: f32,
    /// Horizontal speed cap for walking
    pub speed: f32,
    /// Horizontal acceleration per walking tick
    pub accel: f32,
    /// Upward impulse of a grounded jump
    pub jump: f32,
    /// Perception radius
    pub perception: f32,
    /// Camera stays put while set
    pub godmode: bool,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            strength: 10.0,
            speed: 8.0,
            accel: 1.0,
            jump: 10.0,
            perception: 400.0,
            godmode: false,
        }
    }
}

/// Input and camera of an observer-controlled entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controller {
    /// Decoded input
    pub inputs: InputState,
    /// Observer view
    pub camera: Camera,
}

/// Goal/action state, stats and perception of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Behavior {
    /// Action being executed
    pub action: Option<Action>,
    /// Fallback goal; [`Goal::Dead`] while dead
    pub base_goal: Goal,
    /// Override goal, cleared on interruption
    pub goal: Option<Goal>,
    /// Base goal restored on revival
    pub intrinsic_goal: Goal,
    /// Revival policy handed to [`Goal::Dead`]
    pub revival: Revival,
    /// Numeric attributes
    pub stats: Stats,
    /// Visible neighbours and their deltas
    pub perception: Perception,
    /// Opaque memories
    pub memory: Vec<serde_json::Value>,
    /// Present for observer-controlled entities
    pub controller: Option<Controller>,
    /// Activatable node overlapped after the last tick
    pub over_activatable: Option<NodeId>,
}

impl Behavior {
    /// Creates an idle behavior for entity `id`.
    #[must_use]
    pub fn new(id: NodeId, base_goal: Goal, stats: Stats, refresh_interval: u32) -> Self {
        Self {
            action: None,
            base_goal,
            goal: None,
            intrinsic_goal: base_goal,
            revival: Revival::Never,
            stats,
            perception: Perception::new(id, refresh_interval),
            memory: Vec::new(),
            controller: None,
            over_activatable: None,
        }
    }

    /// Creates a behavior from an entity preset.
    #[must_use]
    pub fn from_preset(
        id: NodeId,
        preset: &EntityPreset,
        defaults: &Stats,
        refresh_interval: u32,
    ) -> Self {
        let mut behavior = Self::new(id, preset.base_goal, preset.stats(defaults), refresh_interval);
        behavior.revival = preset.revival;
        if preset.controlled {
            behavior.controller = Some(Controller::default());
        }
        behavior
    }

    /// Builder: set the revival policy.
    #[must_use]
    pub fn with_revival(mut self, revival: Revival) -> Self {
        self.revival = revival;
        self
    }

    /// Builder: attach a controller.
    #[must_use]
    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Whether the entity is currently dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.base_goal.is_dead()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Runs one tick of behavior for entity `id`. Nodes without behavior are skipped.
pub(crate) fn run(world: &mut World, rng: &mut ChaCha8Rng, id: NodeId) {
    let Some(mut behavior) = world.node_mut(id).and_then(|n| n.behavior.take()) else {
        return;
    };

    perceive(world, id, &mut behavior);

    if behavior.perception.changed() {
        behavior.goal = None;
    }

    if behavior.stats.health <= 0.0 {
        die(world, id, &mut behavior);
    }

    decide(world, rng, id, &mut behavior);

    if let Some(mut action) = behavior.action.take() {
        action.apply(world, id, &mut behavior.stats);
        action.animate(world, id, &behavior.stats);
        action.advance();
        behavior.action = Some(action);
    }

    if behavior.controller.is_some() {
        upkeep(world, id, &mut behavior);
    }

    if let Some(node) = world.node_mut(id) {
        node.behavior = Some(behavior);
    }
}

fn perceive(world: &World, id: NodeId, behavior: &mut Behavior) {
    behavior.perception.begin_tick();
    let interval = world.config().in_view_update_delay;
    if !behavior.perception.countdown(interval) {
        return;
    }
    if let Some(fresh) = world.scan_visible(id, behavior.stats.perception) {
        let delta = behavior.perception.replace(fresh);
        trace!(
            %id,
            added = delta.added,
            removed = delta.removed,
            visible = delta.visible,
            "perception refreshed"
        );
    }
}

fn die(world: &mut World, id: NodeId, behavior: &mut Behavior) {
    behavior.action = None;
    behavior.goal = None;
    if behavior.base_goal.is_dead() {
        return;
    }
    behavior.base_goal = Goal::Dead(behavior.revival);
    world.swap_category(id, ALIVE, DEAD);
    debug!(%id, "entity died");
}

fn revive(world: &mut World, id: NodeId, behavior: &mut Behavior) {
    behavior.stats.health = behavior.stats.max_health;
    behavior.base_goal = behavior.intrinsic_goal;
    behavior.goal = None;
    world.swap_category(id, DEAD, ALIVE);
    debug!(%id, goal = behavior.base_goal.label(), "entity revived");
}

fn decide(world: &mut World, rng: &mut ChaCha8Rng, id: NodeId, behavior: &mut Behavior) {
    let needs_action = match &behavior.action {
        Some(action) => action.is_complete(),
        None => true,
    };
    if !needs_action {
        return;
    }

    let goal = behavior.goal.unwrap_or(behavior.base_goal);
    behavior.goal = Some(goal);

    let decision = {
        let Some(node) = world.node(id) else {
            return;
        };
        let mut ctx = DecisionContext {
            world: &*world,
            node,
            behavior: &*behavior,
            rng: &mut *rng,
        };
        goal.decide(&mut ctx)
    };

    behavior.action = match decision {
        Decision::Act(kind) => Some(world.new_action(kind)),
        Decision::Wait => None,
        Decision::Revive(kind) => {
            revive(world, id, behavior);
            Some(world.new_action(kind))
        }
    };
    trace!(
        %id,
        goal = goal.label(),
        action = behavior.action.as_ref().map_or("none", Action::label),
        "action selected"
    );
}

/// Player-side bookkeeping after the action ran.
fn upkeep(world: &mut World, id: NodeId, behavior: &mut Behavior) {
    let over = world.instance_place(id, Bucket::Category(ACTIVATABLE), None);
    behavior.over_activatable = over;

    let message_ticks = world.config().message_bubble_ticks;
    let star_ticks = world.config().activatable_bubble_ticks;
    let bounds = world.container_size(id);

    let Some(controller) = behavior.controller.as_mut() else {
        return;
    };
    let Some(node) = world.node_mut(id) else {
        return;
    };

    if node.bubble.is_none() {
        if let Some(message) = controller.inputs.message.take() {
            node.bubble = Some(Bubble::message(message, message_ticks));
        } else if over.is_some() {
            node.bubble = Some(Bubble::star(star_ticks));
        }
    }

    if !controller.camera.unrestricted && !behavior.stats.godmode {
        controller.camera.follow(node.position);
    }
    if let Some(bounds) = bounds {
        controller.camera.clamp(bounds);
    }

    controller.inputs.clear_events();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_jump_is_ten() {
        assert!((Stats::default().jump - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn new_behavior_remembers_intrinsic_goal() {
        let b = Behavior::new(NodeId::new(3), Goal::Hunt, Stats::default(), 30);
        assert_eq!(b.intrinsic_goal, Goal::Hunt);
        assert!(b.goal.is_none());
        assert!(b.action.is_none());
        assert_eq!(b.perception.refresh_in(), 3);
    }

    #[test]
    fn controlled_preset_gets_controller() {
        let preset = EntityPreset {
            controlled: true,
            revival: Revival::OnInput,
            ..EntityPreset::default()
        };
        let b = Behavior::from_preset(NodeId::new(1), &preset, &Stats::default(), 30);
        assert!(b.controller.is_some());
        assert_eq!(b.revival, Revival::OnInput);
    }

    #[test]
    fn stats_deserialize_with_defaults() {
        let stats: Stats = serde_json::from_str(r#"{"health": 5}"#).unwrap();
        assert!((stats.health - 5.0).abs() < f32::EPSILON);
        assert!((stats.jump - 10.0).abs() < f32::EPSILON);
    }
}
