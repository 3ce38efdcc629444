//! Goals: stateless strategies that pick an entity's next action.
//!
//! A [`Goal`] is a plain value. [`Goal::decide`] reads the acting entity
//! through a [`DecisionContext`] and returns a [`Decision`]; any state
//! change a goal implies (such as revival) is carried out by the engine, so
//! one goal value can be shared by any number of entities.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::behavior::action::ActionKind;
use crate::behavior::input::{Keys, Swipes};
use crate::behavior::Behavior;
use crate::node::{Facing, Node};
use crate::world::World;

/// How a dead entity comes back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Revival {
    /// When its controller presses [`Keys::REVIVE`]
    OnInput,
    /// With probability `numerator / denominator` each tick
    Chance {
        /// Favourable outcomes
        numerator: u32,
        /// Total outcomes
        denominator: u32,
    },
    /// Stays dead
    #[default]
    Never,
}

/// A strategy for choosing actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    /// Follow the controller's input
    PlayerInput,
    /// Stand still
    Idle,
    /// Idle with the occasional step in a random direction
    Wander,
    /// Chase and attack the nearest living thing with brains in view
    Hunt,
    /// Terminal goal while health is exhausted
    Dead(Revival),
}

/// What a goal wants the engine to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Start this action
    Act(ActionKind),
    /// No action this tick; ask again next tick
    Wait,
    /// Restore the entity, then start this action
    Revive(ActionKind),
}

/// Read-only view of the acting entity, plus the world's random stream.
pub struct DecisionContext<'a> {
    /// The world, for queries
    pub world: &'a World,
    /// The acting node
    pub node: &'a Node,
    /// The acting node's behavior
    pub behavior: &'a Behavior,
    /// Deterministic random stream
    pub rng: &'a mut ChaCha8Rng,
}

impl Goal {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PlayerInput => "PlayerInput",
            Self::Idle => "Idle",
            Self::Wander => "Wander",
            Self::Hunt => "Hunt",
            Self::Dead(_) => "Dead",
        }
    }

    /// Whether this is the terminal dead goal.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        matches!(self, Self::Dead(_))
    }

    /// Picks the next action.
    pub fn decide(self, ctx: &mut DecisionContext<'_>) -> Decision {
        match self {
            Self::PlayerInput => player_input(ctx),
            Self::Idle => Decision::Act(ActionKind::Idle),
            Self::Wander => wander(ctx),
            Self::Hunt => hunt(ctx),
            Self::Dead(revival) => dead(ctx, revival),
        }
    }
}

/// Desktop keys take precedence over touch gestures.
fn player_input(ctx: &DecisionContext<'_>) -> Decision {
    let Some(controller) = ctx.behavior.controller.as_ref() else {
        return Decision::Wait;
    };
    let inputs = &controller.inputs;

    if inputs.pressed.contains(Keys::ATTACK) {
        return Decision::Act(ActionKind::Attack {
            dir: ctx.node.facing,
            target: None,
            tempo: 1.0,
        });
    }
    if inputs.pressed.contains(Keys::JUMP) {
        return Decision::Act(ActionKind::Jump { dir: None });
    }
    if inputs.held.contains(Keys::LEFT) {
        return Decision::Act(ActionKind::Walk { dir: Facing::Left });
    }
    if inputs.held.contains(Keys::RIGHT) {
        return Decision::Act(ActionKind::Walk { dir: Facing::Right });
    }

    let swipe_attack = |dir| {
        Decision::Act(ActionKind::Attack {
            dir,
            target: None,
            tempo: 1.0,
        })
    };
    if inputs.swipes.contains(Swipes::RIGHT) {
        return swipe_attack(Facing::Right);
    }
    if inputs.swipes.contains(Swipes::LEFT) {
        return swipe_attack(Facing::Left);
    }
    if inputs.swipes.contains(Swipes::UP) {
        return Decision::Act(ActionKind::Jump { dir: None });
    }
    if let Some(touch) = inputs.touches.first() {
        let x = controller.camera.to_world(*touch).x;
        let here = ctx.node.position.x;
        if x > here {
            return Decision::Act(ActionKind::Walk { dir: Facing::Right });
        }
        if x < here {
            return Decision::Act(ActionKind::Walk { dir: Facing::Left });
        }
    }

    Decision::Act(ActionKind::Idle)
}

fn wander(ctx: &mut DecisionContext<'_>) -> Decision {
    match ctx.rng.gen_range(0..8) {
        0 => Decision::Act(ActionKind::Walk { dir: Facing::Left }),
        1 => Decision::Act(ActionKind::Walk { dir: Facing::Right }),
        _ => Decision::Act(ActionKind::Idle),
    }
}

fn hunt(ctx: &mut DecisionContext<'_>) -> Decision {
    let world = ctx.world;
    let me = ctx.node;
    let behavior = ctx.behavior;
    let prey = behavior
        .perception
        .in_view()
        .members("hasbrains".into())
        .filter(|id| world.node(*id).is_some_and(|n| n.has_category("alive")));
    let target = world
        .nearest_among(me.id(), prey, me.position)
        .and_then(|id| world.node(id));

    match target {
        Some(target) => {
            let dir = Facing::towards(me.position.x, target.position.x);
            if me.collides(target) {
                Decision::Act(ActionKind::Attack {
                    dir,
                    target: Some(target.id()),
                    tempo: 1.0,
                })
            } else {
                Decision::Act(ActionKind::Walk { dir })
            }
        }
        None => wander(ctx),
    }
}

fn dead(ctx: &mut DecisionContext<'_>, revival: Revival) -> Decision {
    let revived = match revival {
        Revival::OnInput => ctx
            .behavior
            .controller
            .as_ref()
            .is_some_and(|c| c.inputs.pressed.contains(Keys::REVIVE)),
        Revival::Chance {
            numerator,
            denominator,
        } => denominator > 0 && numerator <= denominator && ctx.rng.gen_ratio(numerator, denominator),
        Revival::Never => false,
    };
    if revived {
        Decision::Revive(ActionKind::Idle)
    } else {
        Decision::Act(ActionKind::Die)
    }
}
