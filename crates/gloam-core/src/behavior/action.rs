//! Actions: timed units of behavior.
//!
//! An [`Action`] is created fresh each time a goal picks one and runs for
//! `speed` ticks. Each tick the engine calls [`Action::apply`] for the effect,
//! then [`Action::animate`] to pick the sprite animation, then advances
//! `progress`. Once `progress >= speed` the goal is asked again.
//!
//! | Kind | Ticks | Effect |
//! |------|-------|--------|
//! | `Idle` | 0 | none |
//! | `Move` | 1 | accelerate towards the speed cap |
//! | `Walk` | 1 | face, then accelerate |
//! | `Jump` | 5 | impulse up when grounded, optional sideways nudge |
//! | `Attack` | 30 × tempo | recoil, then strike whatever is in front |
//! | `Flinch` | 12 | knockback and damage on the first tick |
//! | `Die` | 1 | none |

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::behavior::Stats;
use crate::index::Bucket;
use crate::node::{Facing, Node, NodeId};
use crate::world::{Strike, World};

/// Base duration of an attack at tempo 1.
pub const ATTACK_TICKS: u32 = 30;
/// Duration of the knockback reaction.
pub const FLINCH_TICKS: u32 = 12;
/// Duration of a jump.
pub const JUMP_TICKS: u32 = 5;

/// What an action does, with the parameters it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Do nothing; completes immediately
    Idle,
    /// Accelerate without turning
    Move {
        /// Direction of acceleration
        dir: Facing,
    },
    /// Turn and accelerate
    Walk {
        /// Direction to walk
        dir: Facing,
    },
    /// Leave the ground
    Jump {
        /// Optional sideways nudge
        dir: Option<Facing>,
    },
    /// Recoil and strike
    Attack {
        /// Direction of the swing
        dir: Facing,
        /// Explicit target; otherwise whatever is physical in front
        target: Option<NodeId>,
        /// Duration multiplier
        tempo: f32,
    },
    /// Knockback reaction to a strike
    Flinch {
        /// Direction the blow came from
        dir: Facing,
        /// Attacker strength
        strength: f32,
    },
    /// Shown every tick while dead
    Die,
}

impl ActionKind {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Move { .. } => "Move",
            Self::Walk { .. } => "Walk",
            Self::Jump { .. } => "Jump",
            Self::Attack { .. } => "Attack",
            Self::Flinch { .. } => "Flinch",
            Self::Die => "Die",
        }
    }

    /// Duration in ticks.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn speed(&self) -> u32 {
        match self {
            Self::Idle => 0,
            Self::Move { .. } | Self::Walk { .. } | Self::Die => 1,
            Self::Jump { .. } => JUMP_TICKS,
            Self::Attack { tempo, .. } => {
                let ticks = f64::from(ATTACK_TICKS) * f64::from(tempo.max(0.0));
                ticks.round() as u32
            }
            Self::Flinch { .. } => FLINCH_TICKS,
        }
    }
}

/// One activation of an [`ActionKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    id: u64,
    kind: ActionKind,
    progress: u32,
    speed: u32,
}

impl Action {
    /// Creates an action at progress 0.
    #[must_use]
    pub fn new(id: u64, kind: ActionKind) -> Self {
        Self {
            id,
            kind,
            progress: 0,
            speed: kind.speed(),
        }
    }

    /// Per-world unique id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Kind and parameters.
    #[must_use]
    pub const fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Label of the kind.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// Ticks already run.
    #[must_use]
    pub const fn progress(&self) -> u32 {
        self.progress
    }

    /// Duration in ticks.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Whether the goal should be asked for a new action.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.progress >= self.speed
    }

    pub(crate) fn advance(&mut self) {
        self.progress += 1;
    }

    /// Applies one tick of effect to entity `id`.
    pub(crate) fn apply(&self, world: &mut World, id: NodeId, stats: &mut Stats) {
        match self.kind {
            ActionKind::Idle | ActionKind::Die => {}
            ActionKind::Move { dir } => {
                if let Some(node) = world.node_mut(id) {
                    accelerate(node, stats, dir);
                }
            }
            ActionKind::Walk { dir } => {
                if let Some(node) = world.node_mut(id) {
                    node.facing = dir;
                    accelerate(node, stats, dir);
                }
            }
            ActionKind::Jump { dir } => {
                if let Some(node) = world.node_mut(id) {
                    if let Some(dir) = dir {
                        if node.velocity.x.abs() < stats.speed {
                            node.velocity.x +=
                                (stats.accel + node.linear_dampening) * dir.sign() * 0.75;
                        }
                    }
                    node.velocity.y -= if node.on_solid {
                        stats.jump
                    } else {
                        node.gravity * 0.5
                    };
                }
            }
            ActionKind::Attack { dir, target, .. } => self.attack(world, id, stats, dir, target),
            ActionKind::Flinch { dir, strength } => {
                if self.progress > 0 {
                    return;
                }
                if let Some(node) = world.node_mut(id) {
                    node.facing = dir.flip();
                    node.velocity.x += dir.sign() * strength * 0.2;
                    node.velocity.y -= strength * 0.1;
                }
                stats.health -= strength / 5.0;
            }
        }
    }

    fn attack(
        &self,
        world: &mut World,
        id: NodeId,
        stats: &Stats,
        dir: Facing,
        target: Option<NodeId>,
    ) {
        let Some(node) = world.node_mut(id) else {
            return;
        };
        if self.progress == 0 {
            node.facing = dir;
            let push = stats.strength / node.size.x.max(1.0);
            node.velocity.x += push * dir.sign() * 5.0;
            node.velocity.y -= push * 15.0;
        }
        let reach = node.position + Vec2::new(node.size.x * 0.5 * dir.sign(), 0.0);

        let hit = match target {
            Some(target) => world.collides(id, target).then_some(target),
            None => world.instance_place(id, Bucket::Category("physical"), Some(reach)),
        };
        if let Some(hit) = hit {
            world.strike(
                hit,
                Strike {
                    from: id,
                    dir,
                    strength: stats.strength,
                    immunity: self.speed,
                },
            );
        }
    }

    /// Selects the sprite animation for this action.
    pub(crate) fn animate(&self, world: &mut World, id: NodeId, stats: &Stats) {
        match self.kind {
            ActionKind::Idle => world.select_animation(id, "idle", None),
            ActionKind::Move { .. } => {}
            ActionKind::Walk { .. } => {
                let Some(node) = world.node(id) else {
                    return;
                };
                #[allow(clippy::float_cmp)]
                let airborne = node.velocity.y != 0.0;
                if airborne {
                    world.select_animation(id, "jump", None);
                } else {
                    let pace = if stats.speed > 0.0 {
                        node.velocity.x.abs() / stats.speed
                    } else {
                        0.0
                    };
                    let rate = world
                        .animation_spec(id, "walk")
                        .map_or(0.0, |spec| spec.frame_speed * pace);
                    world.select_animation(id, "walk", Some(rate));
                }
            }
            ActionKind::Jump { .. } => world.select_animation(id, "jump", None),
            ActionKind::Attack { .. } => {
                world.select_animation(id, "attack", None);
                if let Some(sprite) = world.sprite_mut(id) {
                    if sprite.animation == "attack" && self.speed > 0 {
                        #[allow(clippy::cast_precision_loss)]
                        let rate = sprite.frame_count as f32 / self.speed as f32;
                        sprite.frame_speed = rate;
                    }
                }
            }
            ActionKind::Flinch { .. } => world.select_animation(id, "flinch", None),
            ActionKind::Die => world.select_animation(id, "die", None),
        }
    }
}

/// Adds `accel` towards `dir` unless already at the speed cap in that direction.
fn accelerate(node: &mut Node, stats: &Stats, dir: Facing) {
    let under_cap = match dir {
        Facing::Right => node.velocity.x < stats.speed,
        Facing::Left => node.velocity.x > -stats.speed,
    };
    if under_cap {
        node.velocity.x += dir.sign() * stats.accel;
    }
}
