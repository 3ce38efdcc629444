//! Observer input as the behavior engine sees it.
//!
//! Device capture happens elsewhere; this is the already-decoded state a
//! player-controlled entity reads each tick. Held keys persist until
//! released, pressed keys and swipes are one-shot events cleared at the end
//! of the entity's tick.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Desktop controls.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Keys: u8 {
        /// Walk left
        const LEFT   = 0b0000_0001;
        /// Walk right
        const RIGHT  = 0b0000_0010;
        /// Attack in the facing direction
        const ATTACK = 0b0000_0100;
        /// Jump
        const JUMP   = 0b0000_1000;
        /// Come back from the dead
        const REVIVE = 0b0001_0000;
    }
}

bitflags! {
    /// Touch swipe gestures.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Swipes: u8 {
        /// Swipe towards negative x
        const LEFT  = 0b0001;
        /// Swipe towards positive x
        const RIGHT = 0b0010;
        /// Swipe up
        const UP    = 0b0100;
        /// Swipe down
        const DOWN  = 0b1000;
    }
}

/// Input state for one controlled entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    /// Keys currently held
    pub held: Keys,
    /// Keys pressed since the last tick
    pub pressed: Keys,
    /// Swipes since the last tick
    pub swipes: Swipes,
    /// Active touch points in screen coordinates
    pub touches: Vec<Vec2>,
    /// Chat message waiting to be shown
    pub message: Option<String>,
}

impl InputState {
    /// Drops one-shot events.
    pub fn clear_events(&mut self) {
        self.pressed = Keys::empty();
        self.swipes = Swipes::empty();
    }
}
