//! Per-node sprite playback state.

use gloam_sprites::{AnimationSpec, SpriteSheet, DEFAULT_ANIMATION};
use serde::{Deserialize, Serialize};

/// How a sprite is laid out when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tiling {
    /// Repeat horizontally
    pub tile_x: bool,
    /// Repeat vertically
    pub tile_y: bool,
    /// Parallax factor
    pub scroll_speed: f32,
}

impl Default for Tiling {
    fn default() -> Self {
        Self {
            tile_x: false,
            tile_y: false,
            scroll_speed: 1.0,
        }
    }
}

/// Which animation a node shows and how far into it playback is.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteState {
    /// Sheet name in the catalog
    pub name: String,
    /// Current animation (always present in the sheet)
    pub animation: String,
    /// Fractional frame position
    pub frame: f32,
    /// Frames in the current animation
    pub frame_count: u32,
    /// Frames advanced per tick
    pub frame_speed: f32,
    /// Restart after the last frame
    pub looping: bool,
    /// Layout hints
    pub tiling: Tiling,
}

impl SpriteState {
    /// Starts the sheet's default animation at frame 0.
    #[must_use]
    pub fn new(name: impl Into<String>, sheet: &SpriteSheet, tiling: Tiling) -> Self {
        let spec = sheet.default_animation();
        Self {
            name: name.into(),
            animation: DEFAULT_ANIMATION.to_string(),
            frame: 0.0,
            frame_count: spec.frame_count,
            frame_speed: spec.frame_speed,
            looping: spec.looping,
            tiling,
        }
    }

    /// Selects an animation, falling back to the default for unknown names.
    ///
    /// The playback rate is always updated (`frame_speed` when given and
    /// non-zero, otherwise the animation's own rate). Frame position is kept
    /// when the resolved animation is already playing. Returns whether the
    /// animation changed.
    pub fn select(&mut self, sheet: &SpriteSheet, animation: &str, frame_speed: Option<f32>) -> bool {
        let name = if sheet.has_animation(animation) {
            animation
        } else {
            DEFAULT_ANIMATION
        };
        let spec = sheet.animation(name);
        self.frame_speed = frame_speed
            .filter(|speed| speed.abs() > f32::EPSILON)
            .unwrap_or(spec.frame_speed);
        if self.animation == name {
            return false;
        }
        self.animation = name.to_string();
        self.frame = 0.0;
        self.frame_count = spec.frame_count;
        self.looping = spec.looping;
        true
    }

    /// Advances playback by one tick.
    pub fn advance(&mut self) {
        if self.frame_speed <= 0.0 {
            return;
        }
        self.frame += self.frame_speed;
        #[allow(clippy::cast_precision_loss)]
        let count = self.frame_count as f32;
        if self.frame >= count {
            self.frame = if self.looping { 0.0 } else { (count - 1.0).max(0.0) };
        }
    }

    /// Geometry of the current animation.
    #[must_use]
    pub fn spec<'a>(&self, sheet: &'a SpriteSheet) -> &'a AnimationSpec {
        sheet.animation(&self.animation)
    }

    /// Whole frame index for drawing.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frame_index(&self) -> u32 {
        self.frame.floor().max(0.0) as u32
    }
}
