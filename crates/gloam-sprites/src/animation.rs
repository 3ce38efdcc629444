//! Animation geometry and timing.

use serde::{Deserialize, Serialize};

/// Transparent margins around the visible body of a frame, in pixels.
///
/// Collision size is the frame size minus these margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeOffsets {
    /// Margin on the left edge
    pub left: f32,
    /// Margin on the right edge
    pub right: f32,
    /// Margin on the top edge
    pub top: f32,
    /// Margin on the bottom edge
    pub bottom: f32,
}

/// One animation of a sprite sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    /// Number of frames in the strip
    pub frame_count: u32,
    /// Frames advanced per tick (fractional values slow playback down)
    pub frame_speed: f32,
    /// Restart at frame 0 after the last frame instead of holding it
    #[serde(rename = "loop", default)]
    pub looping: bool,
    /// Frame width in pixels
    pub width: f32,
    /// Frame height in pixels
    pub height: f32,
    /// Horizontal draw offset, mirrored with facing
    #[serde(default)]
    pub x_offset: f32,
    /// Vertical draw offset
    #[serde(default)]
    pub y_offset: f32,
    /// Transparent margins
    #[serde(default)]
    pub edges: EdgeOffsets,
}

impl AnimationSpec {
    /// A single-frame, non-animated image.
    #[must_use]
    pub fn still(width: f32, height: f32) -> Self {
        Self {
            frame_count: 1,
            frame_speed: 0.0,
            looping: false,
            width,
            height,
            x_offset: 0.0,
            y_offset: 0.0,
            edges: EdgeOffsets::default(),
        }
    }

    /// A looping strip.
    #[must_use]
    pub fn looping(frame_count: u32, frame_speed: f32, width: f32, height: f32) -> Self {
        Self {
            frame_count,
            frame_speed,
            looping: true,
            ..Self::still(width, height)
        }
    }

    /// A strip that holds its last frame once played.
    #[must_use]
    pub fn once(frame_count: u32, frame_speed: f32, width: f32, height: f32) -> Self {
        Self {
            looping: false,
            ..Self::looping(frame_count, frame_speed, width, height)
        }
    }

    /// Set edge margins.
    #[must_use]
    pub fn with_edges(mut self, edges: EdgeOffsets) -> Self {
        self.edges = edges;
        self
    }

    /// Set draw offsets.
    #[must_use]
    pub fn with_offset(mut self, x_offset: f32, y_offset: f32) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }

    /// Collision width: frame width minus the left and right margins.
    #[must_use]
    pub fn body_width(&self) -> f32 {
        self.width - (self.edges.left + self.edges.right)
    }

    /// Collision height: frame height minus the top and bottom margins.
    #[must_use]
    pub fn body_height(&self) -> f32 {
        self.height - (self.edges.top + self.edges.bottom)
    }
}
