//! # Gloam Sprites
//!
//! Sprite catalog for gloam worlds.
//!
//! The catalog maps a sprite name to a [`SpriteSheet`], and each sheet maps an
//! animation name to an [`AnimationSpec`] describing frame count, playback
//! speed, looping, pixel dimensions and edge offsets. Every sheet carries a
//! `"default"` animation; lookups for unknown animations fall back to it.
//!
//! Asset decoding is not part of this crate. Geometry arrives as data, usually
//! JSON produced by the asset pipeline.
//!
//! ## Quick Start
//!
//! ```
//! use gloam_sprites::{AnimationSpec, SpriteCatalog, SpriteSheet};
//!
//! let mut catalog = SpriteCatalog::new();
//! catalog.insert(
//!     "goblin01",
//!     SpriteSheet::new(AnimationSpec::still(64.0, 64.0))
//!         .with_animation("walk", AnimationSpec::looping(8, 0.5, 64.0, 64.0)),
//! );
//!
//! let walk = catalog.animation("goblin01", "walk").unwrap();
//! assert_eq!(walk.frame_count, 8);
//!
//! // Unknown animations resolve to the default one.
//! let missing = catalog.animation("goblin01", "backflip").unwrap();
//! assert_eq!(missing.frame_count, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod catalog;

pub use animation::{AnimationSpec, EdgeOffsets};
pub use catalog::{CatalogError, SpriteCatalog, SpriteSheet, DEFAULT_ANIMATION};
