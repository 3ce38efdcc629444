//! Sprite sheets and the catalog that names them.
//!
//! A [`SpriteSheet`] always has a [`DEFAULT_ANIMATION`]. The invariant is held
//! by construction ([`SpriteSheet::new`] takes the default) and checked when a
//! catalog is parsed from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::AnimationSpec;

/// Name of the fallback animation every sheet carries.
pub const DEFAULT_ANIMATION: &str = "default";

/// Errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog document is not valid JSON or has the wrong shape
    #[error("sprite catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A sheet was declared without a default animation
    #[error("sprite '{0}' has no default animation")]
    MissingDefault(String),
}

/// All animations of one sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpriteSheet {
    animations: BTreeMap<String, AnimationSpec>,
}

impl SpriteSheet {
    /// Create a sheet holding only its default animation.
    #[must_use]
    pub fn new(default: AnimationSpec) -> Self {
        let mut animations = BTreeMap::new();
        animations.insert(DEFAULT_ANIMATION.to_string(), default);
        Self { animations }
    }

    /// Builder: add a named animation.
    #[must_use]
    pub fn with_animation(mut self, name: impl Into<String>, spec: AnimationSpec) -> Self {
        self.animations.insert(name.into(), spec);
        self
    }

    /// The default animation.
    ///
    /// # Panics
    ///
    /// Never: every sheet is built with a default.
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn default_animation(&self) -> &AnimationSpec {
        &self.animations[DEFAULT_ANIMATION]
    }

    /// Look up an animation, falling back to the default.
    #[must_use]
    pub fn animation(&self, name: &str) -> &AnimationSpec {
        self.animations
            .get(name)
            .unwrap_or_else(|| self.default_animation())
    }

    /// Whether the sheet has an animation under exactly this name.
    #[must_use]
    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    /// Animation names in ascending order.
    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }
}

/// Named sprite sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpriteCatalog {
    sheets: BTreeMap<String, SpriteSheet>,
}

impl SpriteCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from JSON of the form
    /// `{ "<sprite>": { "<animation>": AnimationSpec, ... }, ... }`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed input and
    /// [`CatalogError::MissingDefault`] for a sheet without a default.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        if let Some(name) = catalog
            .sheets
            .iter()
            .find(|(_, sheet)| !sheet.has_animation(DEFAULT_ANIMATION))
            .map(|(name, _)| name.clone())
        {
            return Err(CatalogError::MissingDefault(name));
        }
        tracing::debug!(sheets = catalog.len(), "sprite catalog loaded");
        Ok(catalog)
    }

    /// Add or replace a sheet.
    pub fn insert(&mut self, name: impl Into<String>, sheet: SpriteSheet) {
        self.sheets.insert(name.into(), sheet);
    }

    /// Look up a sheet.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SpriteSheet> {
        self.sheets.get(name)
    }

    /// Whether a sheet is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    /// Look up one animation of a sheet (with default fallback).
    ///
    /// Returns `None` only when the sheet itself is unknown.
    #[must_use]
    pub fn animation(&self, sheet: &str, animation: &str) -> Option<&AnimationSpec> {
        self.get(sheet).map(|s| s.animation(animation))
    }

    /// Number of sheets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
