//! World configuration.
//!
//! [`WorldConfig`] holds the tunables a world reads at spawn time and during
//! the tick: physics defaults, the perception refresh interval, default
//! entity stats, per-kind presets and camera settings. Every field has a
//! default, so a JSON document only needs to name what it overrides.
//!
//! # Example
//!
//! ```
//! use gloam_core::WorldConfig;
//!
//! let config = WorldConfig::from_json(r#"{"gravity": 0.8, "in_view_update_delay": 10}"#).unwrap();
//! assert!((config.gravity - 0.8).abs() < f32::EPSILON);
//! assert_eq!(config.in_view_update_delay, 10);
//! assert!((config.linear_dampening - 0.5).abs() < f32::EPSILON);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::behavior::{Goal, Revival, Stats};
use crate::error::ConfigError;
use crate::node::NodeKind;

/// Categories every entity kind starts with.
pub const ENTITY_CATEGORIES: [&str; 4] = ["alive", "entity", "physical", "visible"];

/// Tunables for one world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity given to entity kinds
    pub gravity: f32,
    /// Horizontal damping given to every node
    pub linear_dampening: f32,
    /// Ticks between perception refreshes (at least 1)
    pub in_view_update_delay: u32,
    /// Stats every entity starts from before its preset adjusts them
    pub default_entity_stats: Stats,
    /// Per-kind spawn presets. Kinds a document names replace the built-in
    /// preset for that kind; the others keep theirs.
    #[serde(deserialize_with = "merge_presets")]
    pub presets: BTreeMap<NodeKind, KindPreset>,
    /// Camera settings
    pub view: ViewConfig,
    /// Lifetime of a chat bubble
    pub message_bubble_ticks: u32,
    /// Lifetime of the star shown over activatable nodes
    pub activatable_bubble_ticks: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: 1.0,
            linear_dampening: 0.5,
            in_view_update_delay: 30,
            default_entity_stats: Stats::default(),
            presets: default_presets(),
            view: ViewConfig::default(),
            message_bubble_ticks: 180,
            activatable_bubble_ticks: 5,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a config document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed JSON, [`ConfigError::ZeroRefreshInterval`]
    /// when `in_view_update_delay` is 0.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroRefreshInterval`] when `in_view_update_delay` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.in_view_update_delay == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        Ok(())
    }

    /// Preset for `kind`, or an empty one.
    #[must_use]
    pub fn preset(&self, kind: NodeKind) -> KindPreset {
        self.presets.get(&kind).cloned().unwrap_or_default()
    }
}

/// Spawn defaults for one [`NodeKind`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindPreset {
    /// Initial categories
    pub categories: Vec<String>,
    /// Sprite sheet to start with
    pub sprite: Option<String>,
    /// Depth
    pub z: f32,
    /// Behavior capability, for entity kinds
    pub entity: Option<EntityPreset>,
}

/// Behavior defaults for an entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityPreset {
    /// Fallback goal while alive
    pub base_goal: Goal,
    /// How a dead entity of this kind comes back
    pub revival: Revival,
    /// Multiplier on the default perception radius
    pub perception_scale: f32,
    /// Multiplier on the default speed cap
    pub speed_scale: f32,
    /// Strength override
    pub strength: Option<f32>,
    /// Whether the entity takes observer input and owns a camera
    pub controlled: bool,
}

impl Default for EntityPreset {
    fn default() -> Self {
        Self {
            base_goal: Goal::Wander,
            revival: Revival::Never,
            perception_scale: 1.0,
            speed_scale: 1.0,
            strength: None,
            controlled: false,
        }
    }
}

impl EntityPreset {
    /// Default stats adjusted by this preset.
    #[must_use]
    pub fn stats(&self, defaults: &Stats) -> Stats {
        let mut stats = defaults.clone();
        stats.perception *= self.perception_scale;
        stats.speed *= self.speed_scale;
        if let Some(strength) = self.strength {
            stats.strength = strength;
        }
        stats
    }
}

/// Camera settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Horizontal follow margin as a fraction of view width
    pub x_buffer: f32,
    /// Vertical follow margin as a fraction of view height
    pub y_buffer: f32,
    /// World units per screen pixel
    pub scale: f32,
    /// Pan speed
    pub speed: f32,
    /// Screens narrower than this get double scale
    pub narrow_screen_width: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            x_buffer: 0.3,
            y_buffer: 0.3,
            scale: 1.0,
            speed: 10.0,
            narrow_screen_width: 768.0,
        }
    }
}

fn entity_categories(extra: &[&str]) -> Vec<String> {
    ENTITY_CATEGORIES
        .iter()
        .chain(extra)
        .map(|c| (*c).to_string())
        .collect()
}

fn merge_presets<'de, D>(deserializer: D) -> Result<BTreeMap<NodeKind, KindPreset>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<NodeKind, KindPreset>::deserialize(deserializer)?;
    let mut presets = default_presets();
    presets.extend(overrides);
    Ok(presets)
}

fn default_presets() -> BTreeMap<NodeKind, KindPreset> {
    let mut presets = BTreeMap::new();
    presets.insert(
        NodeKind::Landscape,
        KindPreset {
            categories: vec!["landscape".into()],
            ..KindPreset::default()
        },
    );
    presets.insert(
        NodeKind::Tree,
        KindPreset {
            categories: vec!["landscape".into(), "tree".into()],
            sprite: Some("tree02".into()),
            z: 250.0,
            entity: None,
        },
    );
    presets.insert(
        NodeKind::Platform,
        KindPreset {
            categories: vec!["solid".into(), "visible".into()],
            z: 100.0,
            ..KindPreset::default()
        },
    );
    presets.insert(
        NodeKind::Creature,
        KindPreset {
            categories: entity_categories(&[]),
            sprite: None,
            z: 200.0,
            entity: Some(EntityPreset::default()),
        },
    );
    presets.insert(
        NodeKind::Player,
        KindPreset {
            categories: entity_categories(&["hasbrains", "player"]),
            sprite: Some("goblin01".into()),
            z: 200.0,
            entity: Some(EntityPreset {
                base_goal: Goal::PlayerInput,
                revival: Revival::OnInput,
                perception_scale: 4.0,
                strength: Some(50.0),
                controlled: true,
                ..EntityPreset::default()
            }),
        },
    );
    presets.insert(
        NodeKind::Skeleton,
        KindPreset {
            categories: entity_categories(&["undead"]),
            sprite: Some("skeleton".into()),
            z: 200.0,
            entity: Some(EntityPreset {
                base_goal: Goal::Hunt,
                revival: Revival::Chance {
                    numerator: 5,
                    denominator: 2000,
                },
                speed_scale: 0.25,
                ..EntityPreset::default()
            }),
        },
    );
    presets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let err = WorldConfig::from_json(r#"{"in_view_update_delay": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroRefreshInterval));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = WorldConfig::from_json("{gravity: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn player_preset_scales_perception_and_sets_strength() {
        let config = WorldConfig::default();
        let preset = config.preset(NodeKind::Player);
        let stats = preset
            .entity
            .as_ref()
            .map(|e| e.stats(&config.default_entity_stats))
            .unwrap();
        let base = &config.default_entity_stats;
        assert!((stats.perception - base.perception * 4.0).abs() < f32::EPSILON);
        assert!((stats.strength - 50.0).abs() < f32::EPSILON);
        assert!(preset.categories.iter().any(|c| c == "hasbrains"));
    }

    #[test]
    fn skeleton_preset_slows_down() {
        let config = WorldConfig::default();
        let stats = config
            .preset(NodeKind::Skeleton)
            .entity
            .map(|e| e.stats(&config.default_entity_stats))
            .unwrap();
        assert!((stats.speed - config.default_entity_stats.speed * 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_preset_is_empty() {
        let config = WorldConfig::default();
        assert_eq!(config.preset(NodeKind::Universe), KindPreset::default());
    }

    #[test]
    fn partial_presets_keep_the_other_kinds() {
        let config = WorldConfig::from_json(
            r#"{"presets": {"Player": {"categories": ["alive", "visible"], "z": 5.0}}}"#,
        )
        .unwrap();
        let player = config.preset(NodeKind::Player);
        assert!((player.z - 5.0).abs() < f32::EPSILON);
        assert!(player.entity.is_none());

        let defaults = WorldConfig::default();
        for kind in [NodeKind::Skeleton, NodeKind::Tree, NodeKind::Platform, NodeKind::Creature] {
            assert_eq!(config.preset(kind), defaults.preset(kind), "{kind} preset lost");
        }
    }

    #[test]
    fn partial_presets_still_spawn_full_skeletons() {
        let config = WorldConfig::from_json(r#"{"presets": {"Player": {}}}"#).unwrap();
        let mut world = crate::world::World::new(config, crate::tests::helpers::test_catalog());
        let skeleton = world.spawn(NodeKind::Skeleton).unwrap();
        let node = world.node(skeleton).unwrap();
        assert!(node.has_category("undead"));
        assert_eq!(node.behavior().unwrap().base_goal, Goal::Hunt);
    }

    #[test]
    fn presets_survive_json_round_trip() {
        let config = WorldConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(WorldConfig::from_json(&json).unwrap(), config);
    }
}
