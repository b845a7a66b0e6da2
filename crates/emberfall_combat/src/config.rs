//! Combat configuration
//!
//! Presets в коде (как `WeaponStats::melee_sword()`), либо RON текст от
//! asset/editor слоя. Конфиг иммутабелен после загрузки; валидация при
//! загрузке, дальше combat core ему доверяет.
//!
//! ```ron
//! (
//!     tick_hz: 60.0,
//!     attacks: [
//!         (
//!             name: "light_slash",
//!             triggers: ["attack_primary"],
//!             warmup: 0.15, active: 0.2, recovery: 0.25, cooldown: 0.4,
//!             animation: "slash_light",
//!         ),
//!     ],
//!     durability: { "iron_sword": (
//!         max_durability: 100.0, damage_per_use: 1.0, damage_per_hit: 2.0,
//!         repairable: true, break_behavior: BecomeBroken,
//!     ) },
//! )
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::combat::AttackDefinition;
use crate::error::CombatError;
use crate::item_system::DurabilityConfig;

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Fixed simulation rate (FixedUpdate)
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,
    #[serde(default)]
    pub attacks: Vec<AttackDefinition>,
    /// Durability per item definition id
    #[serde(default)]
    pub durability: BTreeMap<String, DurabilityConfig>,
}

fn default_tick_hz() -> f64 {
    60.0
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            attacks: vec![AttackDefinition::light_slash(), AttackDefinition::heavy_smash()],
            durability: BTreeMap::from([
                ("iron_sword".to_string(), DurabilityConfig::sword()),
                ("crude_club".to_string(), DurabilityConfig::crude_club()),
            ]),
        }
    }
}

impl CombatConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, CombatError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CombatError> {
        if !(self.tick_hz > 0.0) || !self.tick_hz.is_finite() {
            return Err(CombatError::invalid(
                "combat",
                format!("tick_hz must be positive, got {}", self.tick_hz),
            ));
        }

        for (i, attack) in self.attacks.iter().enumerate() {
            attack.validate()?;
            if self.attacks[..i].iter().any(|other| other.name == attack.name) {
                return Err(CombatError::invalid(
                    "combat",
                    format!("duplicate attack name '{}'", attack.name),
                ));
            }
        }

        for config in self.durability.values() {
            config.validate()?;
        }

        Ok(())
    }

    pub fn attack(&self, name: &str) -> Option<&AttackDefinition> {
        self.attacks.iter().find(|attack| attack.name == name)
    }

    /// Durability config of an item definition, `None` for items that never wear.
    pub fn durability_for(&self, item: &str) -> Option<DurabilityConfig> {
        self.durability.get(item).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::AllowedStates;
    use crate::item_system::BreakBehavior;

    const SAMPLE: &str = r#"
(
    tick_hz: 30.0,
    attacks: [
        (
            name: "jab",
            triggers: ["attack_primary", "combo_1"],
            warmup: 0.1, active: 0.1, recovery: 0.0, cooldown: 0.2,
            animation: "jab",
        ),
        (
            name: "air_slam",
            triggers: ["attack_secondary"],
            requires_target_in_range: true,
            warmup: 0.0, active: 0.3, recovery: 0.4, cooldown: 1.0,
            animation: "slam",
            allowed_states: Only(["Jump", "Fall"]),
        ),
    ],
    durability: {
        "bone_knife": (
            max_durability: 12.0, damage_per_use: 0.0, damage_per_hit: 1.0,
            repairable: false, break_behavior: Disappear,
        ),
    },
)
"#;

    #[test]
    fn test_default_config_is_valid() {
        let config = CombatConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.attack("light_slash").is_some());
        assert!(config.durability_for("iron_sword").is_some());
        assert!(config.durability_for("stick").is_none());
    }

    #[test]
    fn test_parse_ron() {
        let config = CombatConfig::from_ron_str(SAMPLE).unwrap();

        assert_eq!(config.tick_hz, 30.0);
        assert_eq!(config.attacks.len(), 2);

        let jab = config.attack("jab").unwrap();
        assert!(jab.has_trigger("combo_1"));
        assert!(!jab.requires_target_in_range);
        assert_eq!(jab.allowed_states, AllowedStates::default());

        let slam = config.attack("air_slam").unwrap();
        assert!(slam.allowed_states.allows("Fall"));
        assert!(!slam.allowed_states.allows("Idle"));

        let knife = config.durability_for("bone_knife").unwrap();
        assert_eq!(knife.break_behavior, BreakBehavior::Disappear);
    }

    #[test]
    fn test_parse_error_reported() {
        let err = CombatConfig::from_ron_str("(tick_hz: )").unwrap_err();
        assert!(matches!(err, CombatError::ConfigParse(_)));
    }

    #[test]
    fn test_negative_duration_rejected_on_load() {
        let text = SAMPLE.replace("cooldown: 0.2", "cooldown: -0.2");
        let err = CombatConfig::from_ron_str(&text).unwrap_err();
        assert!(matches!(err, CombatError::InvalidConfig { .. }));
    }

    #[test]
    fn test_duplicate_attack_rejected() {
        let mut config = CombatConfig::default();
        config.attacks.push(AttackDefinition::light_slash());
        assert!(config.validate().is_err());
    }
}
