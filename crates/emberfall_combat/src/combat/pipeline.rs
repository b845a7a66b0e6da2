//! Damage resolution pipeline
//!
//! Чистая функция: base + упорядоченные contributions → final damage.
//! - Additive: `value += magnitude`
//! - Multiplicative: `value *= magnitude`
//! - Override: `value = magnitude` (всё накопленное до него отбрасывается)
//!
//! Pipeline не клампит результат. Minimum damage: политика hit executor'а.

use serde::{Deserialize, Serialize};

use super::collaborators::{InventoryProvider, SkillController};

/// Inventory attribute that carries the equipped attack bonus.
pub const ATTACK_DAMAGE_ATTRIBUTE: &str = "attack_damage";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionKind {
    Additive,
    Multiplicative,
    Override,
}

/// One step of the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageContribution {
    pub kind: ContributionKind,
    pub magnitude: f32,
    /// Who contributed (diagnostics only)
    pub source: String,
}

impl DamageContribution {
    pub fn additive(magnitude: f32, source: impl Into<String>) -> Self {
        Self {
            kind: ContributionKind::Additive,
            magnitude,
            source: source.into(),
        }
    }

    pub fn multiplicative(magnitude: f32, source: impl Into<String>) -> Self {
        Self {
            kind: ContributionKind::Multiplicative,
            magnitude,
            source: source.into(),
        }
    }

    pub fn override_with(magnitude: f32, source: impl Into<String>) -> Self {
        Self {
            kind: ContributionKind::Override,
            magnitude,
            source: source.into(),
        }
    }

    fn apply(&self, value: f32) -> f32 {
        match self.kind {
            ContributionKind::Additive => value + self.magnitude,
            ContributionKind::Multiplicative => value * self.magnitude,
            ContributionKind::Override => self.magnitude,
        }
    }
}

/// Fold `contributions` over `base` in order.
pub fn resolve(base: f32, contributions: &[DamageContribution]) -> f32 {
    contributions
        .iter()
        .fold(base, |value, contribution| contribution.apply(value))
}

/// Result of the canonical attack damage flow.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedDamage {
    pub base: f32,
    pub contributions: Vec<DamageContribution>,
    pub value: f32,
}

/// Canonical attack flow: equipment bonus first, then the skill transform.
///
/// Skill sees the post-equipment value and its result is recorded as a
/// single `Override` step. Missing collaborators contribute nothing.
pub fn resolve_attack_damage(
    base: f32,
    inventory: Option<&dyn InventoryProvider>,
    skills: Option<&dyn SkillController>,
) -> ResolvedDamage {
    let mut contributions = Vec::with_capacity(2);

    if let Some(inventory) = inventory {
        let bonus = inventory.selected_attribute_value(ATTACK_DAMAGE_ATTRIBUTE, 0.0);
        contributions.push(DamageContribution::additive(bonus, "inventory"));
    }

    if let Some(skills) = skills {
        let equipped = resolve(base, &contributions);
        let transformed = skills.modify_attack_damage(equipped);
        contributions.push(DamageContribution::override_with(transformed, "skill"));
    }

    ResolvedDamage {
        base,
        value: resolve(base, &contributions),
        contributions,
    }
}
