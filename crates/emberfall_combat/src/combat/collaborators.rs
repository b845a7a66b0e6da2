//! Collaborator interfaces consumed by the attack lifecycle.
//!
//! Конкретные реализации (inventory UI, skill catalog, animation) живут
//! вне combat core. Lifecycle получает их через injection (`AttackLoadout`),
//! а не ищет сам.

use bevy::prelude::*;
use std::collections::HashMap;

use super::bus::DamageEventBus;

/// Movement state + base stats of the acting actor.
pub trait ActorStateProvider {
    /// Last-known movement state name ("Idle", "Walk", "Run", "Jump", ...)
    fn movement_state(&self) -> &str;

    fn base_attack_damage(&self) -> f32;
}

/// Selected-item attributes (equipment bonuses).
pub trait InventoryProvider: Send + Sync {
    /// Value of `attribute_id` on the selected item, or `default`.
    fn selected_attribute_value(&self, attribute_id: &str, default: f32) -> f32;
}

/// Weapon-skill hooks used at attack start.
pub trait SkillController: Send + Sync {
    fn primary_skill_animation(&self) -> Option<String>;

    /// Receives the post-equipment damage and returns the new total.
    fn modify_attack_damage(&self, damage: f32) -> f32;

    /// Fire-and-forget side effect (VFX, buff, projectile spawn...).
    fn trigger_default_skill(&self);
}

/// Everything hit execution needs to resolve one activation.
#[derive(Debug, Clone)]
pub struct HitRequest<'a> {
    pub attacker: Entity,
    pub attack: &'a str,
    /// Per-hit damage (`DamageOverride` of the activation)
    pub damage: f32,
    /// Candidates in range; the executor decides which are valid
    pub targets: &'a [Entity],
}

/// Applies an activation's damage to targets.
///
/// Publishing one `DamageEvent` per resolved hit on `bus` is the
/// executor's job.
pub trait HitExecutor {
    /// Returns the targets actually hit, in hit order.
    fn execute_hits(&mut self, request: &HitRequest<'_>, bus: &DamageEventBus) -> Vec<Entity>;
}

/// Executor that hits nothing (actors without hit resolution, tests).
pub struct NoHits;

impl HitExecutor for NoHits {
    fn execute_hits(&mut self, _request: &HitRequest<'_>, _bus: &DamageEventBus) -> Vec<Entity> {
        Vec::new()
    }
}

/// Fixed attribute table (presets, NPC loadouts, tests).
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    attributes: HashMap<String, f32>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, attribute_id: impl Into<String>, value: f32) -> Self {
        self.attributes.insert(attribute_id.into(), value);
        self
    }
}

impl InventoryProvider for StaticInventory {
    fn selected_attribute_value(&self, attribute_id: &str, default: f32) -> f32 {
        self.attributes.get(attribute_id).copied().unwrap_or(default)
    }
}
