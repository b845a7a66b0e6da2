//! Item durability: bounded wear counter with break/repair lifecycle.
//!
//! # Lifecycle
//!
//! - Создаётся вместе с item instance (если у definition есть `DurabilityConfig`)
//! - Use/hit wear → `apply_damage` → edge-triggered break на переходе в 0
//! - `repair` возвращает durability и снимает `is_broken`
//! - Отдельного teardown нет: state живёт и умирает вместе с item
//!
//! Invariant: `is_broken` ⇒ `current == 0`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CombatError;

/// What happens to an item when durability hits zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakBehavior {
    /// Item is removed by its owner (inventory, equipment) on the break edge.
    Disappear,
    /// Item stays but is flagged broken until repaired.
    BecomeBroken,
}

/// Durability parameters of an item definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DurabilityConfig {
    pub max_durability: f32,
    /// Wear per attack performed with the item
    pub damage_per_use: f32,
    /// Wear per resolved hit
    pub damage_per_hit: f32,
    pub repairable: bool,
    pub break_behavior: BreakBehavior,
}

impl DurabilityConfig {
    /// Sword preset (100 durability, 1 per swing, 2 per hit).
    pub fn sword() -> Self {
        Self {
            max_durability: 100.0,
            damage_per_use: 1.0,
            damage_per_hit: 2.0,
            repairable: true,
            break_behavior: BreakBehavior::BecomeBroken,
        }
    }

    /// Throwaway club: ломается и исчезает.
    pub fn crude_club() -> Self {
        Self {
            max_durability: 20.0,
            damage_per_use: 0.0,
            damage_per_hit: 5.0,
            repairable: false,
            break_behavior: BreakBehavior::Disappear,
        }
    }

    pub fn validate(&self) -> Result<(), CombatError> {
        if !(self.max_durability > 0.0) || !self.max_durability.is_finite() {
            return Err(CombatError::invalid(
                "durability",
                format!("max_durability must be positive, got {}", self.max_durability),
            ));
        }
        for (what, wear) in [("damage_per_use", self.damage_per_use), ("damage_per_hit", self.damage_per_hit)] {
            if !(wear >= 0.0) || !wear.is_finite() {
                return Err(CombatError::invalid(
                    "durability",
                    format!("{} must be a finite non-negative number, got {}", what, wear),
                ));
            }
        }
        Ok(())
    }
}

/// Payload of the depletion notification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DurabilityDepleted {
    pub behavior: BreakBehavior,
    pub max_durability: f32,
}

pub type DepletedListener = Box<dyn FnMut(&DurabilityDepleted) + Send + Sync>;

/// Per-instance durability state.
pub struct DurabilityState {
    config: DurabilityConfig,
    current: f32,
    is_broken: bool,
    listeners: Vec<DepletedListener>,
}

impl DurabilityState {
    /// Fails with `MissingConfig` when the item has no durability config.
    pub fn new(config: Option<DurabilityConfig>) -> Result<Self, CombatError> {
        let config = config.ok_or(CombatError::MissingConfig("durability config"))?;
        config.validate()?;

        Ok(Self {
            current: config.max_durability,
            config,
            is_broken: false,
            listeners: Vec::new(),
        })
    }

    pub fn from_config(config: DurabilityConfig) -> Result<Self, CombatError> {
        Self::new(Some(config))
    }

    pub fn config(&self) -> &DurabilityConfig {
        &self.config
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.config.max_durability
    }

    pub fn is_broken(&self) -> bool {
        self.is_broken
    }

    /// Remaining durability in [0, 1].
    pub fn fraction(&self) -> f32 {
        self.current / self.config.max_durability
    }

    /// Register a callback fired on the break edge.
    pub fn on_depleted(&mut self, listener: impl FnMut(&DurabilityDepleted) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Wear the item by `amount`.
    ///
    /// Returns `true` only on the call that takes durability from positive
    /// to zero. Already broken items and non-positive amounts are ignored.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if self.is_broken || !(amount > 0.0) {
            return false;
        }

        let was_positive = self.current > 0.0;
        self.current = (self.current - amount).max(0.0);

        if !(was_positive && self.current == 0.0) {
            return false;
        }

        if self.config.break_behavior == BreakBehavior::BecomeBroken {
            self.is_broken = true;
        }

        let event = DurabilityDepleted {
            behavior: self.config.break_behavior,
            max_durability: self.config.max_durability,
        };
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }

        true
    }

    pub fn apply_use_wear(&mut self) -> bool {
        self.apply_damage(self.config.damage_per_use)
    }

    pub fn apply_hit_wear(&mut self) -> bool {
        self.apply_damage(self.config.damage_per_hit)
    }

    /// Restore up to `amount`, capped at max. Un-breaks a broken item.
    ///
    /// Returns `true` if anything changed.
    pub fn repair(&mut self, amount: f32) -> bool {
        if !self.config.repairable || !(amount > 0.0) {
            return false;
        }

        let before = self.current;
        self.current = (self.current + amount).min(self.config.max_durability);
        if self.current > 0.0 {
            self.is_broken = false;
        }

        self.current != before
    }

    /// Back to full durability, no notification.
    pub fn reset(&mut self) {
        self.current = self.config.max_durability;
        self.is_broken = false;
    }
}

impl fmt::Debug for DurabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DurabilityState")
            .field("current", &self.current)
            .field("max", &self.config.max_durability)
            .field("is_broken", &self.is_broken)
            .field("behavior", &self.config.break_behavior)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
