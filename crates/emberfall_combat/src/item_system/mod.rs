//! Item System: runtime item instances
//!
//! **ItemId**: строковый ID definition ("iron_sword", "crude_club").
//! **ItemInstance**: конкретный предмет: ссылка на definition + mutable
//! durability (если у definition есть `DurabilityConfig`).
//!
//! Хранение предметов (inventory, UI): внешняя ответственность.

pub mod durability;

pub use durability::{BreakBehavior, DurabilityConfig, DurabilityDepleted, DurabilityState};

use bevy::prelude::*;

use crate::error::CombatError;

/// Item identifier (unique string ID)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Reflect)]
pub struct ItemId(pub String);

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Runtime item.
///
/// Durability is optional: items without a config never wear.
#[derive(Debug)]
pub struct ItemInstance {
    pub definition_id: ItemId,
    pub durability: Option<DurabilityState>,
}

impl ItemInstance {
    pub fn new(definition_id: impl Into<ItemId>, durability: Option<DurabilityConfig>) -> Result<Self, CombatError> {
        let durability = match durability {
            Some(config) => Some(DurabilityState::from_config(config)?),
            None => None,
        };

        Ok(Self {
            definition_id: definition_id.into(),
            durability,
        })
    }

    /// Not broken. A broken item takes no further wear until repaired;
    /// items without durability never break.
    pub fn is_usable(&self) -> bool {
        self.durability.as_ref().map_or(true, |d| !d.is_broken())
    }
}
