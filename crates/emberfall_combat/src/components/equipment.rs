//! Equipment components
//!
//! **EquippedWeapon**: предмет в руках атакующего. Durability этого
//! предмета изнашивается от атак (per use) и попаданий (per hit).
//! При `BreakBehavior::Disappear` компонент снимается на break edge.

use bevy::prelude::*;

use crate::item_system::{DurabilityConfig, ItemInstance};
use crate::error::CombatError;

#[derive(Component, Debug)]
pub struct EquippedWeapon {
    pub item: ItemInstance,
}

impl EquippedWeapon {
    pub fn new(definition_id: &str, durability: Option<DurabilityConfig>) -> Result<Self, CombatError> {
        Ok(Self {
            item: ItemInstance::new(definition_id, durability)?,
        })
    }

    pub fn is_broken(&self) -> bool {
        !self.item.is_usable()
    }
}
