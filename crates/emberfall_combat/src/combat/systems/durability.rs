//! Weapon durability systems.
//!
//! - Per-use wear на `AttackStarted`
//! - Per-hit wear на `DamageResolved` (attacker's weapon)
//! - Break edge → `ItemDepleted`; `Disappear` снимает `EquippedWeapon`
//! - `RepairWeaponIntent` → repair

use bevy::prelude::*;

use crate::combat::events::{AttackStarted, DamageResolved, ItemDepleted, RepairWeaponIntent};
use crate::components::EquippedWeapon;
use crate::item_system::BreakBehavior;

/// Which wear amount to apply.
#[derive(Clone, Copy, Debug)]
enum Wear {
    Use,
    Hit,
}

/// System: wear attacker weapons from attacks and hits.
pub fn apply_weapon_wear(
    mut commands: Commands,
    mut started: EventReader<AttackStarted>,
    mut resolved: EventReader<DamageResolved>,
    mut weapons: Query<&mut EquippedWeapon>,
    mut depleted: EventWriter<ItemDepleted>,
) {
    let wear = started
        .read()
        .map(|event| (event.actor, Wear::Use))
        .chain(resolved.read().map(|event| (event.attacker, Wear::Hit)))
        .collect::<Vec<_>>();

    for (owner, kind) in wear {
        let Ok(mut weapon) = weapons.get_mut(owner) else {
            continue;
        };
        let weapon = &mut *weapon;
        let Some(durability) = weapon.item.durability.as_mut() else {
            continue;
        };

        let newly_broken = match kind {
            Wear::Use => durability.apply_use_wear(),
            Wear::Hit => durability.apply_hit_wear(),
        };
        if !newly_broken {
            continue;
        }

        let behavior = durability.config().break_behavior;
        depleted.write(ItemDepleted {
            owner,
            item: weapon.item.definition_id.clone(),
            behavior,
        });

        crate::logger::log_info(&format!(
            "🔨 {:?}: weapon '{}' depleted ({:?})",
            owner, weapon.item.definition_id.0, behavior
        ));

        if behavior == BreakBehavior::Disappear {
            commands.entity(owner).remove::<EquippedWeapon>();
        }
    }
}

/// System: apply repair intents to equipped weapons.
pub fn process_repair_intents(mut intents: EventReader<RepairWeaponIntent>, mut weapons: Query<&mut EquippedWeapon>) {
    for intent in intents.read() {
        let Ok(mut weapon) = weapons.get_mut(intent.owner) else {
            continue;
        };
        let weapon = &mut *weapon;
        let Some(durability) = weapon.item.durability.as_mut() else {
            continue;
        };

        if durability.repair(intent.amount) {
            crate::logger::log(&format!(
                "🔧 {:?}: weapon '{}' repaired to {:.1}/{:.1}",
                intent.owner,
                weapon.item.definition_id.0,
                durability.current(),
                durability.max()
            ));
        }
    }
}
