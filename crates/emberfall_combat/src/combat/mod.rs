//! Combat module
//!
//! Core (без ECS зависимостей в логике):
//! - attack: lifecycle state machine (Idle → Warmup → Active → Recovery → Cooldown)
//! - pipeline: damage contributions → final damage
//! - bus: DamageEvent publish/subscribe
//! - collaborators: интерфейсы actor state / inventory / skills / hit execution
//!
//! ECS слой:
//! - events: input/presentation границы
//! - systems: FixedUpdate системы, регистрируются `CombatPlugin`

use bevy::prelude::*;

pub mod attack;
pub mod bus;
pub mod collaborators;
pub mod events;
pub mod pipeline;
pub mod systems;

#[cfg(test)]
mod attack_tests;

pub use attack::{
    AllowedStates, AttackDefinition, AttackHooks, AttackLifecycle, AttackLoadout, AttackPhase, AttackSlots,
    PhaseChange, StartedAttack, TickContext, TickReport, TriggerGate,
};
pub use bus::{damage_handler, DamageEvent, DamageEventBus, DamageHandler};
pub use collaborators::{ActorStateProvider, HitExecutor, HitRequest, InventoryProvider, SkillController, StaticInventory};
pub use events::{
    AttackPhaseChanged, AttackStarted, AttackTriggered, DamageResolved, EntityDied, ItemDepleted, RepairWeaponIntent,
};
pub use pipeline::{resolve, resolve_attack_damage, ContributionKind, DamageContribution, ResolvedDamage};
pub use systems::{DamageEventRelay, HealthHitExecutor};

/// Swap the double buffers of every combat event.
///
/// В обычном `app.update()` это делает `First`. Ручной fixed-step цикл
/// (`step_fixed`) вызывает это сам, иначе буферы растут без границ.
/// Events not read within two swaps are dropped.
pub fn update_combat_events(world: &mut World) {
    fn swap<E: Event>(world: &mut World) {
        if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
            events.update();
        }
    }

    swap::<AttackTriggered>(world);
    swap::<AttackPhaseChanged>(world);
    swap::<AttackStarted>(world);
    swap::<DamageResolved>(world);
    swap::<EntityDied>(world);
    swap::<ItemDepleted>(world);
    swap::<RepairWeaponIntent>(world);
}

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate.
///
/// Порядок выполнения:
/// 1. tick_attack_lifecycles: фазы, started hook, hit execution (publish на bus)
/// 2. process_attack_triggers: input → Idle → Warmup (+ zero-length фазы)
/// 3. relay_damage_events: bus → DamageResolved
/// 4. apply_weapon_wear: durability от use/hit
/// 5. process_repair_intents
/// 6. mark_dead
///
/// `DamageEventBus` берётся из world если composition root уже вставил свой,
/// иначе создаётся новый.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        let bus = app
            .world()
            .get_resource::<DamageEventBus>()
            .cloned()
            .unwrap_or_default();
        let relay = DamageEventRelay::attach(&bus);

        app.insert_resource(bus)
            .insert_resource(relay)
            .init_resource::<Time<Fixed>>();

        app.add_event::<AttackTriggered>()
            .add_event::<AttackPhaseChanged>()
            .add_event::<AttackStarted>()
            .add_event::<DamageResolved>()
            .add_event::<EntityDied>()
            .add_event::<ItemDepleted>()
            .add_event::<RepairWeaponIntent>();

        app.add_systems(
            FixedUpdate,
            (
                systems::tick_attack_lifecycles,
                systems::process_attack_triggers,
                systems::relay_damage_events,
                systems::apply_weapon_wear,
                systems::process_repair_intents,
                systems::mark_dead,
            )
                .chain(),
        );
    }
}
