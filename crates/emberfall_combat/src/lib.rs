//! Emberfall Combat Core
//!
//! Headless ECS-симуляция боевой логики на Bevy 0.16:
//! - attack lifecycle (trigger gate + timed phases)
//! - damage pipeline (base → equipment → skill)
//! - damage event bus (publish/subscribe)
//! - item durability (wear / break / repair)
//!
//! Анимация, input bindings, inventory UI, hit shapes: внешние слои,
//! общаются с core через collaborator traits и события.

use bevy::prelude::*;
use std::sync::Arc;

pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod item_system;
pub mod logger;

pub use combat::*;
pub use components::*;
pub use config::CombatConfig;
pub use error::CombatError;
pub use item_system::{BreakBehavior, DurabilityConfig, DurabilityState, ItemId, ItemInstance};

/// Главный plugin симуляции
pub struct SimulationPlugin {
    pub config: CombatConfig,
}

impl Default for SimulationPlugin {
    fn default() -> Self {
        Self {
            config: CombatConfig::default(),
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(self.config.tick_hz))
            .insert_resource(self.config.clone())
            .add_plugins(CombatPlugin);
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(config: CombatConfig) -> Result<App, CombatError> {
    config.validate()?;
    logger::init_logger();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin { config });

    Ok(app)
}

/// Build attack slots for `attacks` from the config, sharing one loadout.
pub fn build_attack_slots(
    config: &CombatConfig,
    attacks: &[&str],
    loadout: &AttackLoadout,
) -> Result<AttackSlots, CombatError> {
    let mut slots = AttackSlots::default();
    for &name in attacks {
        let definition = config
            .attack(name)
            .cloned()
            .ok_or_else(|| CombatError::invalid("attack", format!("unknown attack '{}'", name)))?;
        slots = slots.with(AttackLifecycle::new(definition, loadout.clone(), AttackHooks::default())?);
    }
    Ok(slots)
}

/// Loadout with a fixed attack bonus (NPC presets).
pub fn flat_bonus_loadout(bonus: f32) -> AttackLoadout {
    let inventory = StaticInventory::new().with_attribute(combat::pipeline::ATTACK_DAMAGE_ATTRIBUTE, bonus);
    AttackLoadout::default().with_inventory(Arc::new(inventory))
}

/// One deterministic FixedUpdate step of exactly one timestep.
///
/// Tools and tests step the simulation with this instead of `app.update()`
/// (которое зависит от реального времени). Combat event buffers are swapped
/// first, so after the call the current buffer holds exactly this step's
/// output. Не смешивать с `app.update()` в одном цикле.
pub fn step_fixed(app: &mut App) {
    let world = app.world_mut();
    combat::update_combat_events(world);

    let timestep = world.resource::<Time<Fixed>>().timestep();
    world.resource_mut::<Time<Fixed>>().advance_by(timestep);
    world.run_schedule(FixedUpdate);
}
