//! Headless combat демо
//!
//! Один атакующий с crude club бьёт training dummy, пока дубина не сломается.

use bevy::prelude::*;
use emberfall_combat::*;

fn main() -> Result<(), CombatError> {
    let config = CombatConfig::default();
    let mut app = create_headless_app(config.clone())?;
    logger::set_log_level(logger::LogLevel::Info);

    let bus = app.world().resource::<DamageEventBus>().clone();
    let total = std::sync::Arc::new(std::sync::Mutex::new(0.0_f32));
    let sink = total.clone();
    let meter = damage_handler(move |event| {
        if let Ok(mut total) = sink.lock() {
            *total += event.damage;
        }
    });
    bus.subscribe(&meter);

    let dummy = app.world_mut().spawn(Health::new(500.0)).id();
    let slots = build_attack_slots(&config, &["light_slash"], &flat_bonus_loadout(5.0))?;
    let attacker = app
        .world_mut()
        .spawn((
            ActorState::new(20.0),
            Health::default(),
            slots,
            TargetsInRange::new(vec![dummy]),
            EquippedWeapon::new("crude_club", config.durability_for("crude_club"))?,
        ))
        .id();

    println!("Starting Emberfall headless combat (tick: {} Hz)", config.tick_hz);

    for tick in 0..600 {
        if tick % 10 == 0 {
            app.world_mut()
                .resource_mut::<Events<AttackTriggered>>()
                .send(AttackTriggered::new(attacker, "attack_primary"));
        }
        step_fixed(&mut app);

        if app.world().get::<EquippedWeapon>(attacker).is_none() {
            println!("Tick {}: weapon gone", tick);
            break;
        }
    }

    let hp = app.world().get::<Health>(dummy).map(|h| h.current).unwrap_or_default();
    let dealt = total.lock().map(|t| *t).unwrap_or_default();
    println!("Dummy HP: {:.1}, damage published: {:.1}", hp, dealt);

    Ok(())
}
