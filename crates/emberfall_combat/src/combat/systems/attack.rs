//! Attack lifecycle systems.

use bevy::prelude::*;

use super::damage::{is_valid_target, HealthHitExecutor};
use crate::combat::attack::{AttackLifecycle, AttackSlots, TickContext, TriggerGate};
use crate::combat::bus::DamageEventBus;
use crate::combat::events::{AttackPhaseChanged, AttackStarted, AttackTriggered};
use crate::components::{ActorState, Dead, Health, TargetsInRange};

/// Advance one slot and report what happened as events.
#[allow(clippy::too_many_arguments)]
fn advance_slot(
    actor: Entity,
    state: &ActorState,
    targets: &[Entity],
    lifecycle: &mut AttackLifecycle,
    delta: f32,
    healths: &mut Query<&'static mut Health>,
    bus: &DamageEventBus,
    phase_events: &mut EventWriter<AttackPhaseChanged>,
    started_events: &mut EventWriter<AttackStarted>,
) {
    let mut executor = HealthHitExecutor::new(healths);
    let mut ctx = TickContext {
        attacker: actor,
        actor: state,
        targets,
        hits: &mut executor,
        bus,
    };
    let report = lifecycle.tick(delta, &mut ctx);

    for change in &report.changes {
        phase_events.write(AttackPhaseChanged {
            actor,
            attack: lifecycle.name().to_string(),
            from: change.from,
            to: change.to,
        });
    }

    if report.started {
        started_events.write(AttackStarted {
            actor,
            attack: lifecycle.name().to_string(),
            animation: lifecycle.animation_name().to_string(),
            damage: lifecycle.damage_override(),
        });
    }
}

/// System: advance phase timers of every in-progress attack.
///
/// Runs before trigger processing, so the tick an attack is triggered on
/// does not count towards its warmup.
pub fn tick_attack_lifecycles(
    time: Res<Time<Fixed>>,
    bus: Res<DamageEventBus>,
    mut actors: Query<(Entity, &ActorState, &mut AttackSlots, Option<&TargetsInRange>)>,
    mut healths: Query<&'static mut Health>,
    mut phase_events: EventWriter<AttackPhaseChanged>,
    mut started_events: EventWriter<AttackStarted>,
) {
    let delta = time.delta_secs();

    for (entity, state, mut slots, targets) in actors.iter_mut() {
        if !slots.any_in_progress() {
            continue;
        }

        let targets = targets.map(|t| t.targets.as_slice()).unwrap_or_default();
        for lifecycle in slots.slots.iter_mut().filter(|slot| !slot.is_idle()) {
            advance_slot(
                entity,
                state,
                targets,
                lifecycle,
                delta,
                &mut healths,
                &bus,
                &mut phase_events,
                &mut started_events,
            );
        }
    }
}

/// System: Idle → Warmup for `AttackTriggered` input.
///
/// Gate failures are silent. "Target in range" means at least one candidate
/// the hit executor would accept. Accepted attacks are ticked by zero right
/// away so zero-length phases resolve in this update.
pub fn process_attack_triggers(
    mut triggers: EventReader<AttackTriggered>,
    bus: Res<DamageEventBus>,
    mut actors: Query<(&ActorState, &mut AttackSlots, Option<&TargetsInRange>), Without<Dead>>,
    mut healths: Query<&'static mut Health>,
    mut phase_events: EventWriter<AttackPhaseChanged>,
    mut started_events: EventWriter<AttackStarted>,
) {
    for trigger in triggers.read() {
        let Ok((state, mut slots, targets)) = actors.get_mut(trigger.actor) else {
            continue;
        };

        let targets = targets.map(|t| t.targets.as_slice()).unwrap_or_default();
        let gate = TriggerGate {
            trigger: &trigger.trigger,
            movement_state: &state.movement_state,
            state_override: trigger.state_override.as_deref(),
            target_in_range: targets
                .iter()
                .any(|&target| is_valid_target(&healths, trigger.actor, target)),
        };

        for lifecycle in slots.slots.iter_mut() {
            if !lifecycle.try_trigger(&gate) {
                continue;
            }

            phase_events.write(AttackPhaseChanged {
                actor: trigger.actor,
                attack: lifecycle.name().to_string(),
                from: crate::combat::AttackPhase::Idle,
                to: lifecycle.phase(),
            });

            advance_slot(
                trigger.actor,
                state,
                targets,
                lifecycle,
                0.0,
                &mut healths,
                &bus,
                &mut phase_events,
                &mut started_events,
            );
        }
    }
}
