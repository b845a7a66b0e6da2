//! Hit execution + bus → ECS relay
//!
//! - `HealthHitExecutor`: применяет `DamageOverride` к `Health` целей, publish на bus
//! - `DamageEventRelay`: подписчик bus, складывает события в очередь
//! - `relay_damage_events`: очередь → `DamageResolved` события
//! - `mark_dead`: `Dead` маркер + `EntityDied`

use bevy::prelude::*;
use std::sync::{Arc, Mutex, PoisonError};

use crate::combat::bus::{damage_handler, DamageEvent, DamageEventBus, DamageHandler};
use crate::combat::collaborators::{HitExecutor, HitRequest};
use crate::combat::events::{DamageResolved, EntityDied};
use crate::components::{Dead, Health};

/// Valid hit target: not the attacker, has `Health`, still alive.
///
/// Shared by the hit executor and the target-in-range gate.
pub fn is_valid_target(healths: &Query<'_, '_, &'static mut Health>, attacker: Entity, target: Entity) -> bool {
    target != attacker && healths.get(target).is_ok_and(|health| health.is_alive())
}

/// Hit executor over ECS `Health`.
///
/// Valid target: not the attacker, has `Health`, still alive, not already
/// hit in this request. Negative damage is clamped to zero here, the
/// pipeline itself never clamps.
pub struct HealthHitExecutor<'a, 'w, 's> {
    healths: &'a mut Query<'w, 's, &'static mut Health>,
}

impl<'a, 'w, 's> HealthHitExecutor<'a, 'w, 's> {
    pub fn new(healths: &'a mut Query<'w, 's, &'static mut Health>) -> Self {
        Self { healths }
    }
}

impl HitExecutor for HealthHitExecutor<'_, '_, '_> {
    fn execute_hits(&mut self, request: &HitRequest<'_>, bus: &DamageEventBus) -> Vec<Entity> {
        let damage = request.damage.max(0.0);
        let mut hit = Vec::with_capacity(request.targets.len());

        for &target in request.targets {
            if hit.contains(&target) || !is_valid_target(self.healths, request.attacker, target) {
                continue;
            }

            let Ok(mut health) = self.healths.get_mut(target) else {
                continue;
            };

            health.take_damage(damage);
            hit.push(target);

            crate::logger::log(&format!(
                "💥 '{}' hit {:?} for {:.1} (HP: {:.1})",
                request.attack, target, damage, health.current
            ));
        }

        // Publish после всех hits текущей activation, в порядке hit list
        for &target in &hit {
            bus.publish(Some(request.attacker), Some(target), damage);
        }

        hit
    }
}

/// Bus subscriber that buffers events for the ECS world.
#[derive(Resource)]
pub struct DamageEventRelay {
    queue: Arc<Mutex<Vec<DamageEvent>>>,
    handler: DamageHandler,
}

impl DamageEventRelay {
    /// Create the relay and subscribe it to `bus`.
    pub fn attach(bus: &DamageEventBus) -> Self {
        let queue: Arc<Mutex<Vec<DamageEvent>>> = Arc::default();
        let sink = queue.clone();
        let handler = damage_handler(move |event| {
            sink.lock().unwrap_or_else(PoisonError::into_inner).push(*event);
        });
        bus.subscribe(&handler);

        Self { queue, handler }
    }

    pub fn handler(&self) -> &DamageHandler {
        &self.handler
    }

    pub fn drain(&self) -> Vec<DamageEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// System: bus events → `DamageResolved`.
pub fn relay_damage_events(relay: Res<DamageEventRelay>, mut resolved: EventWriter<DamageResolved>) {
    for event in relay.drain() {
        resolved.write(DamageResolved {
            attacker: event.attacker,
            target: event.target,
            damage: event.damage,
        });
    }
}

/// System: mark targets killed by a resolved hit.
pub fn mark_dead(
    mut commands: Commands,
    mut resolved: EventReader<DamageResolved>,
    mut died: EventWriter<EntityDied>,
    healths: Query<&Health, Without<Dead>>,
) {
    let mut marked = Vec::new();

    for event in resolved.read() {
        let Ok(health) = healths.get(event.target) else {
            continue;
        };
        if health.is_alive() || marked.contains(&event.target) {
            continue;
        }

        marked.push(event.target);
        commands.entity(event.target).insert(Dead);
        died.write(EntityDied {
            entity: event.target,
            killer: Some(event.attacker),
        });

        crate::logger::log_info(&format!("☠️ Entity {:?} killed by {:?}", event.target, event.attacker));
    }
}
