//! Combat events (ECS data flow)
//!
//! Input/presentation слои общаются с combat core только через эти события:
//! - input → `AttackTriggered`
//! - combat → `AttackPhaseChanged`, `AttackStarted` (animation layer)
//! - bus → `DamageResolved` (UI, stats, audio в ECS)
//! - durability → `ItemDepleted`; UI/NPC → `RepairWeaponIntent`

use bevy::prelude::*;

use super::attack::AttackPhase;
use crate::item_system::{BreakBehavior, ItemId};

/// Input trigger for an actor (already resolved from key bindings).
#[derive(Event, Debug, Clone)]
pub struct AttackTriggered {
    pub actor: Entity,
    pub trigger: String,
    /// State to gate against instead of the actor's movement state
    /// (combo chains, state-machine re-triggers)
    pub state_override: Option<String>,
}

impl AttackTriggered {
    pub fn new(actor: Entity, trigger: impl Into<String>) -> Self {
        Self {
            actor,
            trigger: trigger.into(),
            state_override: None,
        }
    }

    pub fn with_state_override(mut self, state: impl Into<String>) -> Self {
        self.state_override = Some(state.into());
        self
    }
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct AttackPhaseChanged {
    pub actor: Entity,
    pub attack: String,
    pub from: AttackPhase,
    pub to: AttackPhase,
}

/// Attack entered Active: animation layer plays `animation`.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct AttackStarted {
    pub actor: Entity,
    pub attack: String,
    pub animation: String,
    pub damage: f32,
}

/// ECS mirror of a `DamageEvent` published on the bus.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageResolved {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: f32,
}

/// Событие: entity умер (health == 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Equipped item durability reached zero.
#[derive(Event, Debug, Clone)]
pub struct ItemDepleted {
    pub owner: Entity,
    pub item: ItemId,
    pub behavior: BreakBehavior,
}

#[derive(Event, Debug, Clone)]
pub struct RepairWeaponIntent {
    pub owner: Entity,
    pub amount: f32,
}
