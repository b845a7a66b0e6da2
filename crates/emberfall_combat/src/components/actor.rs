//! Базовые компоненты акторов: ActorState, Health, TargetsInRange

use bevy::prelude::*;

use crate::combat::collaborators::ActorStateProvider;
use crate::combat::attack::STATE_IDLE;

/// Last-known movement state + base attack stat.
///
/// Movement state пишет animation/movement слой (вне combat core),
/// combat только читает его в trigger gate.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ActorState {
    pub movement_state: String,
    pub base_attack_damage: f32,
}

impl Default for ActorState {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl ActorState {
    pub fn new(base_attack_damage: f32) -> Self {
        Self {
            movement_state: STATE_IDLE.to_string(),
            base_attack_damage,
        }
    }

    pub fn set_movement_state(&mut self, state: impl Into<String>) {
        self.movement_state = state.into();
    }
}

impl ActorStateProvider for ActorState {
    fn movement_state(&self) -> &str {
        &self.movement_state
    }

    fn base_attack_damage(&self) -> f32 {
        self.base_attack_damage
    }
}

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Negative amounts are treated as zero (no healing through damage).
    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }
}

/// Hit candidates near the actor.
///
/// Заполняется внешним слоем (hit shapes / overlap queries),
/// combat core геометрию не считает.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct TargetsInRange {
    pub targets: Vec<Entity>,
}

impl TargetsInRange {
    pub fn new(targets: Vec<Entity>) -> Self {
        Self { targets }
    }

    pub fn any(&self) -> bool {
        !self.targets.is_empty()
    }
}

/// Компонент-маркер: entity мертв (Health == 0)
#[derive(Component, Debug)]
pub struct Dead;
