//! Attack lifecycle state machine.
//!
//! # Phases
//!
//! `Idle → Warmup → Active → Recovery → Cooldown → Idle`
//!
//! - Idle → Warmup: trigger input + target-in-range (если требуется) + precondition
//! - Остальные переходы безусловные, по истечении длительности фазы
//! - Duration 0 = фаза проходится в том же update, но её side effects выполняются
//! - Атака не прерывается: после trigger всегда доходит до Idle
//!
//! На входе в Active выполняется "attack started": анимация, damage pipeline
//! (inventory → skill), skill side effect, затем hit execution.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::bus::DamageEventBus;
use super::collaborators::{ActorStateProvider, HitExecutor, HitRequest, InventoryProvider, SkillController};
use super::pipeline::{resolve_attack_damage, ResolvedDamage};
use crate::error::CombatError;

/// Movement state names used by the default precondition.
pub const STATE_IDLE: &str = "Idle";
pub const STATE_WALK: &str = "Walk";
pub const STATE_RUN: &str = "Run";

/// Slack for f32 drift in summed fixed timesteps (1/60 is not exact in binary).
/// Much smaller than one tick at any sane rate.
const PHASE_EPSILON: f32 = 1e-4;

// ============================================================================
// AttackPhase
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum AttackPhase {
    #[default]
    Idle,
    Warmup,
    Active,
    Recovery,
    Cooldown,
}

impl AttackPhase {
    /// Phase that follows this one once its duration has elapsed.
    pub fn next(self) -> AttackPhase {
        match self {
            AttackPhase::Idle => AttackPhase::Idle,
            AttackPhase::Warmup => AttackPhase::Active,
            AttackPhase::Active => AttackPhase::Recovery,
            AttackPhase::Recovery => AttackPhase::Cooldown,
            AttackPhase::Cooldown => AttackPhase::Idle,
        }
    }

    pub fn is_idle(self) -> bool {
        self == AttackPhase::Idle
    }
}

// ============================================================================
// AttackDefinition
// ============================================================================

/// Movement states in which an attack may be triggered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AllowedStates {
    Any,
    Only(Vec<String>),
}

impl Default for AllowedStates {
    fn default() -> Self {
        Self::Only(vec![
            STATE_IDLE.to_string(),
            STATE_WALK.to_string(),
            STATE_RUN.to_string(),
        ])
    }
}

impl AllowedStates {
    pub fn allows(&self, state: &str) -> bool {
        match self {
            AllowedStates::Any => true,
            AllowedStates::Only(states) => states.iter().any(|s| s == state),
        }
    }
}

/// Static description of one attack type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackDefinition {
    pub name: String,
    /// Input trigger ids that can start the attack
    pub triggers: Vec<String>,
    #[serde(default)]
    pub requires_target_in_range: bool,
    /// Phase durations (seconds)
    pub warmup: f32,
    pub active: f32,
    pub recovery: f32,
    pub cooldown: f32,
    /// Base animation id
    pub animation: String,
    #[serde(default)]
    pub allowed_states: AllowedStates,
}

impl AttackDefinition {
    /// Quick one-hand slash.
    pub fn light_slash() -> Self {
        Self {
            name: "light_slash".into(),
            triggers: vec!["attack_primary".into()],
            requires_target_in_range: false,
            warmup: 0.15,
            active: 0.2,
            recovery: 0.25,
            cooldown: 0.4,
            animation: "slash_light".into(),
            allowed_states: AllowedStates::default(),
        }
    }

    /// Slow overhead smash, only with a target nearby.
    pub fn heavy_smash() -> Self {
        Self {
            name: "heavy_smash".into(),
            triggers: vec!["attack_secondary".into(), "attack_charged".into()],
            requires_target_in_range: true,
            warmup: 0.6,
            active: 0.3,
            recovery: 0.5,
            cooldown: 1.2,
            animation: "smash_heavy".into(),
            allowed_states: AllowedStates::Only(vec![STATE_IDLE.into(), STATE_WALK.into()]),
        }
    }

    pub fn duration(&self, phase: AttackPhase) -> f32 {
        match phase {
            AttackPhase::Idle => 0.0,
            AttackPhase::Warmup => self.warmup,
            AttackPhase::Active => self.active,
            AttackPhase::Recovery => self.recovery,
            AttackPhase::Cooldown => self.cooldown,
        }
    }

    /// Warmup entry → Idle re-entry.
    pub fn total_duration(&self) -> f32 {
        self.warmup + self.active + self.recovery + self.cooldown
    }

    pub fn has_trigger(&self, trigger: &str) -> bool {
        self.triggers.iter().any(|t| t == trigger)
    }

    pub fn validate(&self) -> Result<(), CombatError> {
        let phases = [
            ("warmup", self.warmup),
            ("active", self.active),
            ("recovery", self.recovery),
            ("cooldown", self.cooldown),
        ];
        for (phase, duration) in phases {
            if !(duration >= 0.0) || !duration.is_finite() {
                return Err(CombatError::invalid(
                    "attack",
                    format!("'{}': {} duration must be a finite non-negative number, got {}", self.name, phase, duration),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Hooks & loadout
// ============================================================================

/// Inputs of the Idle → Warmup gate.
#[derive(Clone, Copy, Debug)]
pub struct TriggerGate<'a> {
    pub trigger: &'a str,
    /// Actor's last-known movement state
    pub movement_state: &'a str,
    /// Explicit state for state-machine driven re-triggers
    pub state_override: Option<&'a str>,
    pub target_in_range: bool,
}

impl TriggerGate<'_> {
    pub fn effective_state(&self) -> &str {
        self.state_override.unwrap_or(self.movement_state)
    }
}

/// Mutable view handed to the `on_started` hook.
pub struct StartedAttack<'a> {
    pub definition: &'a AttackDefinition,
    pub animation: &'a mut String,
    pub damage_override: &'a mut f32,
}

pub type PreconditionFn = Arc<dyn Fn(&AttackDefinition, &TriggerGate<'_>) -> bool + Send + Sync>;
pub type StartedFn = Arc<dyn Fn(&mut StartedAttack<'_>) + Send + Sync>;

/// Per-variant customisation points.
///
/// `precondition` replaces the default allowed-state check;
/// `on_started` runs after the canonical started hook.
#[derive(Clone, Default)]
pub struct AttackHooks {
    pub precondition: Option<PreconditionFn>,
    pub on_started: Option<StartedFn>,
}

impl AttackHooks {
    pub fn with_precondition(
        mut self,
        f: impl Fn(&AttackDefinition, &TriggerGate<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.precondition = Some(Arc::new(f));
        self
    }

    pub fn with_on_started(mut self, f: impl Fn(&mut StartedAttack<'_>) + Send + Sync + 'static) -> Self {
        self.on_started = Some(Arc::new(f));
        self
    }
}

/// Optional collaborators, resolved by the owner before first use.
#[derive(Clone, Default)]
pub struct AttackLoadout {
    pub inventory: Option<Arc<dyn InventoryProvider>>,
    pub skills: Option<Arc<dyn SkillController>>,
}

impl AttackLoadout {
    pub fn with_inventory(mut self, inventory: Arc<dyn InventoryProvider>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn with_skills(mut self, skills: Arc<dyn SkillController>) -> Self {
        self.skills = Some(skills);
        self
    }
}

// ============================================================================
// AttackLifecycle
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: AttackPhase,
    pub to: AttackPhase,
}

/// Collaborators needed while advancing phases.
pub struct TickContext<'a> {
    pub attacker: Entity,
    pub actor: &'a dyn ActorStateProvider,
    /// Hit candidates currently in range
    pub targets: &'a [Entity],
    pub hits: &'a mut dyn HitExecutor,
    pub bus: &'a DamageEventBus,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub changes: Vec<PhaseChange>,
    /// Set when the started hook ran during this tick
    pub started: bool,
    /// Targets hit during this tick, in hit order
    pub hits: Vec<Entity>,
}

/// One attack slot of an actor.
pub struct AttackLifecycle {
    definition: AttackDefinition,
    hooks: AttackHooks,
    loadout: AttackLoadout,
    phase: AttackPhase,
    /// Time spent in the current phase
    elapsed: f32,
    damage_override: f32,
    animation_name: String,
    activations: u32,
    last_resolution: Option<ResolvedDamage>,
}

impl AttackLifecycle {
    pub fn new(definition: AttackDefinition, loadout: AttackLoadout, hooks: AttackHooks) -> Result<Self, CombatError> {
        definition.validate()?;

        Ok(Self {
            definition,
            hooks,
            loadout,
            phase: AttackPhase::Idle,
            elapsed: 0.0,
            damage_override: 0.0,
            animation_name: String::new(),
            activations: 0,
            last_resolution: None,
        })
    }

    pub fn definition(&self) -> &AttackDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase.is_idle()
    }

    /// Per-hit damage of the current (or last) activation.
    pub fn damage_override(&self) -> f32 {
        self.damage_override
    }

    /// Animation chosen for the current (or last) activation.
    pub fn animation_name(&self) -> &str {
        &self.animation_name
    }

    pub fn phase_elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn activations(&self) -> u32 {
        self.activations
    }

    /// Pipeline breakdown of the last activation (diagnostics).
    pub fn last_resolution(&self) -> Option<&ResolvedDamage> {
        self.last_resolution.as_ref()
    }

    pub fn loadout_mut(&mut self) -> &mut AttackLoadout {
        &mut self.loadout
    }

    fn meets_preconditions(&self, gate: &TriggerGate<'_>) -> bool {
        match &self.hooks.precondition {
            Some(precondition) => precondition(&self.definition, gate),
            None => self.definition.allowed_states.allows(gate.effective_state()),
        }
    }

    /// Idle → Warmup gate.
    ///
    /// Returns `false` (and changes nothing) when not idle, the trigger is
    /// not ours, a required target is missing or the precondition fails.
    /// Zero-length phases are collapsed by the next `tick`, so callers tick
    /// with `0.0` right after a successful trigger.
    pub fn try_trigger(&mut self, gate: &TriggerGate<'_>) -> bool {
        if !self.phase.is_idle() || !self.definition.has_trigger(gate.trigger) {
            return false;
        }

        if self.definition.requires_target_in_range && !gate.target_in_range {
            return false;
        }

        if !self.meets_preconditions(gate) {
            crate::logger::log(&format!(
                "⛔ Attack '{}' gated: state '{}' not allowed",
                self.definition.name,
                gate.effective_state()
            ));
            return false;
        }

        self.phase = AttackPhase::Warmup;
        self.elapsed = 0.0;
        true
    }

    /// Advance phase timers by `delta` seconds.
    ///
    /// Excess time carries into the following phase, so any number of
    /// phases may complete in one call.
    pub fn tick(&mut self, delta: f32, ctx: &mut TickContext<'_>) -> TickReport {
        let mut report = TickReport::default();
        if self.phase.is_idle() {
            return report;
        }

        self.elapsed += delta.max(0.0);

        loop {
            let duration = self.definition.duration(self.phase);
            if self.elapsed + PHASE_EPSILON < duration {
                break;
            }

            self.elapsed = (self.elapsed - duration).max(0.0);
            let change = PhaseChange {
                from: self.phase,
                to: self.phase.next(),
            };
            self.phase = change.to;
            report.changes.push(change);

            match change.to {
                AttackPhase::Active => {
                    self.on_attack_started(ctx.actor);
                    report.started = true;

                    let request = HitRequest {
                        attacker: ctx.attacker,
                        attack: &self.definition.name,
                        damage: self.damage_override,
                        targets: ctx.targets,
                    };
                    let hits = ctx.hits.execute_hits(&request, ctx.bus);
                    report.hits.extend(hits);
                }
                AttackPhase::Idle => {
                    self.elapsed = 0.0;
                    break;
                }
                _ => {}
            }
        }

        report
    }

    fn on_attack_started(&mut self, actor: &dyn ActorStateProvider) {
        self.activations += 1;
        self.animation_name = self.definition.animation.clone();

        let resolved = resolve_attack_damage(
            actor.base_attack_damage(),
            self.loadout.inventory.as_deref(),
            self.loadout.skills.as_deref(),
        );
        self.damage_override = resolved.value;
        self.last_resolution = Some(resolved);

        if let Some(skills) = &self.loadout.skills {
            if let Some(animation) = skills.primary_skill_animation().filter(|a| !a.is_empty()) {
                self.animation_name = animation;
            }
            skills.trigger_default_skill();
        }

        if let Some(on_started) = &self.hooks.on_started {
            on_started(&mut StartedAttack {
                definition: &self.definition,
                animation: &mut self.animation_name,
                damage_override: &mut self.damage_override,
            });
        }

        crate::logger::log(&format!(
            "⚔️ Attack '{}' started (animation: {}, damage: {:.1})",
            self.definition.name, self.animation_name, self.damage_override
        ));
    }
}

impl fmt::Debug for AttackLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttackLifecycle")
            .field("attack", &self.definition.name)
            .field("phase", &self.phase)
            .field("elapsed", &self.elapsed)
            .field("damage_override", &self.damage_override)
            .field("animation_name", &self.animation_name)
            .field("has_inventory", &self.loadout.inventory.is_some())
            .field("has_skills", &self.loadout.skills.is_some())
            .finish()
    }
}

// ============================================================================
// AttackSlots component
// ============================================================================

/// Attacks an actor can perform, one lifecycle per slot.
#[derive(Component, Debug, Default)]
pub struct AttackSlots {
    pub slots: Vec<AttackLifecycle>,
}

impl AttackSlots {
    pub fn new(slots: Vec<AttackLifecycle>) -> Self {
        Self { slots }
    }

    pub fn with(mut self, lifecycle: AttackLifecycle) -> Self {
        self.slots.push(lifecycle);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttackLifecycle> {
        self.slots.iter().find(|slot| slot.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttackLifecycle> {
        self.slots.iter_mut().find(|slot| slot.name() == name)
    }

    pub fn any_in_progress(&self) -> bool {
        self.slots.iter().any(|slot| !slot.is_idle())
    }
}
