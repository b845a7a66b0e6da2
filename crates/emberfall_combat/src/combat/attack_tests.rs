//! Tests for the attack lifecycle state machine.

#[cfg(test)]
mod tests {
    use super::super::attack::*;
    use super::super::bus::{damage_handler, DamageEventBus};
    use super::super::collaborators::{
        ActorStateProvider, HitExecutor, HitRequest, NoHits, SkillController, StaticInventory,
    };
    use super::super::pipeline::ATTACK_DAMAGE_ATTRIBUTE;
    use bevy::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct TestActor {
        state: &'static str,
        base_damage: f32,
    }

    impl ActorStateProvider for TestActor {
        fn movement_state(&self) -> &str {
            self.state
        }

        fn base_attack_damage(&self) -> f32 {
            self.base_damage
        }
    }

    /// Hits every candidate and publishes each hit.
    #[derive(Default)]
    struct PublishAll {
        requests: Vec<(f32, usize)>,
    }

    impl HitExecutor for PublishAll {
        fn execute_hits(&mut self, request: &HitRequest<'_>, bus: &DamageEventBus) -> Vec<Entity> {
            self.requests.push((request.damage, request.targets.len()));
            for target in request.targets {
                bus.publish(Some(request.attacker), Some(*target), request.damage);
            }
            request.targets.to_vec()
        }
    }

    struct SpySkill {
        animation: Option<String>,
        multiplier: f32,
        triggered: AtomicUsize,
    }

    impl SpySkill {
        fn new(animation: Option<&str>, multiplier: f32) -> Arc<Self> {
            Arc::new(Self {
                animation: animation.map(String::from),
                multiplier,
                triggered: AtomicUsize::new(0),
            })
        }
    }

    impl SkillController for SpySkill {
        fn primary_skill_animation(&self) -> Option<String> {
            self.animation.clone()
        }

        fn modify_attack_damage(&self, damage: f32) -> f32 {
            damage * self.multiplier
        }

        fn trigger_default_skill(&self) {
            self.triggered.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn definition(warmup: f32, active: f32, recovery: f32, cooldown: f32) -> AttackDefinition {
        AttackDefinition {
            name: "test_attack".into(),
            triggers: vec!["attack".into()],
            requires_target_in_range: false,
            warmup,
            active,
            recovery,
            cooldown,
            animation: "swing".into(),
            allowed_states: AllowedStates::default(),
        }
    }

    fn lifecycle(def: AttackDefinition) -> AttackLifecycle {
        AttackLifecycle::new(def, AttackLoadout::default(), AttackHooks::default()).unwrap()
    }

    fn gate<'a>(trigger: &'a str, state: &'a str) -> TriggerGate<'a> {
        TriggerGate {
            trigger,
            movement_state: state,
            state_override: None,
            target_in_range: false,
        }
    }

    fn idle_actor() -> TestActor {
        TestActor {
            state: STATE_IDLE,
            base_damage: 10.0,
        }
    }

    /// Tick with no targets and no hit resolution.
    fn tick(attack: &mut AttackLifecycle, delta: f32, actor: &TestActor) -> TickReport {
        let bus = DamageEventBus::new();
        let mut hits = NoHits;
        let mut ctx = TickContext {
            attacker: Entity::from_raw(1),
            actor,
            targets: &[],
            hits: &mut hits,
            bus: &bus,
        };
        attack.tick(delta, &mut ctx)
    }

    // ------------------------------------------------------------------------
    // Gate
    // ------------------------------------------------------------------------

    #[test]
    fn test_disallowed_states_stay_idle() {
        let skill = SpySkill::new(Some("skill_anim"), 2.0);

        for state in ["Jump", "Fall", "Dodge", "Stagger", "Crouch", ""] {
            let mut attack = AttackLifecycle::new(
                definition(0.0, 0.0, 0.0, 0.0),
                AttackLoadout::default().with_skills(skill.clone()),
                AttackHooks::default(),
            )
            .unwrap();

            assert!(!attack.try_trigger(&gate("attack", state)), "state {:?} must be gated", state);
            let report = tick(&mut attack, 1.0, &idle_actor());

            assert_eq!(attack.phase(), AttackPhase::Idle);
            assert!(report.changes.is_empty());
            assert_eq!(attack.animation_name(), "");
            assert_eq!(attack.damage_override(), 0.0);
            assert_eq!(attack.activations(), 0);
        }

        assert_eq!(skill.triggered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_allowed_states_trigger() {
        for state in [STATE_IDLE, STATE_WALK, STATE_RUN] {
            let mut attack = lifecycle(definition(0.5, 0.5, 0.5, 0.5));
            assert!(attack.try_trigger(&gate("attack", state)));
            assert_eq!(attack.phase(), AttackPhase::Warmup);
        }
    }

    #[test]
    fn test_unknown_trigger_ignored() {
        let mut attack = lifecycle(definition(0.5, 0.5, 0.5, 0.5));
        assert!(!attack.try_trigger(&gate("jump", STATE_IDLE)));
        assert_eq!(attack.phase(), AttackPhase::Idle);
    }

    #[test]
    fn test_requires_target_in_range() {
        let mut def = definition(0.5, 0.5, 0.5, 0.5);
        def.requires_target_in_range = true;
        let mut attack = lifecycle(def);

        assert!(!attack.try_trigger(&gate("attack", STATE_IDLE)));
        assert_eq!(attack.phase(), AttackPhase::Idle);

        let in_range = TriggerGate {
            target_in_range: true,
            ..gate("attack", STATE_IDLE)
        };
        assert!(attack.try_trigger(&in_range));
    }

    #[test]
    fn test_state_override_wins_over_movement_state() {
        let mut attack = lifecycle(definition(0.5, 0.5, 0.5, 0.5));

        let overridden_bad = TriggerGate {
            state_override: Some("Jump"),
            ..gate("attack", STATE_IDLE)
        };
        assert!(!attack.try_trigger(&overridden_bad));

        let overridden_good = TriggerGate {
            state_override: Some(STATE_RUN),
            ..gate("attack", "Jump")
        };
        assert!(attack.try_trigger(&overridden_good));
    }

    #[test]
    fn test_any_state_allowed() {
        let mut def = definition(0.5, 0.5, 0.5, 0.5);
        def.allowed_states = AllowedStates::Any;
        let mut attack = lifecycle(def);

        assert!(attack.try_trigger(&gate("attack", "Jump")));
    }

    #[test]
    fn test_custom_precondition_replaces_default() {
        let hooks = AttackHooks::default().with_precondition(|_, gate| gate.effective_state() == "Jump");
        let mut attack = AttackLifecycle::new(definition(0.5, 0.5, 0.5, 0.5), AttackLoadout::default(), hooks).unwrap();

        assert!(!attack.try_trigger(&gate("attack", STATE_IDLE)));
        assert!(attack.try_trigger(&gate("attack", "Jump")));
    }

    #[test]
    fn test_not_interruptible() {
        let mut attack = lifecycle(definition(0.5, 0.5, 0.5, 0.5));
        let actor = idle_actor();
        assert!(attack.try_trigger(&gate("attack", STATE_IDLE)));

        tick(&mut attack, 0.5, &actor);
        assert_eq!(attack.phase(), AttackPhase::Active);

        // Повторный trigger во время атаки игнорируется
        assert!(!attack.try_trigger(&gate("attack", STATE_IDLE)));
        assert_eq!(attack.phase(), AttackPhase::Active);
        assert_eq!(attack.activations(), 1);
    }

    // ------------------------------------------------------------------------
    // Timing
    // ------------------------------------------------------------------------

    #[test]
    fn test_phases_in_order() {
        let mut attack = lifecycle(definition(0.5, 0.25, 0.75, 1.0));
        let actor = idle_actor();
        assert!(attack.try_trigger(&gate("attack", STATE_IDLE)));

        let mut transitions = Vec::new();
        for _ in 0..20 {
            transitions.extend(tick(&mut attack, 0.25, &actor).changes);
        }

        let order: Vec<_> = transitions.iter().map(|c| (c.from, c.to)).collect();
        assert_eq!(
            order,
            vec![
                (AttackPhase::Warmup, AttackPhase::Active),
                (AttackPhase::Active, AttackPhase::Recovery),
                (AttackPhase::Recovery, AttackPhase::Cooldown),
                (AttackPhase::Cooldown, AttackPhase::Idle),
            ]
        );
    }

    #[test]
    fn test_total_time_equals_sum_of_durations() {
        let dt = 0.25;
        let actor = idle_actor();

        for (w, a, r, c) in [
            (0.5, 0.25, 0.75, 1.0),
            (0.0, 0.5, 0.0, 0.25),
            (1.0, 0.0, 0.0, 0.0),
            (0.25, 0.25, 0.25, 0.25),
            (0.0, 0.0, 0.0, 2.0),
        ] {
            let def = definition(w, a, r, c);
            let total = def.total_duration();
            let mut attack = lifecycle(def);
            assert!(attack.try_trigger(&gate("attack", STATE_IDLE)));
            tick(&mut attack, 0.0, &actor);

            let mut ticks = 0u32;
            while !attack.is_idle() {
                tick(&mut attack, dt, &actor);
                ticks += 1;
                assert!(ticks < 1000, "attack never returned to Idle");
            }

            assert_eq!(ticks as f32 * dt, total, "durations ({w}, {a}, {r}, {c})");
        }
    }

    #[test]
    fn test_sixty_hz_steps_match_durations() {
        let dt = 1.0_f32 / 60.0;
        let actor = idle_actor();

        let mut definitions = vec![AttackDefinition::light_slash(), AttackDefinition::heavy_smash()];
        definitions.extend([
            definition(0.6, 0.3, 0.5, 1.2),
            definition(0.1, 0.35, 0.05, 0.8),
            definition(0.0, 0.2, 0.0, 1.1),
        ]);

        for mut def in definitions {
            def.allowed_states = AllowedStates::Any;
            def.requires_target_in_range = false;
            def.triggers = vec!["attack".into()];

            let expected_total = (def.total_duration() * 60.0).round() as u32;
            let expected_active = (def.warmup * 60.0).round() as u32;
            let label = format!("{} ({}, {}, {}, {})", def.name, def.warmup, def.active, def.recovery, def.cooldown);

            let mut attack = lifecycle(def);
            assert!(attack.try_trigger(&gate("attack", STATE_IDLE)));
            let mut ticks = 0u32;
            let mut active_at = if tick(&mut attack, 0.0, &actor).started { Some(0) } else { None };

            while !attack.is_idle() {
                let report = tick(&mut attack, dt, &actor);
                ticks += 1;
                if report.started {
                    active_at = Some(ticks);
                }
                assert!(ticks < 10_000, "attack never returned to Idle: {label}");
            }

            assert_eq!(ticks, expected_total, "{label}");
            assert_eq!(active_at, Some(expected_active), "{label}");
        }
    }

    #[test]
    fn test_transition_exactly_at_duration() {
        let mut attack = lifecycle(definition(0.5, 1.0, 1.0, 1.0));
        let actor = idle_actor();
        attack.try_trigger(&gate("attack", STATE_IDLE));

        tick(&mut attack, 0.25, &actor);
        assert_eq!(attack.phase(), AttackPhase::Warmup);
        assert_eq!(attack.phase_elapsed(), 0.25);

        let report = tick(&mut attack, 0.25, &actor);
        assert_eq!(attack.phase(), AttackPhase::Active);
        assert!(report.started);
        assert_eq!(attack.phase_elapsed(), 0.0);
    }

    #[test]
    fn test_zero_durations_collapse_same_step() {
        let skill = SpySkill::new(None, 1.0);
        let mut attack = AttackLifecycle::new(
            definition(0.0, 0.0, 0.0, 0.0),
            AttackLoadout::default().with_skills(skill.clone()),
            AttackHooks::default(),
        )
        .unwrap();

        assert!(attack.try_trigger(&gate("attack", STATE_IDLE)));
        let report = tick(&mut attack, 0.0, &idle_actor());

        assert_eq!(report.changes.len(), 4);
        assert!(report.started);
        assert_eq!(attack.phase(), AttackPhase::Idle);
        // Side effects нулевой Active фазы всё равно выполнились
        assert_eq!(attack.damage_override(), 10.0);
        assert_eq!(attack.animation_name(), "swing");
        assert_eq!(skill.triggered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_warmup_enters_active_on_same_step() {
        let mut attack = lifecycle(definition(0.0, 1.0, 1.0, 1.0));
        assert!(attack.try_trigger(&gate("attack", STATE_IDLE)));

        let report = tick(&mut attack, 0.0, &idle_actor());
        assert_eq!(attack.phase(), AttackPhase::Active);
        assert!(report.started);
    }

    #[test]
    fn test_large_delta_carries_over() {
        let mut attack = lifecycle(definition(0.5, 0.5, 0.5, 0.5));
        let actor = idle_actor();
        attack.try_trigger(&gate("attack", STATE_IDLE));

        let report = tick(&mut attack, 1.25, &actor);
        assert_eq!(report.changes.len(), 2);
        assert_eq!(attack.phase(), AttackPhase::Recovery);
        assert_eq!(attack.phase_elapsed(), 0.25);
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut attack = lifecycle(definition(0.5, 0.5, 0.5, 0.5));
        let report = tick(&mut attack, 10.0, &idle_actor());
        assert_eq!(report, TickReport::default());
        assert_eq!(attack.phase_elapsed(), 0.0);
    }

    #[test]
    fn test_retrigger_after_cycle() {
        let mut attack = lifecycle(definition(0.25, 0.25, 0.25, 0.25));
        let actor = idle_actor();

        for expected in 1..=3 {
            assert!(attack.try_trigger(&gate("attack", STATE_IDLE)));
            tick(&mut attack, 1.0, &actor);
            assert!(attack.is_idle());
            assert_eq!(attack.activations(), expected);
        }
    }

    // ------------------------------------------------------------------------
    // Started hook & damage
    // ------------------------------------------------------------------------

    #[test]
    fn test_started_hook_without_collaborators() {
        let mut attack = lifecycle(definition(0.0, 1.0, 1.0, 1.0));
        attack.try_trigger(&gate("attack", STATE_IDLE));
        tick(&mut attack, 0.0, &TestActor { state: STATE_IDLE, base_damage: 42.0 });

        assert_eq!(attack.damage_override(), 42.0);
        assert_eq!(attack.animation_name(), "swing");
        assert!(attack.last_resolution().unwrap().contributions.is_empty());
    }

    #[test]
    fn test_equipment_then_skill() {
        let inventory = Arc::new(StaticInventory::new().with_attribute(ATTACK_DAMAGE_ATTRIBUTE, 5.0));
        let skill = SpySkill::new(Some("flame_slash"), 2.0);
        let loadout = AttackLoadout::default()
            .with_inventory(inventory)
            .with_skills(skill.clone());

        let mut attack = AttackLifecycle::new(definition(0.0, 1.0, 1.0, 1.0), loadout, AttackHooks::default()).unwrap();
        attack.try_trigger(&gate("attack", STATE_IDLE));
        tick(&mut attack, 0.0, &idle_actor());

        // (10 + 5) × 2
        assert_eq!(attack.damage_override(), 30.0);
        assert_eq!(attack.animation_name(), "flame_slash");
        assert_eq!(skill.triggered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_skill_animation_keeps_base() {
        let skill = SpySkill::new(Some(""), 1.0);
        let mut attack = AttackLifecycle::new(
            definition(0.0, 1.0, 1.0, 1.0),
            AttackLoadout::default().with_skills(skill),
            AttackHooks::default(),
        )
        .unwrap();

        attack.try_trigger(&gate("attack", STATE_IDLE));
        tick(&mut attack, 0.0, &idle_actor());
        assert_eq!(attack.animation_name(), "swing");
    }

    #[test]
    fn test_damage_recomputed_each_activation() {
        let mut attack = lifecycle(definition(0.0, 0.0, 0.0, 0.0));

        attack.try_trigger(&gate("attack", STATE_IDLE));
        tick(&mut attack, 0.0, &TestActor { state: STATE_IDLE, base_damage: 10.0 });
        assert_eq!(attack.damage_override(), 10.0);

        attack.try_trigger(&gate("attack", STATE_IDLE));
        tick(&mut attack, 0.0, &TestActor { state: STATE_IDLE, base_damage: 18.0 });
        assert_eq!(attack.damage_override(), 18.0);
    }

    #[test]
    fn test_on_started_hook_runs_after_skill() {
        let skill = SpySkill::new(Some("skill_anim"), 3.0);
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();

        let hooks = AttackHooks::default().with_on_started(move |started| {
            *sink.lock().unwrap() = Some((started.animation.clone(), *started.damage_override));
            *started.damage_override += 1.0;
        });
        let mut attack = AttackLifecycle::new(
            definition(0.0, 1.0, 1.0, 1.0),
            AttackLoadout::default().with_skills(skill),
            hooks,
        )
        .unwrap();

        attack.try_trigger(&gate("attack", STATE_IDLE));
        tick(&mut attack, 0.0, &idle_actor());

        assert_eq!(*seen.lock().unwrap(), Some(("skill_anim".to_string(), 30.0)));
        assert_eq!(attack.damage_override(), 31.0);
    }

    // ------------------------------------------------------------------------
    // Hit execution
    // ------------------------------------------------------------------------

    #[test]
    fn test_hits_use_damage_override_and_publish() {
        let inventory = Arc::new(StaticInventory::new().with_attribute(ATTACK_DAMAGE_ATTRIBUTE, 2.0));
        let mut attack = AttackLifecycle::new(
            definition(0.25, 0.25, 0.25, 0.25),
            AttackLoadout::default().with_inventory(inventory),
            AttackHooks::default(),
        )
        .unwrap();

        let bus = DamageEventBus::new();
        let published = Arc::new(Mutex::new(Vec::new()));
        let sink = published.clone();
        bus.subscribe(&damage_handler(move |event| sink.lock().unwrap().push(*event)));

        let targets = [Entity::from_raw(10), Entity::from_raw(11)];
        let mut executor = PublishAll::default();
        let actor = idle_actor();

        attack.try_trigger(&gate("attack", STATE_IDLE));

        let mut all_hits = Vec::new();
        for _ in 0..4 {
            let mut ctx = TickContext {
                attacker: Entity::from_raw(1),
                actor: &actor,
                targets: &targets,
                hits: &mut executor,
                bus: &bus,
            };
            all_hits.extend(attack.tick(0.25, &mut ctx).hits);
        }

        // Hit execution один раз за activation
        assert_eq!(executor.requests, vec![(12.0, 2)]);
        assert_eq!(all_hits, targets.to_vec());

        let published = published.lock().unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].target, targets[0]);
        assert_eq!(published[1].target, targets[1]);
        assert!(published.iter().all(|e| e.damage == 12.0 && e.attacker == Entity::from_raw(1)));
    }

    // ------------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------------

    #[test]
    fn test_negative_duration_rejected() {
        let result = AttackLifecycle::new(
            definition(0.5, -0.1, 0.5, 0.5),
            AttackLoadout::default(),
            AttackHooks::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_nan_duration_rejected() {
        assert!(definition(f32::NAN, 0.0, 0.0, 0.0).validate().is_err());
        assert!(definition(0.0, 0.0, f32::INFINITY, 0.0).validate().is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(AttackDefinition::light_slash().validate().is_ok());
        assert!(AttackDefinition::heavy_smash().validate().is_ok());
        assert!(AttackDefinition::heavy_smash().requires_target_in_range);
        assert!(!AttackDefinition::heavy_smash().allowed_states.allows(STATE_RUN));
    }

    #[test]
    fn test_attack_slots_lookup() {
        let slots = AttackSlots::default()
            .with(lifecycle(AttackDefinition::light_slash()))
            .with(lifecycle(AttackDefinition::heavy_smash()));

        assert!(slots.get("heavy_smash").is_some());
        assert!(slots.get("spin").is_none());
        assert!(!slots.any_in_progress());
    }

    #[test]
    fn test_reequip_affects_next_activation() {
        let mut slots = AttackSlots::default().with(lifecycle(definition(0.0, 0.0, 0.0, 0.0)));
        let attack = slots.get_mut("test_attack").unwrap();

        attack.try_trigger(&gate("attack", STATE_IDLE));
        tick(attack, 0.0, &idle_actor());
        assert_eq!(attack.damage_override(), 10.0);

        // Новое оружие в руке: loadout меняется между activations
        attack.loadout_mut().inventory = Some(Arc::new(
            StaticInventory::new().with_attribute(ATTACK_DAMAGE_ATTRIBUTE, 7.0),
        ));

        attack.try_trigger(&gate("attack", STATE_IDLE));
        tick(attack, 0.0, &idle_actor());
        assert_eq!(attack.damage_override(), 17.0);
        assert_eq!(attack.activations(), 2);
    }
}
