//! Damage event bus: publish/subscribe для resolved hits.
//!
//! Producer (hit executor) не знает про consumers (UI, durability, stats, audio).
//!
//! # Concurrency
//!
//! - Registry под `Mutex`; subscribe/unsubscribe из любого потока
//! - `publish` берёт snapshot под коротким lock и вызывает handlers уже без lock
//! - Handler может subscribe/unsubscribe (в т.ч. себя) или publish повторно:
//!   это влияет только на следующие publish
//! - Паника handler'а изолирована: остальные handlers snapshot'а всё равно вызываются
//!
//! Bus: явный `Resource` (clone = тот же registry), без static state.
//! Тесты создают свежий bus на каждый кейс.

use bevy::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One resolved hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: f32,
}

pub type DamageHandler = Arc<dyn Fn(&DamageEvent) + Send + Sync>;

/// Wrap a closure as a subscribable handler.
///
/// Keep the returned `Arc`: it is the identity used by `unsubscribe`.
pub fn damage_handler(f: impl Fn(&DamageEvent) + Send + Sync + 'static) -> DamageHandler {
    Arc::new(f)
}

#[derive(Resource, Clone, Default)]
pub struct DamageEventBus {
    subscribers: Arc<Mutex<Vec<DamageHandler>>>,
}

// Identity по адресу данных (vtable pointer не сравниваем)
fn same_handler(a: &DamageHandler, b: &DamageHandler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl DamageEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Vec<DamageHandler>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler`. Re-subscribing the same handler is a no-op.
    ///
    /// Returns `true` if the handler was newly added.
    pub fn subscribe(&self, handler: &DamageHandler) -> bool {
        let mut registry = self.registry();
        if registry.iter().any(|existing| same_handler(existing, handler)) {
            return false;
        }
        registry.push(handler.clone());
        true
    }

    /// Returns `true` if the handler was registered.
    pub fn unsubscribe(&self, handler: &DamageHandler) -> bool {
        let mut registry = self.registry();
        let before = registry.len();
        registry.retain(|existing| !same_handler(existing, handler));
        registry.len() != before
    }

    pub fn is_subscribed(&self, handler: &DamageHandler) -> bool {
        self.registry().iter().any(|existing| same_handler(existing, handler))
    }

    /// Notify every current subscriber, in subscription order.
    ///
    /// No-op when attacker or target is absent.
    pub fn publish(&self, attacker: Option<Entity>, target: Option<Entity>, damage: f32) {
        let (Some(attacker), Some(target)) = (attacker, target) else {
            return;
        };

        let event = DamageEvent {
            attacker,
            target,
            damage,
        };

        // Snapshot; lock отпускается до вызова handlers
        let snapshot: Vec<DamageHandler> = self.registry().clone();

        for handler in snapshot {
            let _ = panic::catch_unwind(AssertUnwindSafe(|| handler(&event)));
        }
    }

    /// Drop every subscriber.
    pub fn clear(&self) {
        self.registry().clear();
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().is_empty()
    }
}

impl std::fmt::Debug for DamageEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DamageEventBus")
            .field("subscribers", &self.len())
            .finish()
    }
}
