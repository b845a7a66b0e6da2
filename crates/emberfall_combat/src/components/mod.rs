//! ECS Components для combat entity
//!
//! Организация по доменам:
//! - actor: movement state, base attack stat, health, targets in range
//! - equipment: оружие в руках (ItemInstance + durability)

pub mod actor;
pub mod equipment;

pub use actor::*;
pub use equipment::*;
