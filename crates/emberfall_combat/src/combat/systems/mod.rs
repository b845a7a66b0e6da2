//! Combat systems (ECS wiring of the lifecycle, bus and durability)

pub mod attack;
pub mod damage;
pub mod durability;

pub use attack::*;
pub use damage::*;
pub use durability::*;
