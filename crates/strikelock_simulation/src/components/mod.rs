//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: fighter marker, damageable capability, layer bits
//! - input: movement axis, input channel gate, crouch

pub mod actor;
pub mod input;

pub use actor::*;
pub use input::*;
