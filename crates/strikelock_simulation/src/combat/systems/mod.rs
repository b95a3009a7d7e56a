//! Combat systems (FixedUpdate, порядок задаёт `CombatSet`)

pub mod attack;
pub mod interrupts;
pub mod resolution;
pub mod sessions;


// Re-export all systems
pub use attack::*;
pub use interrupts::*;
pub use resolution::*;
pub use sessions::*;
