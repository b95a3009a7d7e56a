//! Combat components: attack session state machine, stagger.

pub mod session;
pub mod stagger;


pub use session::*;
pub use stagger::*;
