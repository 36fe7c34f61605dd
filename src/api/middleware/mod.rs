pub mod guard;
pub mod trace;

pub use guard::{guarded, Guard};
pub use trace::*;
