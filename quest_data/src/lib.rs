//! Shared data model for quest content and quest state.

pub mod binding;
pub mod defs;
pub mod validate;

pub use binding::*;
pub use defs::*;
pub use validate::{DefKind, ValidationError, validate_world};
