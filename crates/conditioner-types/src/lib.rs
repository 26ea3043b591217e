//! Shared entities, closed enums, error taxonomy, and repository traits for
//! the content conditioning core. Every other crate in the workspace depends
//! on this one; it has no dependency on any sibling crate.

pub mod entities;
pub mod error;
pub mod ids;
pub mod repository;

pub use entities::*;
pub use error::{ConditionerError, Result};
pub use ids::*;
pub use repository::*;
