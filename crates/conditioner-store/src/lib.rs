//! Persistence layer for the content conditioning core: a `SqliteStore` for
//! the production-shaped backend and an `InMemoryStore` for fast
//! deterministic tests, both implementing the repository traits from
//! `conditioner-types`.

mod codec;
mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
