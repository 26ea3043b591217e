//! Facade crate: wires C1-C13 into the external-facing API of §6
//! (`create_campaign`, `start_collection`, `start_analysis`,
//! `generate_draft`, `register_post`, `get_community_profile`,
//! `subscribe_task_progress`), in-process and scheduler-agnostic. No HTTP —
//! that surface belongs to whatever embeds this crate.

mod config;
mod facade;

pub use config::Config;
pub use conditioner_events::{ProgressMeta, ProgressSnapshot};
pub use facade::Conditioner;
