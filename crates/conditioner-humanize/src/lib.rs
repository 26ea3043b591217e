//! C9 Humanizer and C10 AI-pattern detector: deterministic text transforms
//! that strip LLM boilerplate and inject casual texture, plus a purely
//! informational scan for the tells that survive.

mod detector;
mod humanizer;

pub use detector::detect;
pub use humanizer::{humanize, Intensity};
