//! The conditioning core's only seam to an outbound model provider: task
//! routing, retry-with-fallback, and cost accounting against the owner's
//! monthly cap. Real transports implement [`LlmGateway`]; tests use a fake.

mod client;
mod gateway;
mod registry;

pub use client::{can_proceed, InferenceClient, InferenceOutcome};
pub use gateway::{GatewayError, GatewayResponse, LlmGateway};
pub use registry::{ModelRegistry, ModelRoute};
