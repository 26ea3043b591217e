use async_trait::async_trait;

/// Transport-level result of one model invocation, before cost accounting or
/// structured-response validation is applied.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub text: String,
    pub token_count: u64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("transport error calling {model}: {reason}")]
    Transport { model: String, reason: String },
}

/// Thin seam over whichever model provider backs a deployment. Mirrors
/// `ChatModel::generate`'s single-call shape; system and user turns are kept
/// as separate parameters so a gateway can never fuse them into one turn.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        system_prompt: Option<&str>,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<GatewayResponse, GatewayError>;
}
