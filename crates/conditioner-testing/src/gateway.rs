use async_trait::async_trait;
use conditioner_inference::{GatewayError, GatewayResponse, LlmGateway};
use parking_lot::Mutex;

/// Replays a fixed script of responses in order, one per `complete` call.
/// Panics if called more times than scripted, the same way a test should
/// fail loudly on an unexpected extra network call — unless built via
/// [`Self::always_succeeding`]/[`Self::always_failing`], which replay their
/// single entry (or absence of one) forever.
pub struct FakeLlmGateway {
    script: Mutex<Vec<std::result::Result<GatewayResponse, GatewayError>>>,
    repeat_last: bool,
}

impl FakeLlmGateway {
    #[must_use]
    pub fn new(script: Vec<std::result::Result<GatewayResponse, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(script),
            repeat_last: false,
        }
    }

    /// A gateway that always succeeds with `text`, for tests that don't
    /// care about the exact response shape and may call it any number of
    /// times (e.g. driving a multi-post, multi-call pipeline end to end).
    #[must_use]
    pub fn always_succeeding(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            script: Mutex::new(vec![Ok(GatewayResponse {
                text,
                token_count: 10,
            })]),
            repeat_last: true,
        }
    }

    /// A gateway that always fails transport, for tests exercising
    /// degrade-gracefully paths (e.g. C4's style-guide skip).
    #[must_use]
    pub fn always_failing() -> Self {
        Self {
            script: Mutex::new(vec![]),
            repeat_last: false,
        }
    }
}

#[async_trait]
impl LlmGateway for FakeLlmGateway {
    async fn complete(
        &self,
        model: &str,
        _system_prompt: Option<&str>,
        _user_prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> std::result::Result<GatewayResponse, GatewayError> {
        let mut script = self.script.lock();
        if script.is_empty() {
            return Err(GatewayError::Transport {
                model: model.to_string(),
                reason: "fake gateway exhausted its script".to_string(),
            });
        }
        if self.repeat_last && script.len() == 1 {
            return script[0].clone();
        }
        script.remove(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_succeeding_replays_the_same_text_indefinitely() {
        let gateway = FakeLlmGateway::always_succeeding("hello");
        let response = gateway.complete("any-model", None, "prompt", 100, 0.5).await;
        assert_eq!(response.unwrap().text, "hello");
    }

    #[tokio::test]
    async fn always_failing_errors_on_first_call() {
        let gateway = FakeLlmGateway::always_failing();
        let response = gateway.complete("any-model", None, "prompt", 100, 0.5).await;
        assert!(response.is_err());
    }

    #[tokio::test]
    async fn script_is_consumed_in_order() {
        let gateway = FakeLlmGateway::new(vec![
            Ok(GatewayResponse {
                text: "first".into(),
                token_count: 1,
            }),
            Ok(GatewayResponse {
                text: "second".into(),
                token_count: 1,
            }),
        ]);
        let first = gateway.complete("m", None, "p", 10, 0.1).await.unwrap();
        let second = gateway.complete("m", None, "p", 10, 0.1).await.unwrap();
        assert_eq!(first.text, "first");
        assert_eq!(second.text, "second");
    }
}
