use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::GatewayError;
use crate::rate_limiter::{RateLimiter, RateLimits};
use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, ResponseFormat, TokenUsage};
use crate::types::Message;

/// Per-1K-token prices used for the running cost estimate (USD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        // GPT-4 list prices
        Self {
            input_per_1k: 0.03,
            output_per_1k: 0.06,
        }
    }
}

impl Pricing {
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.input_tokens as f64 / 1000.0) * self.input_per_1k
            + (usage.output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Model name, or deployment name for Azure
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    pub max_attempts: u32,
    pub limits: RateLimits,
    pub pricing: Pricing,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: Some(0.2),
            max_tokens: 2000,
            max_attempts: 3,
            limits: RateLimits::default(),
            pricing: Pricing::default(),
        }
    }
}

impl GatewayConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_limits(mut self, limits: RateLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }
}

/// Cumulative usage, readable after the fact without touching the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayStats {
    pub total_requests: u64,
    pub total_tokens: u64,
    pub estimated_cost_usd: f64,
    /// Calls that ended in a gateway error (exhausted or rejected)
    pub failed_calls: u64,
    pub window_requests: usize,
    pub window_tokens: u64,
}

/// Parsed JSON reply from [`ModelGateway::invoke_json`]
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub data: Value,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default)]
struct Totals {
    requests: u64,
    tokens: u64,
    cost_usd: f64,
    failed: u64,
}

// Limiter queues and counters share one lock so concurrent callers
// cannot double-count or lose updates.
#[derive(Debug)]
struct GatewayState {
    limiter: RateLimiter,
    totals: Totals,
}

/// Rate-limited, retrying front door to a [`ChatClient`].
pub struct ModelGateway {
    client: Arc<dyn ChatClient>,
    config: GatewayConfig,
    state: Mutex<GatewayState>,
}

impl ModelGateway {
    pub fn new(client: Arc<dyn ChatClient>, config: GatewayConfig) -> Self {
        let limiter = RateLimiter::new(config.limits);
        Self {
            client,
            config,
            state: Mutex::new(GatewayState {
                limiter,
                totals: Totals::default(),
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Pre-flight cost: input characters / 4 plus the output allowance
    pub fn estimate_tokens(&self, messages: &[Message]) -> u64 {
        let chars: usize = messages.iter().map(|m| m.content().char_len()).sum();
        (chars / 4) as u64 + u64::from(self.config.max_tokens)
    }

    /// One chat completion with rate limiting and bounded retries.
    ///
    /// Transient failures back off `2^attempt` seconds (attempt counted from
    /// zero) until `max_attempts` is spent; anything else fails immediately.
    pub async fn call_chat_completion(
        &self,
        messages: Vec<Message>,
        response_format: Option<ResponseFormat>,
    ) -> Result<ChatResponse, GatewayError> {
        let estimated_tokens = self.estimate_tokens(&messages);
        let max_attempts = self.config.max_attempts.max(1);

        let mut options = ChatOptions::new().max_tokens(self.config.max_tokens);
        if let Some(temp) = self.config.temperature {
            options = options.temperature(temp);
        }
        if let Some(format) = response_format {
            options = options.response_format(format);
        }

        let mut attempt: u32 = 0;
        loop {
            self.state
                .lock()
                .await
                .limiter
                .wait_if_needed(estimated_tokens)
                .await;

            let request = ChatRequest::new(self.config.model.clone(), messages.clone())
                .with_options(options.clone());

            match self.client.chat(request).await {
                Ok(response) => {
                    self.record_success(response.usage.unwrap_or_default()).await;
                    return Ok(response);
                }
                Err(err) if err.is_transient() && attempt + 1 < max_attempts => {
                    let backoff = Duration::from_secs(1u64 << attempt.min(16));
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        backoff_secs = backoff.as_secs(),
                        error = %err,
                        "Transient model error, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    self.record_failure().await;
                    tracing::error!(attempts = max_attempts, error = %err, "Model call failed, retries exhausted");
                    return Err(GatewayError::RetriesExhausted {
                        attempts: max_attempts,
                        source: err,
                    });
                }
                Err(err) => {
                    self.record_failure().await;
                    tracing::error!(error = %err, "Model call rejected");
                    return Err(GatewayError::Rejected(err));
                }
            }
        }
    }

    /// System + user prompt in, parsed JSON object out.
    ///
    /// A reply that is not valid JSON is terminal: the same prompt would
    /// produce the same shape again.
    pub async fn invoke_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        let messages = vec![Message::system(system_prompt), Message::human(user_prompt)];

        let response = self
            .call_chat_completion(messages, Some(ResponseFormat::JsonObject))
            .await?;

        let content = response.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(GatewayError::InvalidResponse {
                reason: "empty response body".to_string(),
                content,
            });
        }

        let data: Value =
            serde_json::from_str(&content).map_err(|e| GatewayError::InvalidResponse {
                reason: format!("Failed to parse JSON response: {}", e),
                content: content.clone(),
            })?;

        Ok(GatewayResponse {
            data,
            usage: response.usage.unwrap_or_default(),
            finish_reason: response.finish_reason,
        })
    }

    pub async fn stats(&self) -> GatewayStats {
        let mut state = self.state.lock().await;
        let window_requests = state.limiter.current_request_count();
        let window_tokens = state.limiter.current_token_count();
        GatewayStats {
            total_requests: state.totals.requests,
            total_tokens: state.totals.tokens,
            estimated_cost_usd: state.totals.cost_usd,
            failed_calls: state.totals.failed,
            window_requests,
            window_tokens,
        }
    }

    async fn record_success(&self, usage: TokenUsage) {
        let mut state = self.state.lock().await;
        let total = u64::from(usage.total_tokens);
        state.limiter.record_request(total);
        state.totals.requests += 1;
        state.totals.tokens += total;
        state.totals.cost_usd += self.config.pricing.cost(&usage);
    }

    async fn record_failure(&self) {
        self.state.lock().await.totals.failed += 1;
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
