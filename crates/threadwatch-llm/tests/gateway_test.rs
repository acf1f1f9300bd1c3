use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use threadwatch_llm::{
    ChatClient, ChatRequest, ChatResponse, GatewayConfig, GatewayError, LlmError, Message,
    ModelGateway, RateLimits, ResponseFormat, TokenUsage,
};

/// Replays a fixed sequence of outcomes and records what it was asked
struct ScriptedClient {
    script: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn new(script: Vec<Result<ChatResponse, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> threadwatch_llm::error::Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Connection("script exhausted".into())))
    }
}

fn reply(content: &str, input_tokens: u32, output_tokens: u32) -> Result<ChatResponse, LlmError> {
    Ok(ChatResponse {
        content: Some(content.to_string()),
        usage: Some(TokenUsage {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }),
        finish_reason: Some("stop".into()),
    })
}

fn server_error() -> Result<ChatResponse, LlmError> {
    Err(LlmError::Api {
        status: 503,
        message: "overloaded".into(),
    })
}

fn gateway(client: Arc<ScriptedClient>) -> ModelGateway {
    ModelGateway::new(client, GatewayConfig::new("gpt-4"))
}

#[tokio::test(start_paused = true)]
async fn test_success_records_usage_and_cost() {
    let client = ScriptedClient::new(vec![reply(r#"{"new_issues": []}"#, 1000, 500)]);
    let gateway = gateway(client.clone());

    let response = gateway.invoke_json("system", "user").await.unwrap();

    assert_eq!(response.data["new_issues"], serde_json::json!([]));
    assert_eq!(response.usage.total_tokens, 1500);

    let stats = gateway.stats().await;
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.total_tokens, 1500);
    assert_eq!(stats.window_requests, 1);
    assert_eq!(stats.window_tokens, 1500);
    assert_eq!(stats.failed_calls, 0);
    // 1.0 * 0.03 + 0.5 * 0.06
    assert!((stats.estimated_cost_usd - 0.06).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_request_carries_model_settings_and_json_format() {
    let client = ScriptedClient::new(vec![reply("{}", 10, 10)]);
    let gateway = ModelGateway::new(
        client.clone(),
        GatewayConfig::new("tracker-deployment").with_max_tokens(800),
    );

    gateway.invoke_json("system", "user").await.unwrap();

    let requests = client.requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.model, "tracker-deployment");
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role(), "system");
    assert_eq!(request.messages[1].role(), "user");
    assert_eq!(request.options.max_tokens, Some(800));
    assert_eq!(request.options.temperature, Some(0.2));
    assert_eq!(
        request.options.response_format,
        Some(ResponseFormat::JsonObject)
    );
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_retry_with_backoff() {
    let client = ScriptedClient::new(vec![server_error(), server_error(), reply("{}", 10, 5)]);
    let gateway = gateway(client.clone());

    let start = Instant::now();
    let response = gateway.invoke_json("system", "user").await.unwrap();

    assert_eq!(client.calls(), 3);
    assert_eq!(response.usage.total_tokens, 15);
    // 1s after the first failure, 2s after the second
    assert!(start.elapsed() >= Duration::from_secs(3));

    let stats = gateway.stats().await;
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.failed_calls, 0);
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_after_max_attempts() {
    let client = ScriptedClient::new(vec![
        Err(LlmError::RateLimited {
            status: 429,
            message: "slow down".into(),
        }),
        Err(LlmError::Connection("reset".into())),
        server_error(),
    ]);
    let gateway = gateway(client.clone());

    let err = gateway.invoke_json("system", "user").await.unwrap_err();

    assert_eq!(client.calls(), 3);
    match err {
        GatewayError::RetriesExhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, LlmError::Api { status: 503, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let stats = gateway.stats().await;
    assert_eq!(stats.failed_calls, 1);
    assert_eq!(stats.total_requests, 0);
}

#[tokio::test(start_paused = true)]
async fn test_non_transient_error_is_not_retried() {
    let client = ScriptedClient::new(vec![Err(LlmError::InvalidRequest {
        status: 400,
        message: "context length exceeded".into(),
    })]);
    let gateway = gateway(client.clone());

    let err = gateway.invoke_json("system", "user").await.unwrap_err();

    assert_eq!(client.calls(), 1);
    assert!(matches!(err, GatewayError::Rejected(LlmError::InvalidRequest { .. })));
    assert!(err.provider_error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_non_json_reply_is_invalid_response() {
    let client = ScriptedClient::new(vec![reply("Sure! Here are the issues:", 50, 10)]);
    let gateway = gateway(client.clone());

    let err = gateway.invoke_json("system", "user").await.unwrap_err();

    assert_eq!(client.calls(), 1);
    match err {
        GatewayError::InvalidResponse { content, .. } => {
            assert_eq!(content, "Sure! Here are the issues:");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // The call itself succeeded and consumed quota.
    assert_eq!(gateway.stats().await.total_tokens, 60);
}

#[tokio::test(start_paused = true)]
async fn test_empty_reply_is_invalid_response() {
    let client = ScriptedClient::new(vec![reply("  ", 5, 0)]);
    let gateway = gateway(client);

    let err = gateway.invoke_json("system", "user").await.unwrap_err();

    assert!(matches!(err, GatewayError::InvalidResponse { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_request_ceiling_delays_next_call() {
    let client = ScriptedClient::new(vec![reply("{}", 1, 1), reply("{}", 1, 1), reply("{}", 1, 1)]);
    let gateway = ModelGateway::new(
        client.clone(),
        GatewayConfig::new("gpt-4").with_limits(RateLimits {
            requests_per_minute: 2,
            tokens_per_minute: 1_000_000,
        }),
    );

    let start = Instant::now();
    gateway.invoke_json("s", "u").await.unwrap();
    gateway.invoke_json("s", "u").await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);

    gateway.invoke_json("s", "u").await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert_eq!(client.calls(), 3);
}

#[test]
fn test_estimate_tokens_is_chars_over_four_plus_output_allowance() {
    let client = ScriptedClient::new(Vec::new());
    let gateway = ModelGateway::new(client, GatewayConfig::new("gpt-4").with_max_tokens(100));

    let messages = vec![Message::system("a".repeat(40)), Message::human("b".repeat(41))];

    assert_eq!(gateway.estimate_tokens(&messages), 20 + 100);
}
