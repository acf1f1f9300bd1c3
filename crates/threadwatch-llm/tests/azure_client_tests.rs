use mockito::{Matcher, Server};
use threadwatch_llm::azure_openai::AzureOpenAIClient;
use threadwatch_llm::{ChatClient, ChatOptions, ChatRequest, LlmError, Message, ResponseFormat};

const COMPLETIONS_PATH: &str = r"^/openai/deployments/gpt-4/chat/completions";

fn client_for(url: &str) -> AzureOpenAIClient {
    AzureOpenAIClient::builder()
        .api_key("test-key")
        .endpoint(url)
        .api_version("2024-02-15-preview")
        .build()
        .unwrap()
}

fn request() -> ChatRequest {
    ChatRequest::new("gpt-4", vec![Message::system("sys"), Message::human("hi")]).with_options(
        ChatOptions::new()
            .temperature(0.2)
            .max_tokens(2000)
            .response_format(ResponseFormat::JsonObject),
    )
}

#[test]
fn test_azure_client_builder_success() {
    let result = AzureOpenAIClient::builder()
        .api_key("test-key")
        .endpoint("https://test-resource.openai.azure.com")
        .api_version("2024-02-15-preview")
        .build();

    assert!(result.is_ok());
}

#[test]
fn test_azure_client_builder_missing_api_key() {
    let result = AzureOpenAIClient::builder()
        .endpoint("https://test-resource.openai.azure.com")
        .api_version("2024-02-15-preview")
        .build();

    let err_msg = result.err().unwrap().to_string();
    assert!(err_msg.contains("API key"));
}

#[test]
fn test_azure_client_builder_missing_endpoint() {
    let result = AzureOpenAIClient::builder()
        .api_key("test-key")
        .api_version("2024-02-15-preview")
        .build();

    let err_msg = result.err().unwrap().to_string();
    assert!(err_msg.contains("Endpoint"));
}

#[test]
fn test_azure_client_builder_missing_api_version() {
    let result = AzureOpenAIClient::builder()
        .api_key("test-key")
        .endpoint("https://test-resource.openai.azure.com")
        .build();

    let err_msg = result.err().unwrap().to_string();
    assert!(err_msg.contains("API version"));
}

#[tokio::test]
async fn test_chat_success_parses_content_and_usage() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
        .match_query(Matcher::UrlEncoded(
            "api-version".into(),
            "2024-02-15-preview".into(),
        ))
        .match_header("api-key", "test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "response_format": { "type": "json_object" },
            "max_tokens": 2000
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "chatcmpl-1",
                "model": "gpt-4",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "{\"new_issues\": []}" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150 }
            }"#,
        )
        .create_async()
        .await;

    let client = client_for(&server.url());
    let response = client.chat(request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.content.as_deref(), Some("{\"new_issues\": []}"));
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    let usage = response.usage.unwrap();
    assert_eq!(usage.input_tokens, 120);
    assert_eq!(usage.output_tokens, 30);
    assert_eq!(usage.total_tokens, 150);
}

#[tokio::test]
async fn test_chat_success_without_usage_or_choices() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "chatcmpl-2", "object": "chat.completion", "choices": []}"#)
        .create_async()
        .await;

    let response = client_for(&server.url()).chat(request()).await.unwrap();

    assert!(response.content.is_none());
    assert!(response.finish_reason.is_none());
    assert!(response.usage.is_none());
}

#[tokio::test]
async fn test_chat_429_is_rate_limited() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
        .with_status(429)
        .with_body("Too many requests")
        .create_async()
        .await;

    let err = client_for(&server.url()).chat(request()).await.unwrap_err();

    assert!(matches!(err, LlmError::RateLimited { status: 429, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_chat_500_is_transient_api_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;

    let err = client_for(&server.url()).chat(request()).await.unwrap_err();

    assert!(matches!(err, LlmError::Api { status: 500, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_chat_400_is_not_retried() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
        .with_status(400)
        .with_body(r#"{"error":{"message":"bad request"}}"#)
        .create_async()
        .await;

    let err = client_for(&server.url()).chat(request()).await.unwrap_err();

    match err {
        LlmError::InvalidRequest { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("bad request"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_undecodable_body_is_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
        .with_status(200)
        .with_body("<html>gateway page</html>")
        .create_async()
        .await;

    let err = client_for(&server.url()).chat(request()).await.unwrap_err();

    assert!(matches!(err, LlmError::Decode(_)));
    assert!(!err.is_transient());
}

#[cfg(test)]
mod config_tests {
    use threadwatch_llm::config::{AzureConfig, ProviderConfig, ProviderType};

    #[test]
    fn test_azure_config_endpoint() {
        let config = AzureConfig::new(
            "test-key",
            "https://my-resource.openai.azure.com",
            "2024-02-15-preview",
        );

        assert_eq!(config.endpoint, "https://my-resource.openai.azure.com");
    }

    #[test]
    fn test_provider_config_roundtrips_through_toml_shape() {
        let json = serde_json::json!({
            "type": "azure_openai",
            "api_key": "k",
            "endpoint": "https://r.openai.azure.com",
            "api_version": "2024-02-15-preview"
        });
        let config: ProviderConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.provider_type(), ProviderType::AzureOpenAI);
    }
}
