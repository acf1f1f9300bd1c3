// Chat-completions wire format shared by the OpenAI and Azure OpenAI clients

use crate::error::{LlmError, Result};
use crate::traits::{ChatOptions, ChatResponse, TokenUsage};
use crate::types::{Content, ContentPart, Message};
use serde::Deserialize;
use serde_json::{Map, Value};

/// o1 and gpt-5 deployments reject `temperature` and want `max_completion_tokens`
pub(crate) fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("o1") || model.starts_with("gpt-5")
}

/// Build the request body. `model` is only embedded when the provider
/// expects it in the payload (OpenAI); Azure routes on the URL instead.
pub(crate) fn build_chat_payload(
    model: &str,
    embed_model: bool,
    messages: &[Message],
    options: &ChatOptions,
) -> Result<Value> {
    let wire_messages: Vec<Value> = messages.iter().map(convert_message).collect();

    let mut obj = Map::new();
    if embed_model {
        obj.insert("model".to_string(), Value::String(model.to_string()));
    }
    obj.insert("messages".to_string(), Value::Array(wire_messages));
    obj.insert("stream".to_string(), Value::Bool(false));

    let reasoning = is_reasoning_model(model);

    if let Some(temp) = options.temperature {
        if !reasoning {
            obj.insert("temperature".to_string(), serde_json::json!(temp));
        }
    }
    if let Some(max_tokens) = options.max_tokens {
        let token_field = if reasoning {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };
        obj.insert(token_field.to_string(), serde_json::json!(max_tokens));
    }
    if let Some(format) = &options.response_format {
        let value = serde_json::to_value(format)
            .map_err(|e| LlmError::Config(format!("Invalid response format: {}", e)))?;
        obj.insert("response_format".to_string(), value);
    }

    Ok(Value::Object(obj))
}

fn convert_message(message: &Message) -> Value {
    let mut obj = serde_json::json!({
        "role": message.role(),
        "content": convert_content(message.content()),
    });
    if let (Some(name), Some(map)) = (message.name(), obj.as_object_mut()) {
        map.insert("name".to_string(), serde_json::json!(name));
    }
    obj
}

fn convert_content(content: &Content) -> Value {
    match content {
        Content::Text(s) => serde_json::json!(s),
        Content::Parts(parts) => Value::Array(
            parts
                .iter()
                .map(|ContentPart::Text { text }| {
                    serde_json::json!({
                        "type": "text",
                        "text": text,
                    })
                })
                .collect(),
        ),
    }
}

/// Turn an HTTP response into a [`ChatResponse`], classifying failures.
pub(crate) async fn read_chat_response(response: reqwest::Response) -> Result<ChatResponse> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(LlmError::from_status(status, body));
    }

    let completion: CompletionBody = serde_json::from_str(&body)
        .map_err(|e| LlmError::Decode(format!("{}: {}", e, truncate(&body, 200))))?;

    let (content, finish_reason) = completion
        .choices
        .into_iter()
        .next()
        .map(|c| (c.message.content, c.finish_reason))
        .unwrap_or_default();
    let usage = completion.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ChatResponse {
        content,
        usage,
        finish_reason,
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

// Only the fields we read; serde skips the rest.
#[derive(Debug, Deserialize)]
struct CompletionBody {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
