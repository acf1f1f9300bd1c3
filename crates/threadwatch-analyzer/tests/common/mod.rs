#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use threadwatch_analyzer::{Email, EmailThread, ThreadAnalyzer};
use threadwatch_llm::{
    ChatClient, ChatRequest, ChatResponse, GatewayConfig, LlmError, ModelGateway, TokenUsage,
};
use threadwatch_persist::{DocumentStore, PersistenceClient};

pub type Responder = Box<dyn Fn(&ChatRequest) -> Result<ChatResponse, LlmError> + Send + Sync>;

/// Answers each call with the next scripted responder and keeps the prompts it saw.
pub struct ScriptedClient {
    responders: Mutex<VecDeque<Responder>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(responders: Vec<Responder>) -> Arc<Self> {
        Arc::new(Self {
            responders: Mutex::new(responders.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// User prompts in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> threadwatch_llm::error::Result<ChatResponse> {
        if let Some(user) = request.messages.last().and_then(|m| m.content().as_text()) {
            self.prompts.lock().unwrap().push(user.to_string());
        }
        let responder = self.responders.lock().unwrap().pop_front();
        match responder {
            Some(respond) => respond(&request),
            None => Err(LlmError::InvalidRequest {
                status: 400,
                message: "no scripted response left".into(),
            }),
        }
    }
}

pub fn json_reply(body: Value) -> Responder {
    text_reply(body.to_string())
}

pub fn text_reply(content: String) -> Responder {
    Box::new(move |_| Ok(completion(&content)))
}

pub fn failing(error: fn() -> LlmError) -> Responder {
    Box::new(move |_| Err(error()))
}

pub fn completion(content: &str) -> ChatResponse {
    ChatResponse {
        content: Some(content.to_string()),
        usage: Some(TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
            total_tokens: 150,
        }),
        finish_reason: Some("stop".into()),
    }
}

/// Id of the first open issue listed in a user prompt's digest
pub fn first_listed_issue_id(request: &ChatRequest) -> Option<String> {
    let prompt = request.messages.last()?.content().as_text()?;
    let start = prompt.find("1. [")? + "1. [".len();
    let end = prompt[start..].find(']')? + start;
    Some(prompt[start..end].to_string())
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
}

pub fn email(from: &str, to: &[&str], date: DateTime<Utc>, body: &str) -> Email {
    Email {
        from_email: format!("{}@example.com", from.to_lowercase().replace(' ', ".")),
        from_name: from.to_string(),
        to_emails: to.iter().map(|s| s.to_string()).collect(),
        cc_emails: vec![],
        date,
        date_raw: date.to_rfc2822(),
        subject: "Phoenix vendor contract".into(),
        body: body.to_string(),
    }
}

pub fn thread(emails: Vec<Email>) -> EmailThread {
    let mut thread = EmailThread::new("Phoenix vendor contract", emails);
    thread.project_name = "Phoenix".into();
    thread.participants = vec![
        "Ana Lima <ana.lima@example.com>".into(),
        "Bruno Costa <bruno.costa@example.com>".into(),
    ];
    thread
}

pub struct Harness {
    pub client: Arc<ScriptedClient>,
    pub store: Arc<DocumentStore>,
    pub analyzer: ThreadAnalyzer,
}

pub fn harness(responders: Vec<Responder>) -> Harness {
    let store = Arc::new(DocumentStore::in_memory());
    harness_with_store(responders, store.clone(), store)
}

pub fn harness_with_store<S: PersistenceClient + 'static>(
    responders: Vec<Responder>,
    store: Arc<DocumentStore>,
    backend: Arc<S>,
) -> Harness {
    let client = ScriptedClient::new(responders);
    let gateway = Arc::new(ModelGateway::new(client.clone(), GatewayConfig::new("gpt-4")));
    let analyzer = ThreadAnalyzer::builder()
        .gateway(gateway)
        .store(backend)
        .build()
        .unwrap();
    Harness {
        client,
        store,
        analyzer,
    }
}
