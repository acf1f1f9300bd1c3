pub mod types;
pub mod traits;
pub mod error;
pub mod config;
pub mod openai;
pub mod azure_openai;
pub mod rate_limiter;
pub mod gateway;

mod wire;

pub use traits::{
    ChatClient,
    ChatRequest, ChatResponse, ChatOptions,
    ResponseFormat, TokenUsage,
};

pub use error::{GatewayError, LlmError};
pub use config::{ClientFactory, ProviderConfig, ProviderType};
pub use openai::OpenAIClient;
pub use azure_openai::AzureOpenAIClient;
pub use rate_limiter::{RateLimiter, RateLimits};
pub use gateway::{GatewayConfig, GatewayResponse, GatewayStats, ModelGateway, Pricing};
pub use types::{Message, Content};
