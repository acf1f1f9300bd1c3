use config::{Config as ConfigLoader, ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use threadwatch_llm::config::{OpenAIConfig, ProviderDetails};
use threadwatch_llm::{GatewayConfig, Pricing, ProviderConfig, ProviderType, RateLimits};
use threadwatch_types::AnalyzerConfig;

/// Environment prefixes and the config section each one overrides
const ENV_SECTIONS: [(&str, &str); 4] = [
    ("LLM_", "llm"),
    ("RATE_", "rate"),
    ("PATHS_", "paths"),
    ("LOG_", "logging"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub rate: RateConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub azure_openai_key: Option<String>,
    #[serde(default)]
    pub azure_openai_endpoint: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderType,
    /// Model name, or deployment name for Azure
    pub model: String,
    pub api_version: String,
    /// OpenAI only
    #[serde(default)]
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_attempts: u32,
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateConfig {
    pub requests_per_minute: u32,
    pub tokens_per_minute: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// JSON array of email threads
    pub threads: PathBuf,
    /// JSON array of colleagues
    #[serde(default)]
    pub roster: Option<PathBuf>,
    pub output: PathBuf,
    pub store: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. {dir}/default.toml
    /// 2. {dir}/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (with LLM_, RATE_, PATHS_, LOG_ prefixes)
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&dir.join(&env).to_string_lossy()).required(false));

        // 3. Environment variables override everything
        for (key, value) in env_overrides(std::env::vars()) {
            builder = builder.set_override(key, value)?;
        }

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets are never read from TOML
        cfg.azure_openai_key = std::env::var("AZURE_OPENAI_KEY").ok();
        cfg.azure_openai_endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").ok();
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Provider settings, with the secrets the chosen provider needs
    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        match self.llm.provider {
            ProviderType::AzureOpenAI => {
                let key = required(&self.azure_openai_key, "AZURE_OPENAI_KEY")?;
                let endpoint = required(&self.azure_openai_endpoint, "AZURE_OPENAI_ENDPOINT")?;
                Ok(ProviderConfig::azure_openai(
                    key,
                    endpoint,
                    self.llm.api_version.clone(),
                ))
            }
            ProviderType::OpenAI => {
                let mut openai = OpenAIConfig::new(required(&self.openai_api_key, "OPENAI_API_KEY")?);
                openai.base_url = self.llm.base_url.clone();
                Ok(ProviderConfig {
                    details: ProviderDetails::OpenAI(openai),
                })
            }
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.llm.model.clone())
            .with_temperature(self.llm.temperature)
            .with_max_tokens(self.llm.max_tokens)
            .with_max_attempts(self.llm.max_attempts)
            .with_limits(RateLimits {
                requests_per_minute: self.rate.requests_per_minute,
                tokens_per_minute: self.rate.tokens_per_minute,
            })
            .with_pricing(Pricing {
                input_per_1k: self.llm.input_cost_per_1k,
                output_per_1k: self.llm.output_cost_per_1k,
            })
    }
}

fn required(value: &Option<String>, var: &str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::Message(format!("{var} environment variable is required")))
}

/// `LLM_MAX_TOKENS=4000` becomes `("llm.max_tokens", "4000")`.
fn env_overrides(vars: impl Iterator<Item = (String, String)>) -> Vec<(String, String)> {
    vars.filter_map(|(name, value)| {
        ENV_SECTIONS.iter().find_map(|(prefix, section)| {
            name.strip_prefix(prefix)
                .filter(|field| !field.is_empty())
                .map(|field| (format!("{section}.{}", field.to_lowercase()), value.clone()))
        })
    })
    .collect()
}
