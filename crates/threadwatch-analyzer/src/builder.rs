use anyhow::{anyhow, Result};
use std::sync::Arc;

use threadwatch_llm::ModelGateway;
use threadwatch_persist::PersistenceClient;
use threadwatch_types::{AnalyzerConfig, Colleague};

use crate::analyzer::ThreadAnalyzer;
use crate::templates::PromptTemplates;

/// Builder for constructing a ThreadAnalyzer with optional components
pub struct ThreadAnalyzerBuilder {
    gateway: Option<Arc<ModelGateway>>,
    store: Option<Arc<dyn PersistenceClient>>,
    colleagues: Vec<Colleague>,
    config: AnalyzerConfig,
    templates: Option<PromptTemplates>,
}

impl ThreadAnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            gateway: None,
            store: None,
            colleagues: Vec::new(),
            config: AnalyzerConfig::default(),
            templates: None,
        }
    }

    pub fn gateway(mut self, gateway: Arc<ModelGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Store used for project lookups and creation
    pub fn store(mut self, store: Arc<dyn PersistenceClient>) -> Self {
        self.store = Some(store);
        self
    }

    /// Team roster for the prompt's team digest
    pub fn colleagues(mut self, colleagues: Vec<Colleague>) -> Self {
        self.colleagues = colleagues;
        self
    }

    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use these prompts instead of loading them from the config
    pub fn templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn build(self) -> Result<ThreadAnalyzer> {
        let gateway = self
            .gateway
            .ok_or_else(|| anyhow!("Model gateway is required"))?;
        let store = self
            .store
            .ok_or_else(|| anyhow!("Persistence client is required"))?;
        let templates = match self.templates {
            Some(templates) => templates,
            None => PromptTemplates::load(&self.config)?,
        };

        Ok(ThreadAnalyzer::from_parts(
            gateway,
            store,
            templates,
            self.colleagues,
            self.config,
        ))
    }
}

impl Default for ThreadAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
