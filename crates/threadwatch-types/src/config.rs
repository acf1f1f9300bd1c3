use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Knobs for the per-thread analysis loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Replaces the built-in system prompt when set
    pub system_prompt_path: Option<PathBuf>,
    /// Replaces the built-in user template when set
    pub user_template_path: Option<PathBuf>,
    /// Share of quote words that must appear in the email body
    pub evidence_overlap_threshold: f64,
    /// Evidence characters shown per open issue in the digest
    pub evidence_snippet_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            system_prompt_path: None,
            user_template_path: None,
            evidence_overlap_threshold: 0.8,
            evidence_snippet_chars: 100,
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.system_prompt_path = Some(path.into());
        self
    }

    pub fn with_user_template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_template_path = Some(path.into());
        self
    }

    pub fn with_evidence_threshold(mut self, threshold: f64) -> Self {
        self.evidence_overlap_threshold = threshold;
        self
    }
}
