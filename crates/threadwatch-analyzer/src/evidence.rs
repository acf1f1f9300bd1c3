use std::collections::HashSet;

pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.8;

/// Checks that a quote the model offers as evidence is really in the email.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceValidator {
    threshold: f64,
}

impl Default for EvidenceValidator {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAP_THRESHOLD)
    }
}

impl EvidenceValidator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// True when the quote appears verbatim (ignoring case), or when at least
    /// `threshold` of its distinct words occur as whole words in the source.
    pub fn is_grounded(&self, quote: &str, source: &str) -> bool {
        let quote = quote.trim().to_lowercase();
        if quote.is_empty() {
            return false;
        }

        let source = source.to_lowercase();
        if source.contains(&quote) {
            return true;
        }

        let quote_words = words(&quote);
        if quote_words.is_empty() {
            return false;
        }
        let source_words = words(&source);

        let shared = quote_words.intersection(&source_words).count();
        shared as f64 / quote_words.len() as f64 >= self.threshold
    }
}

// Whitespace tokens with surrounding punctuation stripped, so "failed," == "failed".
fn words(text: &str) -> HashSet<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect()
}
