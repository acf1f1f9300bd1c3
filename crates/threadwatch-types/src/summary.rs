use serde::{Deserialize, Serialize};

/// Accumulated understanding of a thread, replaced wholesale after every email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThreadSummary {
    pub key_points: Vec<String>,
    pub topics_discussed: Vec<String>,
    pub participants_active: Vec<String>,
}

impl ThreadSummary {
    pub fn is_empty(&self) -> bool {
        self.key_points.is_empty()
    }
}
