//! Static failure category → service flag table.

use std::collections::HashMap;

use crate::config::CategoryConfig;
use crate::resilience::FailureCategory;

/// Flags flipped together when a category's breaker trips or recovers.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    entries: HashMap<FailureCategory, Vec<String>>,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `category` to `flags`, replacing any previous entry.
    pub fn with(mut self, category: FailureCategory, flags: Vec<String>) -> Self {
        self.entries.insert(category, flags);
        self
    }

    pub fn from_config(config: &CategoryConfig) -> Self {
        Self::new()
            .with(FailureCategory::GameApi, config.game_api.clone())
            .with(FailureCategory::UserStore, config.user_store.clone())
            .with(FailureCategory::CommentStore, config.comment_store.clone())
    }

    /// Flag names for `category`; empty when nothing is mapped.
    pub fn flags(&self, category: FailureCategory) -> &[String] {
        self.entries.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}
