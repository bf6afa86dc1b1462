//! In-memory activity store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use docshare_core::result::AppResult;
use docshare_entity::activity::{ActivityCursor, ActivityFilter, ActivityLogEntry};

use crate::store::ActivityStore;

/// Append-only vector of entries.
#[derive(Debug, Default)]
pub struct MemoryActivityStore {
    entries: RwLock<Vec<ActivityLogEntry>>,
}

impl MemoryActivityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn append(&self, entry: &ActivityLogEntry) -> AppResult<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn page(
        &self,
        filter: &ActivityFilter,
        after: Option<ActivityCursor>,
        limit: u32,
    ) -> AppResult<Vec<ActivityLogEntry>> {
        let entries = self.entries.read().await;
        let mut matching: Vec<&ActivityLogEntry> = entries
            .iter()
            .filter(|e| filter.matches(e))
            .filter(|e| after.is_none_or(|c| ActivityCursor::of(e) > c))
            .collect();
        matching.sort_by_key(|e| ActivityCursor::of(e));
        Ok(matching
            .into_iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
