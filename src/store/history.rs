//! Per-user history of verification submissions kept by the server.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use super::HistoryError;
use crate::common::types::VerificationRecord;

/// Storage for past verifications, keyed by user identity
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// All records for `user_id`, oldest first
    async fn get(&self, user_id: &str) -> Result<Vec<VerificationRecord>, HistoryError>;

    async fn append(&self, user_id: &str, record: VerificationRecord) -> Result<(), HistoryError>;
}

/// Records kept per user before the oldest are dropped
pub const DEFAULT_RECORDS_PER_USER: usize = 1000;

/// Process-local history, bounded per user. Lost on restart.
pub struct InMemoryHistoryRepository {
    entries: RwLock<HashMap<String, VecDeque<VerificationRecord>>>,
    max_per_user: usize,
}

impl Default for InMemoryHistoryRepository {
    fn default() -> Self {
        Self::with_limit(DEFAULT_RECORDS_PER_USER)
    }
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_per_user: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_per_user: max_per_user.max(1),
        }
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn get(&self, user_id: &str) -> Result<Vec<VerificationRecord>, HistoryError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(user_id)
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn append(&self, user_id: &str, record: VerificationRecord) -> Result<(), HistoryError> {
        let mut entries = self.entries.write().await;
        let records = entries.entry(user_id.to_string()).or_default();
        if records.len() >= self.max_per_user {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }
}
