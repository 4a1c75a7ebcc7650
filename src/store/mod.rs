pub mod history;
pub mod local;

pub use history::{HistoryRepository, InMemoryHistoryRepository};
pub use local::LocalHistoryStore;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("history serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("history file {path} is unreadable ({reason}); clear it to continue")]
    Corrupt { path: String, reason: String },

    #[error("history backend unavailable: {0}")]
    Unavailable(String),
}
