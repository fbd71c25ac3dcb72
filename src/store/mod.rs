//! Persistence for card sets and cards
//!
//! One [`CardStore`] interface with two implementations:
//! - [`hosted::HostedStore`] talks to the two remote tables
//! - [`local::LocalStore`] keeps both collections as whole JSON slots on disk
//!
//! The demo flag picks the implementation once, in [`open`]. Nothing else
//! branches on the mode.

pub mod hosted;
pub mod local;
#[cfg(test)]
pub mod memory;
pub mod postgrest;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::HostedConfig;
use crate::flashcards::{Card, CardSet, DraftCard};

pub use hosted::{Filter, HostedStore, TableApi, CARDS_TABLE, SETS_TABLE};
pub use local::LocalStore;
pub use postgrest::PostgrestClient;

/// Underlying cause of a store failure
#[derive(Error, Debug)]
pub enum StoreFailure {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// A store read or write failed. Carries the attempted operation.
#[derive(Error, Debug)]
#[error("{operation} failed: {source}")]
pub struct PersistenceError {
    pub operation: &'static str,
    pub source: StoreFailure,
}

impl PersistenceError {
    pub fn new(operation: &'static str, source: impl Into<StoreFailure>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Tag a low-level failure with the adapter operation it happened in
pub(crate) trait During<T> {
    fn during(self, operation: &'static str) -> Result<T>;
}

impl<T, E: Into<StoreFailure>> During<T> for std::result::Result<T, E> {
    fn during(self, operation: &'static str) -> Result<T> {
        self.map_err(|e| PersistenceError::new(operation, e))
    }
}

/// Create, read, update and delete card sets and their cards
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Create a set and all of its cards; returns the new set id.
    ///
    /// Either both the set and its cards exist afterwards, or neither does.
    async fn create_set(&self, title: &str, owner: Option<&str>, cards: &[DraftCard]) -> Result<String>;

    /// List sets, filtered by owner where the backend is multi-tenant
    async fn list_sets(&self, owner: Option<&str>) -> Result<Vec<CardSet>>;

    async fn get_set(&self, id: &str) -> Result<Option<CardSet>>;

    /// Cards of a set, ascending by position
    async fn list_cards(&self, set_id: &str) -> Result<Vec<Card>>;

    async fn update_card_elaboration(&self, card_id: &str, text: &str) -> Result<()>;

    /// Delete a set's cards, then the set
    async fn delete_set(&self, id: &str) -> Result<()>;
}

/// Which backing store the adapter uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Hosted,
    Local,
}

impl StoreMode {
    pub fn from_demo_flag(demo: bool) -> Self {
        if demo {
            Self::Local
        } else {
            Self::Hosted
        }
    }
}

/// Open the store for a mode.
///
/// `access_token` is the signed-in user's token for hosted mode; without one
/// the hosted tables are accessed with the anonymous key.
pub fn open(
    mode: StoreMode,
    hosted: &HostedConfig,
    data_dir: &Path,
    access_token: Option<&str>,
) -> Result<Arc<dyn CardStore>> {
    match mode {
        StoreMode::Local => {
            log::debug!("Opening local store at {:?}", data_dir);
            Ok(Arc::new(LocalStore::new(data_dir.to_path_buf())))
        }
        StoreMode::Hosted => {
            log::debug!("Opening hosted store at {}", hosted.url);
            let client = PostgrestClient::new(
                hosted.url.clone(),
                hosted.anon_key.clone(),
                access_token.map(str::to_string),
            )
            .during("open")?;
            Ok(Arc::new(HostedStore::new(Arc::new(client))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mode_from_demo_flag() {
        assert_eq!(StoreMode::from_demo_flag(true), StoreMode::Local);
        assert_eq!(StoreMode::from_demo_flag(false), StoreMode::Hosted);
    }

    #[test]
    fn test_error_carries_operation() {
        let err = PersistenceError::new(
            "listSets",
            StoreFailure::Api {
                status: 503,
                message: "unavailable".to_string(),
            },
        );
        assert_eq!(err.operation, "listSets");
        assert_eq!(err.to_string(), "listSets failed: Server error: 503 - unavailable");
    }

    #[tokio::test]
    async fn test_open_local_store() {
        let temp = TempDir::new().unwrap();
        let store = open(StoreMode::Local, &HostedConfig::default(), temp.path(), None).unwrap();
        assert!(store.list_sets(None).await.unwrap().is_empty());
    }

    #[test]
    fn test_open_hosted_rejects_bad_url() {
        let temp = TempDir::new().unwrap();
        let hosted = HostedConfig {
            url: "ftp://example.com".to_string(),
            anon_key: "key".to_string(),
        };
        let err = open(StoreMode::Hosted, &hosted, temp.path(), None).err().unwrap();
        assert_eq!(err.operation, "open");
        assert!(matches!(err.source, StoreFailure::InvalidUrl(_)));
    }
}
