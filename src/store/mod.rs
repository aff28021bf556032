//! Per-player secret persistence.
//!
//! One record per `(address, table)` holding the deck-preparation entries and the shuffle
//! secrets. Every put replaces the whole field it names.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deck_prep::DeckPrepEntry;
use crate::session::TableKey;
use crate::shuffle::{ShuffleRounds, ShuffleSecret};

pub mod in_memory;
pub mod json_file;

pub use in_memory::InMemorySecretStore;
pub use json_file::JsonFileSecretStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Everything one player keeps secret about one table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSecrets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep: Option<Vec<DeckPrepEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle: Option<ShuffleSecret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_rounds: Option<ShuffleRounds>,
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn put_prep(&self, key: &TableKey, entries: Vec<DeckPrepEntry>)
        -> Result<(), StoreError>;

    async fn load_prep(&self, key: &TableKey) -> Result<Option<Vec<DeckPrepEntry>>, StoreError>;

    /// Writes the secret and its rounds as one record, so a failed write never pairs a new
    /// secret with the rounds of an earlier shuffle.
    async fn put_shuffle(
        &self,
        key: &TableKey,
        secret: ShuffleSecret,
        rounds: ShuffleRounds,
    ) -> Result<(), StoreError>;

    async fn load_shuffle_secret(&self, key: &TableKey)
        -> Result<Option<ShuffleSecret>, StoreError>;

    async fn load_shuffle_rounds(&self, key: &TableKey)
        -> Result<Option<ShuffleRounds>, StoreError>;
}
