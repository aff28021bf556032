use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::deck_prep::DeckPrepEntry;
use crate::session::{TableId, TableKey};
use crate::shuffle::{ShuffleRounds, ShuffleSecret};

use super::{SecretStore, StoreError, TableSecrets};

const LOG_TARGET: &str = "hodlem_deck::store::json_file";

/// `address -> table -> secrets`, the layout of the on-disk document.
type Document = BTreeMap<String, BTreeMap<TableId, TableSecrets>>;

/// Secrets kept in a single JSON document, rewritten through a temp file on every put.
pub struct JsonFileSecretStore {
    path: PathBuf,
    document: Mutex<Document>,
}

impl JsonFileSecretStore {
    /// Opens the document at `path`, starting empty if the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let document = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Document::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Document::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(target: LOG_TARGET, path = %path.display(), "opened secret store");
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    async fn update(
        &self,
        key: &TableKey,
        f: impl FnOnce(&mut TableSecrets) + Send,
    ) -> Result<(), StoreError> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        f(next
            .entry(key.address.clone())
            .or_default()
            .entry(key.table_id)
            .or_default());
        let json = serde_json::to_vec_pretty(&next)?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        // Memory only moves once the file has.
        *document = next;
        tracing::trace!(target: LOG_TARGET, address = %key.address, table_id = key.table_id, "persisted");
        Ok(())
    }

    async fn read<T>(
        &self,
        key: &TableKey,
        f: impl FnOnce(&TableSecrets) -> Option<T> + Send,
    ) -> Option<T> {
        let document = self.document.lock().await;
        document
            .get(&key.address)
            .and_then(|tables| tables.get(&key.table_id))
            .and_then(f)
    }
}

#[async_trait]
impl SecretStore for JsonFileSecretStore {
    async fn put_prep(
        &self,
        key: &TableKey,
        entries: Vec<DeckPrepEntry>,
    ) -> Result<(), StoreError> {
        self.update(key, |table| table.prep = Some(entries)).await
    }

    async fn load_prep(&self, key: &TableKey) -> Result<Option<Vec<DeckPrepEntry>>, StoreError> {
        Ok(self.read(key, |table| table.prep.clone()).await)
    }

    async fn put_shuffle(
        &self,
        key: &TableKey,
        secret: ShuffleSecret,
        rounds: ShuffleRounds,
    ) -> Result<(), StoreError> {
        self.update(key, |table| {
            table.shuffle = Some(secret);
            table.shuffle_rounds = Some(rounds);
        })
        .await
    }

    async fn load_shuffle_secret(
        &self,
        key: &TableKey,
    ) -> Result<Option<ShuffleSecret>, StoreError> {
        Ok(self.read(key, |table| table.shuffle.clone()).await)
    }

    async fn load_shuffle_rounds(
        &self,
        key: &TableKey,
    ) -> Result<Option<ShuffleRounds>, StoreError> {
        Ok(self.read(key, |table| table.shuffle_rounds.clone()).await)
    }
}
