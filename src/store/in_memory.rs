use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::deck_prep::DeckPrepEntry;
use crate::session::TableKey;
use crate::shuffle::{ShuffleRounds, ShuffleSecret};

use super::{SecretStore, StoreError, TableSecrets};

#[derive(Clone, Default)]
pub struct InMemorySecretStore {
    inner: Arc<RwLock<HashMap<TableKey, TableSecrets>>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, key: &TableKey) -> Option<TableSecrets> {
        self.inner.read().get(key).cloned()
    }

    fn update(&self, key: &TableKey, f: impl FnOnce(&mut TableSecrets)) {
        let mut inner = self.inner.write();
        f(inner.entry(key.clone()).or_default());
    }

    fn read<T>(&self, key: &TableKey, f: impl FnOnce(&TableSecrets) -> Option<T>) -> Option<T> {
        self.inner.read().get(key).and_then(f)
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn put_prep(
        &self,
        key: &TableKey,
        entries: Vec<DeckPrepEntry>,
    ) -> Result<(), StoreError> {
        self.update(key, |table| table.prep = Some(entries));
        Ok(())
    }

    async fn load_prep(&self, key: &TableKey) -> Result<Option<Vec<DeckPrepEntry>>, StoreError> {
        Ok(self.read(key, |table| table.prep.clone()))
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
        });
        Ok(())
    }

    async fn load_shuffle_secret(
        &self,
        key: &TableKey,
    ) -> Result<Option<ShuffleSecret>, StoreError> {
        Ok(self.read(key, |table| table.shuffle.clone()))
    }

    async fn load_shuffle_rounds(
        &self,
        key: &TableKey,
    ) -> Result<Option<ShuffleRounds>, StoreError> {
        Ok(self.read(key, |table| table.shuffle_rounds.clone()))
    }
}
