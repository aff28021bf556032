use std::sync::Arc;

use crate::config::ProtocolConfig;
use crate::deck_prep::DeckPrepEntry;
use crate::error::{DeckError, Result};
use crate::ledger::DeckLedger;
use crate::session::TableSession;
use crate::shuffle::{ShuffleRounds, ShuffleSecret};
use crate::store::SecretStore;

const LOG_TARGET: &str = "hodlem_deck::engine";

/// One player's protocol driver.
///
/// Operations live next to the data they produce (`deck_prep`, `shuffle`, `decryption`,
/// `reveal`); this type only carries the two boundaries and the configuration they share.
pub struct DeckEngine<L: ?Sized, S: ?Sized> {
    ledger: Arc<L>,
    store: Arc<S>,
    config: ProtocolConfig,
}

impl<L: ?Sized, S: ?Sized> Clone for DeckEngine<L, S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<L, S> DeckEngine<L, S>
where
    L: DeckLedger + ?Sized,
    S: SecretStore + ?Sized,
{
    pub fn new(ledger: Arc<L>, store: Arc<S>) -> Self {
        Self {
            ledger,
            store,
            config: ProtocolConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProtocolConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub(crate) async fn require_prep(&self, session: &TableSession) -> Result<Vec<DeckPrepEntry>> {
        self.store
            .load_prep(&session.key())
            .await?
            .ok_or_else(|| missing("deck preparation", session))
    }

    pub(crate) async fn require_shuffle_secret(
        &self,
        session: &TableSession,
    ) -> Result<ShuffleSecret> {
        self.store
            .load_shuffle_secret(&session.key())
            .await?
            .ok_or_else(|| missing("shuffle secret", session))
    }

    /// Loads the persisted rounds and checks they are internally consistent.
    pub(crate) async fn require_shuffle_rounds(
        &self,
        session: &TableSession,
    ) -> Result<ShuffleRounds> {
        let rounds = self
            .store
            .load_shuffle_rounds(&session.key())
            .await?
            .ok_or_else(|| missing("shuffle rounds", session))?;
        if let Err(err) = rounds.validate() {
            tracing::warn!(
                target: LOG_TARGET,
                %err,
                address = %session.address,
                table_id = session.table_id,
                "persisted shuffle rounds are inconsistent"
            );
            return Err(err);
        }
        Ok(rounds)
    }
}

fn missing(what: &'static str, session: &TableSession) -> DeckError {
    tracing::warn!(
        target: LOG_TARGET,
        what,
        address = %session.address,
        table_id = session.table_id,
        "operation called before its prerequisite"
    );
    DeckError::MissingState {
        what,
        address: session.address.clone(),
        table_id: session.table_id,
    }
}
