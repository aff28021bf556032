//! Deck preparation: commit to 53 re-masking pairs, reveal them with proofs once every seat has
//! committed.

use ark_std::rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::chaum_pedersen::{ChaumPedersenProof, DlogEquality};
use crate::commitment::{prep_commitment_hash, CommitmentHash};
use crate::curve::{random_point, random_scalar, scalar_mul, Point, Scalar, DECK_SIZE};
use crate::encoding::{point_words, Word};
use crate::engine::DeckEngine;
use crate::error::{DeckError, Result};
use crate::ledger::DeckLedger;
use crate::session::TableSession;
use crate::store::SecretStore;

const LOG_TARGET: &str = "hodlem_deck::deck_prep";

/// Persisted secret for one slot: independent bases `g`, `h` and the exponent `x`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckPrepEntry {
    #[serde(with = "crate::crypto_serde::point")]
    pub g: Point,
    #[serde(with = "crate::crypto_serde::point")]
    pub h: Point,
    #[serde(with = "crate::crypto_serde::scalar")]
    pub x: Scalar,
    #[serde(with = "crate::crypto_serde::point")]
    pub gx: Point,
}

impl DeckPrepEntry {
    pub fn new(g: Point, h: Point, x: Scalar) -> Self {
        let gx = scalar_mul(&g, &x);
        Self { g, h, x, gx }
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let g = random_point(rng);
        let x = random_scalar(rng);
        let h = random_point(rng);
        Self::new(g, h, x)
    }

    /// Reveals `hx = h^x` together with a proof that it shares its exponent with `gx`.
    pub fn reveal<R: RngCore + CryptoRng>(&self, rng: &mut R) -> DeckPrepCard {
        let statement = DlogEquality {
            g: self.g,
            h: self.h,
            gx: self.gx,
            hx: scalar_mul(&self.h, &self.x),
        };
        let proof = ChaumPedersenProof::prove(&self.x, &statement, rng);
        DeckPrepCard::new(statement, proof)
    }
}

/// Revealed preparation slot, ready for on-chain verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeckPrepCard {
    pub g: Point,
    pub h: Point,
    pub gx: Point,
    pub hx: Point,
    pub proof: ChaumPedersenProof,
}

impl DeckPrepCard {
    pub fn new(statement: DlogEquality, proof: ChaumPedersenProof) -> Self {
        Self {
            g: statement.g,
            h: statement.h,
            gx: statement.gx,
            hx: statement.hx,
            proof,
        }
    }

    pub fn statement(&self) -> DlogEquality {
        DlogEquality {
            g: self.g,
            h: self.h,
            gx: self.gx,
            hx: self.hx,
        }
    }

    /// `g, h, gx, hx` as coordinate pairs, then `gs, hs, scx`.
    pub fn abi_words(&self) -> Vec<Word> {
        let mut words = Vec::with_capacity(13);
        for point in [&self.g, &self.h, &self.gx, &self.hx] {
            words.extend(point_words(point));
        }
        words.extend(self.proof.abi_words());
        words
    }
}

/// Draws fresh entries for every slot and folds them into the commitment hash.
pub fn prepare_entries<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> (Vec<DeckPrepEntry>, CommitmentHash) {
    let entries: Vec<DeckPrepEntry> = (0..DECK_SIZE).map(|_| DeckPrepEntry::random(rng)).collect();
    let hash = prep_commitment_hash(&entries);
    (entries, hash)
}

impl<L, S> DeckEngine<L, S>
where
    L: DeckLedger + ?Sized,
    S: SecretStore + ?Sized,
{
    /// Generates and persists this seat's preparation secrets, returning the commitment to
    /// publish. Calling it again replaces every previous entry.
    #[instrument(skip(self, session, rng), fields(table_id = session.table_id), level = "debug")]
    pub async fn prepare_deck<R: RngCore + CryptoRng>(
        &self,
        session: &TableSession,
        rng: &mut R,
    ) -> Result<CommitmentHash> {
        let (entries, hash) = prepare_entries(rng);
        self.store().put_prep(&session.key(), entries).await?;
        tracing::info!(
            target: LOG_TARGET,
            table_id = session.table_id,
            commitment = %hex::encode(hash),
            "deck preparation committed"
        );
        Ok(hash)
    }

    /// Reveals every persisted slot with a fresh proof.
    #[instrument(skip(self, session, rng), fields(table_id = session.table_id), level = "debug")]
    pub async fn verify_prep<R: RngCore + CryptoRng>(
        &self,
        session: &TableSession,
        rng: &mut R,
    ) -> Result<Vec<DeckPrepCard>> {
        let entries = self.require_prep(session).await?;
        if entries.len() != DECK_SIZE {
            return Err(DeckError::DeckSize {
                expected: DECK_SIZE,
                actual: entries.len(),
            });
        }

        let cards: Vec<DeckPrepCard> = entries.iter().map(|entry| entry.reveal(rng)).collect();

        if self.config().self_verify
            && !cards.iter().all(|card| card.proof.verify(&card.statement()))
        {
            return Err(DeckError::SelfCheck("deck preparation proof"));
        }
        tracing::info!(target: LOG_TARGET, table_id = session.table_id, "deck preparation revealed");
        Ok(cards)
    }
}
