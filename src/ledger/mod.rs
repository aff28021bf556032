//! Read surface of the deck contract.
//!
//! The contract is the ground truth for every cross-player value: the composite deck after each
//! shuffle, the canonical base cards, the per-seat shuffle bases, the running partial decryptions
//! and the verification challenges. This crate only reads it; submissions travel through the
//! caller's transport.

use async_trait::async_trait;
use ark_ff::BigInt;
use thiserror::Error;

use crate::curve::Point;
use crate::session::{CardIndex, DeckId, SeatIndex};

pub mod in_memory;

pub use in_memory::{InMemoryDeckLedger, LedgerSnapshot};

/// 256-bit challenge word as stored by the contract.
pub type Challenge = BigInt<4>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("unknown deck {0}")]
    UnknownDeck(DeckId),

    #[error("deck {deck_id} has no shuffle base for seat {seat}")]
    UnknownSeat { deck_id: DeckId, seat: SeatIndex },

    #[error("deck {deck_id} has no card {card_index}")]
    UnknownCard {
        deck_id: DeckId,
        card_index: CardIndex,
    },

    #[error("deck {deck_id} has no challenge for seat {seat}")]
    NoChallenge { deck_id: DeckId, seat: SeatIndex },

    #[error("ledger returned {actual} cards, expected {expected}")]
    Malformed { expected: usize, actual: usize },

    #[error("ledger transport failed: {0}")]
    Transport(#[source] anyhow::Error),
}

#[async_trait]
pub trait DeckLedger: Send + Sync {
    /// Composite deck after the most recent accepted shuffle.
    async fn last_shuffle_deck(&self, deck_id: DeckId) -> Result<Vec<Point>, LedgerError>;

    /// The 53 canonical card identities.
    async fn base_cards(&self, deck_id: DeckId) -> Result<Vec<Point>, LedgerError>;

    /// Slot 0 of the deck the given seat received as input to its shuffle.
    async fn shuffle_base_for_seat(
        &self,
        deck_id: DeckId,
        seat: SeatIndex,
    ) -> Result<Point, LedgerError>;

    /// Latest partial decryption of a dealt card.
    async fn last_partial_decrypt(
        &self,
        deck_id: DeckId,
        card_index: CardIndex,
    ) -> Result<Point, LedgerError>;

    async fn verification_challenge(
        &self,
        deck_id: DeckId,
        seat: SeatIndex,
    ) -> Result<Challenge, LedgerError>;
}
