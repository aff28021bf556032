use thiserror::Error;

use crate::encoding::EncodingError;
use crate::ledger::LedgerError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("no persisted {what} for {address}/{table_id}")]
    MissingState {
        what: &'static str,
        address: String,
        table_id: u64,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("scalar has no inverse modulo the group order")]
    NotInvertible,

    #[error("card {card_index} does not unmask to any base card")]
    CardNotFound { card_index: usize },

    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),

    #[error("verification rounds must be in 1..={max}, got {rounds}")]
    InvalidRounds { rounds: usize, max: usize },

    #[error("shuffle rounds disagree: {what} has {actual} rounds, expected {expected}")]
    RoundsMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid deck size: expected {expected}, got {actual}")]
    DeckSize { expected: usize, actual: usize },

    #[error("locally produced {0} failed verification")]
    SelfCheck(&'static str),
}

pub type Result<T> = std::result::Result<T, DeckError>;
