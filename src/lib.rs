pub mod chaum_pedersen;
pub mod commitment;
pub mod config;
pub mod crypto_serde;
pub mod curve;
pub mod deck_prep;
pub mod decryption;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod permutation;
pub mod reveal;
pub mod session;
pub mod shuffle;
pub mod store;
pub mod verifier;

#[cfg(test)]
pub mod test_support;


pub use chaum_pedersen::{ChaumPedersenProof, DlogEquality};
pub use config::{ProtocolConfig, MAX_SECURITY};
pub use curve::{Point, Scalar, DECK_SIZE};
pub use deck_prep::{DeckPrepCard, DeckPrepEntry};
pub use decryption::DecryptionShare;
pub use engine::DeckEngine;
pub use error::{DeckError, Result};
pub use reveal::CardReveal;
pub use session::{TableKey, TableSession};
pub use shuffle::{ShuffleOutput, ShuffleResponse};
