//! Chained commitment hashes published on-chain before the matching reveal.
//!
//! The buffer keeps the previous digest in its first 32 bytes, the fresh payload after it, and the
//! whole buffer is rehashed for every step. Starting state is 32 zero bytes.

use crate::curve::{domain_hash, Point};
use crate::deck_prep::DeckPrepEntry;
use crate::encoding::{encode_point, POINT_BYTES, WORD_BYTES};

pub type CommitmentHash = [u8; 32];

/// Digest folded over fixed-size payloads.
#[derive(Clone, Debug)]
pub struct ChainedHash<const PAYLOAD: usize> {
    buffer: Vec<u8>,
}

impl<const PAYLOAD: usize> Default for ChainedHash<PAYLOAD> {
    fn default() -> Self {
        Self {
            buffer: vec![0u8; WORD_BYTES + PAYLOAD],
        }
    }
}

impl<const PAYLOAD: usize> ChainedHash<PAYLOAD> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, payload: &[u8; PAYLOAD]) {
        self.buffer[WORD_BYTES..].copy_from_slice(payload);
        let digest = domain_hash(&self.buffer);
        self.buffer[..WORD_BYTES].copy_from_slice(&digest);
    }

    pub fn digest(&self) -> CommitmentHash {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.buffer[..WORD_BYTES]);
        out
    }
}

/// `g ‖ gx ‖ h` per slot.
pub type PrepHasher = ChainedHash<{ 3 * POINT_BYTES }>;

/// `x ‖ y` per commitment point.
pub type ShuffleHasher = ChainedHash<POINT_BYTES>;

pub fn prep_commitment_hash<'a, I>(entries: I) -> CommitmentHash
where
    I: IntoIterator<Item = &'a DeckPrepEntry>,
{
    let mut hasher = PrepHasher::new();
    for entry in entries {
        hasher.absorb(&prep_payload(&entry.g, &entry.gx, &entry.h));
    }
    hasher.digest()
}

pub fn prep_payload(g: &Point, gx: &Point, h: &Point) -> [u8; 3 * POINT_BYTES] {
    let mut payload = [0u8; 3 * POINT_BYTES];
    payload[..POINT_BYTES].copy_from_slice(&encode_point(g));
    payload[POINT_BYTES..2 * POINT_BYTES].copy_from_slice(&encode_point(gx));
    payload[2 * POINT_BYTES..].copy_from_slice(&encode_point(h));
    payload
}

/// Folds rounds in order, then slots in order.
pub fn shuffle_commitment_hash<R>(rounds: &[R]) -> CommitmentHash
where
    R: AsRef<[Point]>,
{
    let mut hasher = ShuffleHasher::new();
    for round in rounds {
        for point in round.as_ref() {
            hasher.absorb(&encode_point(point));
        }
    }
    hasher.digest()
}
