use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::curve::{Point, DECK_SIZE};
use crate::encoding::{bigint_to_bytes32, bytes32_to_bigint, hex_to_array, word_to_hex};
use crate::session::{CardIndex, DeckId, SeatIndex};

use super::{Challenge, DeckLedger, LedgerError};

const LOG_TARGET: &str = "hodlem_deck::ledger::in_memory";

#[derive(Clone, Debug, Default)]
struct DeckRecord {
    base_cards: Vec<Point>,
    /// `shuffles[0]` is the base deck, `shuffles[i + 1]` the output of seat `i`.
    shuffles: Vec<Vec<Point>>,
    challenges: HashMap<SeatIndex, Challenge>,
    decryptions: HashMap<CardIndex, Point>,
}

/// Contract double holding deck state in memory.
///
/// It accepts whatever is submitted; callers that want the contract's checks run the
/// [`crate::verifier`] functions before submitting.
#[derive(Clone, Default)]
pub struct InMemoryDeckLedger {
    inner: Arc<RwLock<HashMap<DeckId, DeckRecord>>>,
}

impl InMemoryDeckLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_deck(&self, deck_id: DeckId, base_cards: Vec<Point>) -> Result<(), LedgerError> {
        check_len(&base_cards)?;
        let record = DeckRecord {
            shuffles: vec![base_cards.clone()],
            base_cards,
            ..DeckRecord::default()
        };
        self.inner.write().insert(deck_id, record);
        tracing::debug!(target: LOG_TARGET, deck_id, "created deck");
        Ok(())
    }

    pub fn submit_shuffle(&self, deck_id: DeckId, cards: Vec<Point>) -> Result<(), LedgerError> {
        check_len(&cards)?;
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(&deck_id)
            .ok_or(LedgerError::UnknownDeck(deck_id))?;
        record.shuffles.push(cards);
        record.decryptions.clear();
        tracing::debug!(
            target: LOG_TARGET,
            deck_id,
            shuffles = record.shuffles.len() - 1,
            "accepted shuffle"
        );
        Ok(())
    }

    pub fn set_challenge(
        &self,
        deck_id: DeckId,
        seat: SeatIndex,
        challenge: Challenge,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(&deck_id)
            .ok_or(LedgerError::UnknownDeck(deck_id))?;
        record.challenges.insert(seat, challenge);
        Ok(())
    }

    pub fn submit_decryption(
        &self,
        deck_id: DeckId,
        card_index: CardIndex,
        point: Point,
    ) -> Result<(), LedgerError> {
        if card_index >= DECK_SIZE {
            return Err(LedgerError::UnknownCard {
                deck_id,
                card_index,
            });
        }
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(&deck_id)
            .ok_or(LedgerError::UnknownDeck(deck_id))?;
        record.decryptions.insert(card_index, point);
        Ok(())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.inner.read();
        let decks = inner
            .iter()
            .map(|(deck_id, record)| {
                let mut challenges: Vec<ChallengeEntry> = record
                    .challenges
                    .iter()
                    .map(|(seat, challenge)| ChallengeEntry {
                        seat: *seat,
                        challenge: word_to_hex(&bigint_to_bytes32(challenge)),
                    })
                    .collect();
                challenges.sort_by_key(|entry| entry.seat);
                let mut decryptions: Vec<DecryptionEntry> = record
                    .decryptions
                    .iter()
                    .map(|(card_index, point)| DecryptionEntry {
                        card_index: *card_index,
                        point: *point,
                    })
                    .collect();
                decryptions.sort_by_key(|entry| entry.card_index);
                let snapshot = DeckSnapshot {
                    base_cards: record.base_cards.clone(),
                    shuffles: record.shuffles.clone(),
                    challenges,
                    decryptions,
                };
                (*deck_id, snapshot)
            })
            .collect();
        LedgerSnapshot { decks }
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        let mut decks = HashMap::new();
        for (deck_id, deck) in snapshot.decks {
            check_len(&deck.base_cards)?;
            for shuffle in &deck.shuffles {
                check_len(shuffle)?;
            }
            let mut challenges = HashMap::new();
            for entry in deck.challenges {
                let bytes = hex_to_array::<32>(&entry.challenge)
                    .map_err(|err| LedgerError::Transport(err.into()))?;
                challenges.insert(entry.seat, bytes32_to_bigint(&bytes));
            }
            let shuffles = if deck.shuffles.is_empty() {
                vec![deck.base_cards.clone()]
            } else {
                deck.shuffles
            };
            decks.insert(
                deck_id,
                DeckRecord {
                    base_cards: deck.base_cards,
                    shuffles,
                    challenges,
                    decryptions: deck
                        .decryptions
                        .into_iter()
                        .map(|entry| (entry.card_index, entry.point))
                        .collect(),
                },
            );
        }
        Ok(Self {
            inner: Arc::new(RwLock::new(decks)),
        })
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|err| LedgerError::Transport(err.into()))?;
        let snapshot: LedgerSnapshot =
            serde_json::from_str(&contents).map_err(|err| LedgerError::Transport(err.into()))?;
        Self::from_snapshot(snapshot)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|err| LedgerError::Transport(err.into()))?;
        std::fs::write(path.as_ref(), json).map_err(|err| LedgerError::Transport(err.into()))
    }

    fn with_deck<T>(
        &self,
        deck_id: DeckId,
        f: impl FnOnce(&DeckRecord) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let inner = self.inner.read();
        let record = inner.get(&deck_id).ok_or(LedgerError::UnknownDeck(deck_id))?;
        f(record)
    }
}

fn check_len(cards: &[Point]) -> Result<(), LedgerError> {
    if cards.len() != DECK_SIZE {
        return Err(LedgerError::Malformed {
            expected: DECK_SIZE,
            actual: cards.len(),
        });
    }
    Ok(())
}

#[async_trait]
impl DeckLedger for InMemoryDeckLedger {
    async fn last_shuffle_deck(&self, deck_id: DeckId) -> Result<Vec<Point>, LedgerError> {
        self.with_deck(deck_id, |record| {
            record
                .shuffles
                .last()
                .cloned()
                .ok_or(LedgerError::UnknownDeck(deck_id))
        })
    }

    async fn base_cards(&self, deck_id: DeckId) -> Result<Vec<Point>, LedgerError> {
        self.with_deck(deck_id, |record| Ok(record.base_cards.clone()))
    }

    async fn shuffle_base_for_seat(
        &self,
        deck_id: DeckId,
        seat: SeatIndex,
    ) -> Result<Point, LedgerError> {
        self.with_deck(deck_id, |record| {
            record
                .shuffles
                .get(seat)
                .map(|deck| deck[0])
                .ok_or(LedgerError::UnknownSeat { deck_id, seat })
        })
    }

    async fn last_partial_decrypt(
        &self,
        deck_id: DeckId,
        card_index: CardIndex,
    ) -> Result<Point, LedgerError> {
        self.with_deck(deck_id, |record| {
            if let Some(point) = record.decryptions.get(&card_index) {
                return Ok(*point);
            }
            record
                .shuffles
                .last()
                .and_then(|deck| deck.get(card_index).copied())
                .ok_or(LedgerError::UnknownCard {
                    deck_id,
                    card_index,
                })
        })
    }

    async fn verification_challenge(
        &self,
        deck_id: DeckId,
        seat: SeatIndex,
    ) -> Result<Challenge, LedgerError> {
        self.with_deck(deck_id, |record| {
            record
                .challenges
                .get(&seat)
                .copied()
                .ok_or(LedgerError::NoChallenge { deck_id, seat })
        })
    }
}

/// JSON form of the whole ledger, used to hand contract state to the CLI.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub decks: BTreeMap<DeckId, DeckSnapshot>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeckSnapshot {
    #[serde(with = "crate::crypto_serde::point_vec")]
    pub base_cards: Vec<Point>,
    #[serde(with = "crate::crypto_serde::point_rounds", default)]
    pub shuffles: Vec<Vec<Point>>,
    #[serde(default)]
    pub challenges: Vec<ChallengeEntry>,
    #[serde(default)]
    pub decryptions: Vec<DecryptionEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeEntry {
    pub seat: SeatIndex,
    /// 0x-prefixed 32-byte big-endian word.
    pub challenge: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecryptionEntry {
    pub card_index: CardIndex,
    #[serde(with = "crate::crypto_serde::point")]
    pub point: Point,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{random_point, scalar_mul, random_scalar};
    use rand::{rngs::StdRng, SeedableRng};

    fn deck(rng: &mut StdRng) -> Vec<Point> {
        (0..DECK_SIZE).map(|_| random_point(rng)).collect()
    }

    #[tokio::test]
    async fn shuffle_bases_follow_submission_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let ledger = InMemoryDeckLedger::new();
        let base = deck(&mut rng);
        ledger.new_deck(7, base.clone()).unwrap();

        let x = random_scalar(&mut rng);
        let masked: Vec<Point> = base.iter().map(|p| scalar_mul(p, &x)).collect();
        ledger.submit_shuffle(7, masked.clone()).unwrap();

        assert_eq!(ledger.shuffle_base_for_seat(7, 0).await.unwrap(), base[0]);
        assert_eq!(ledger.shuffle_base_for_seat(7, 1).await.unwrap(), masked[0]);
        assert!(matches!(
            ledger.shuffle_base_for_seat(7, 2).await,
            Err(LedgerError::UnknownSeat { seat: 2, .. })
        ));
        assert_eq!(ledger.last_shuffle_deck(7).await.unwrap(), masked);
    }

    #[tokio::test]
    async fn partial_decrypt_defaults_to_final_deck() {
        let mut rng = StdRng::seed_from_u64(2);
        let ledger = InMemoryDeckLedger::new();
        let base = deck(&mut rng);
        ledger.new_deck(1, base.clone()).unwrap();
        assert_eq!(ledger.last_partial_decrypt(1, 5).await.unwrap(), base[5]);

        let p = random_point(&mut rng);
        ledger.submit_decryption(1, 5, p).unwrap();
        assert_eq!(ledger.last_partial_decrypt(1, 5).await.unwrap(), p);
        assert!(ledger.last_partial_decrypt(1, 53).await.is_err());
    }

    #[tokio::test]
    async fn missing_values_are_errors_not_defaults() {
        let ledger = InMemoryDeckLedger::new();
        assert!(matches!(
            ledger.base_cards(3).await,
            Err(LedgerError::UnknownDeck(3))
        ));
        let mut rng = StdRng::seed_from_u64(3);
        ledger.new_deck(3, deck(&mut rng)).unwrap();
        assert!(matches!(
            ledger.verification_challenge(3, 0).await,
            Err(LedgerError::NoChallenge { seat: 0, .. })
        ));
        assert!(matches!(
            ledger.new_deck(4, vec![]),
            Err(LedgerError::Malformed { actual: 0, .. })
        ));
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_json() {
        let mut rng = StdRng::seed_from_u64(4);
        let ledger = InMemoryDeckLedger::new();
        ledger.new_deck(2, deck(&mut rng)).unwrap();
        ledger.set_challenge(2, 1, Challenge::from(0b1011u64)).unwrap();
        ledger.submit_decryption(2, 9, random_point(&mut rng)).unwrap();

        let json = serde_json::to_string(&ledger.snapshot()).unwrap();
        let restored =
            InMemoryDeckLedger::from_snapshot(serde_json::from_str(&json).unwrap()).unwrap();

        assert_eq!(
            restored.verification_challenge(2, 1).await.unwrap(),
            Challenge::from(0b1011u64)
        );
        assert_eq!(
            restored.last_partial_decrypt(2, 9).await.unwrap(),
            ledger.last_partial_decrypt(2, 9).await.unwrap()
        );
        assert_eq!(
            restored.last_shuffle_deck(2).await.unwrap(),
            ledger.last_shuffle_deck(2).await.unwrap()
        );
    }
}
