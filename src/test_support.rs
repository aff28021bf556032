//! Shared fixtures: a simulated table where every seat runs its own engine against one ledger.

use std::fmt::Debug;
use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};

use crate::curve::{random_point, Point, DECK_SIZE};
use crate::engine::DeckEngine;
use crate::ledger::InMemoryDeckLedger;
use crate::session::{CardIndex, DeckId, SeatIndex, TableSession};
use crate::shuffle::{ShuffleOutput, ShuffleSecret};
use crate::store::InMemorySecretStore;

pub const TABLE_ID: u64 = 1;
pub const DECK_ID: DeckId = 11;

pub type TestEngine = DeckEngine<InMemoryDeckLedger, InMemorySecretStore>;

pub fn address(seat: SeatIndex) -> String {
    format!("0x{:040x}", seat + 1)
}

pub fn session(seat: SeatIndex) -> TableSession {
    TableSession::new(address(seat), TABLE_ID, DECK_ID, seat, 3)
}

/// Engine over an empty ledger, for operations that never read it.
pub fn engine_with(store: InMemorySecretStore) -> TestEngine {
    DeckEngine::new(Arc::new(InMemoryDeckLedger::new()), Arc::new(store))
}

pub fn random_deck(rng: &mut StdRng) -> Vec<Point> {
    (0..DECK_SIZE).map(|_| random_point(rng)).collect()
}

/// Assert that a value survives a serde_json round-trip using structural equality.
pub fn assert_round_trip_eq<T>(value: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + Debug,
{
    let json = serde_json::to_string(value)
        .expect("serialization should succeed during round-trip testing");
    let restored: T = serde_json::from_str(&json)
        .expect("deserialization should succeed during round-trip testing");
    assert_eq!(restored, *value, "serde_json round-trip altered the value");
}

pub struct SimulatedTable {
    pub ledger: Arc<InMemoryDeckLedger>,
    stores: Vec<InMemorySecretStore>,
    sessions: Vec<TableSession>,
    base_cards: Vec<Point>,
    seed: u64,
}

impl SimulatedTable {
    pub fn new(seats: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let base_cards = random_deck(&mut rng);
        let ledger = Arc::new(InMemoryDeckLedger::new());
        ledger
            .new_deck(DECK_ID, base_cards.clone())
            .expect("fresh deck has the right size");
        Self {
            ledger,
            stores: (0..seats).map(|_| InMemorySecretStore::new()).collect(),
            sessions: (0..seats).map(session).collect(),
            base_cards,
            seed,
        }
    }

    pub fn seats(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, seat: SeatIndex) -> TableSession {
        self.sessions[seat].clone()
    }

    pub fn store(&self, seat: SeatIndex) -> &InMemorySecretStore {
        &self.stores[seat]
    }

    pub fn engine(&self, seat: SeatIndex) -> TestEngine {
        DeckEngine::new(Arc::clone(&self.ledger), Arc::new(self.stores[seat].clone()))
    }

    pub fn base_cards(&self) -> Vec<Point> {
        self.base_cards.clone()
    }

    pub fn rng(&self, salt: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_mul(1_000_003).wrapping_add(salt))
    }

    pub fn shuffle_secret(&self, seat: SeatIndex) -> ShuffleSecret {
        self.stores[seat]
            .table(&self.sessions[seat].key())
            .and_then(|table| table.shuffle)
            .expect("seat has shuffled")
    }

    /// Every seat shuffles in order, each output submitted before the next seat reads it.
    pub async fn shuffle_all(&self, verif_rounds: usize) -> Vec<ShuffleOutput> {
        let mut outputs = Vec::with_capacity(self.seats());
        for seat in 0..self.seats() {
            let mut session = self.session(seat);
            session.verif_rounds = verif_rounds;
            let mut rng = self.rng(seat as u64);
            let output = self
                .engine(seat)
                .shuffle(&session, &mut rng)
                .await
                .expect("honest shuffle succeeds");
            self.ledger
                .submit_shuffle(DECK_ID, output.cards.clone())
                .expect("ledger accepts a full deck");
            outputs.push(output);
        }
        outputs
    }

    /// Records `recipient` as the owner of `card` in every seat's session.
    pub fn deal(&mut self, card: CardIndex, recipient: SeatIndex) {
        for session in &mut self.sessions {
            session.assign_draw(card, recipient);
        }
    }

    /// Every seat except `keeper` strips its mask from `card` and submits the result.
    pub async fn decrypt_for(&self, card: CardIndex, keeper: SeatIndex) {
        for seat in (0..self.seats()).filter(|&seat| seat != keeper) {
            let mut rng = self.rng(100 + seat as u64);
            let shares = self
                .engine(seat)
                .decrypt_cards(&self.session(seat), &[card], &mut rng)
                .await
                .expect("seat has shuffled");
            self.ledger
                .submit_decryption(DECK_ID, card, shares[0].card)
                .expect("card index is in range");
        }
    }
}
