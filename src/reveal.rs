//! Opening cards: strip the last mask and name the base card underneath.

use ark_std::rand::{CryptoRng, RngCore};
use tracing::instrument;

use crate::chaum_pedersen::{ChaumPedersenProof, DlogEquality};
use crate::curve::{scalar_mul, Point};
use crate::encoding::{usize_word, Word};
use crate::engine::DeckEngine;
use crate::error::{DeckError, Result};
use crate::ledger::DeckLedger;
use crate::session::{CardIndex, TableSession};
use crate::store::SecretStore;

const LOG_TARGET: &str = "hodlem_deck::reveal";

/// A card opened in public: its deck position, the base card it unmasks to, and the proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardReveal {
    pub index: CardIndex,
    pub open_index: usize,
    pub proof: ChaumPedersenProof,
}

impl CardReveal {
    /// `[index, openIndex, gs.x, gs.y, hs.x, hs.y, scx]`
    pub fn abi_words(&self) -> [Word; 7] {
        let [gs_x, gs_y, hs_x, hs_y, scx] = self.proof.abi_words();
        [
            usize_word(self.index),
            usize_word(self.open_index),
            gs_x,
            gs_y,
            hs_x,
            hs_y,
            scx,
        ]
    }
}

/// Position of `point` among the base cards.
pub fn find_base_index(
    base_cards: &[Point],
    point: &Point,
    card_index: CardIndex,
) -> Result<usize> {
    base_cards
        .iter()
        .position(|base| base == point)
        .ok_or_else(|| {
            tracing::error!(target: LOG_TARGET, card_index, "card matches no base card");
            DeckError::CardNotFound { card_index }
        })
}

impl<L, S> DeckEngine<L, S>
where
    L: DeckLedger + ?Sized,
    S: SecretStore + ?Sized,
{
    /// Opens each card, proving the stripped layer was this seat's own mask.
    #[instrument(
        skip(self, session, rng),
        fields(deck_id = session.deck_id, seat = session.seat_index),
        level = "debug"
    )]
    pub async fn reveal_cards<R: RngCore + CryptoRng>(
        &self,
        session: &TableSession,
        card_indices: &[CardIndex],
        rng: &mut R,
    ) -> Result<Vec<CardReveal>> {
        let key = self.masking_key(session).await?;
        let base_cards = self.ledger().base_cards(session.deck_id).await?;

        let mut reveals = Vec::with_capacity(card_indices.len());
        for &index in card_indices {
            let hx = self
                .ledger()
                .last_partial_decrypt(session.deck_id, index)
                .await?;
            let open_index = find_base_index(&base_cards, &scalar_mul(&hx, &key.inverse), index)?;

            let statement = DlogEquality {
                g: key.g,
                h: base_cards[open_index],
                gx: key.gx,
                hx,
            };
            let proof = ChaumPedersenProof::prove(&key.secret, &statement, rng);
            if self.config().self_verify && !proof.verify(&statement) {
                return Err(DeckError::SelfCheck("reveal proof"));
            }
            tracing::debug!(target: LOG_TARGET, index, open_index, "card opened");
            reveals.push(CardReveal {
                index,
                open_index,
                proof,
            });
        }
        Ok(reveals)
    }

    /// Reads a card dealt to this seat without publishing anything.
    #[instrument(
        skip(self, session),
        fields(deck_id = session.deck_id, seat = session.seat_index),
        level = "debug"
    )]
    pub async fn peek_card(&self, session: &TableSession, card_index: CardIndex) -> Result<usize> {
        let key = self.masking_key(session).await?;
        let base_cards = self.ledger().base_cards(session.deck_id).await?;
        let point = self
            .ledger()
            .last_partial_decrypt(session.deck_id, card_index)
            .await?;
        find_base_index(&base_cards, &scalar_mul(&point, &key.inverse), card_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::random_point;
    use crate::test_support::SimulatedTable;
    use crate::verifier::verify_reveal;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn search_reports_the_card_it_could_not_place() {
        let mut rng = StdRng::seed_from_u64(60);
        let bases: Vec<Point> = (0..5).map(|_| random_point(&mut rng)).collect();
        assert_eq!(find_base_index(&bases, &bases[3], 9).unwrap(), 3);
        assert!(matches!(
            find_base_index(&bases, &random_point(&mut rng), 9),
            Err(DeckError::CardNotFound { card_index: 9 })
        ));
    }

    #[tokio::test]
    async fn single_seat_reveal_names_the_base_card() {
        let table = SimulatedTable::new(1, 61);
        table.shuffle_all(2).await;
        let session = table.session(0);
        let mut rng = StdRng::seed_from_u64(61);

        let reveal = table
            .engine(0)
            .reveal_cards(&session, &[5], &mut rng)
            .await
            .unwrap()[0];

        let permutation = table.shuffle_secret(0).permutation;
        assert_eq!(reveal.open_index, permutation.as_slice()[5]);

        let g = table.ledger.shuffle_base_for_seat(session.deck_id, 0).await.unwrap();
        let gx = table.ledger.shuffle_base_for_seat(session.deck_id, 1).await.unwrap();
        let hx = table.ledger.last_partial_decrypt(session.deck_id, 5).await.unwrap();
        let bases = table.base_cards();
        assert!(verify_reveal(&g, &gx, &bases, &hx, &reveal));

        let mut lie = reveal;
        lie.open_index = (reveal.open_index % 52) + 1;
        assert!(!verify_reveal(&g, &gx, &bases, &hx, &lie));
        assert_eq!(reveal.abi_words()[1], usize_word(reveal.open_index));
    }

    #[tokio::test]
    async fn corrupted_ledger_point_is_card_not_found() {
        let table = SimulatedTable::new(1, 62);
        table.shuffle_all(1).await;
        let session = table.session(0);
        let mut rng = StdRng::seed_from_u64(62);
        table
            .ledger
            .submit_decryption(session.deck_id, 8, random_point(&mut rng))
            .unwrap();

        assert!(matches!(
            table.engine(0).peek_card(&session, 8).await,
            Err(DeckError::CardNotFound { card_index: 8 })
        ));
        assert!(matches!(
            table.engine(0).reveal_cards(&session, &[8], &mut rng).await,
            Err(DeckError::CardNotFound { card_index: 8 })
        ));
    }
}
