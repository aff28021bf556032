//! Progressive decryption: every seat strips its own mask from a dealt card and proves it.

use ark_std::rand::{CryptoRng, RngCore};
use tracing::instrument;

use crate::chaum_pedersen::{empty_proof_words, ChaumPedersenProof, DlogEquality};
use crate::curve::{mod_inverse, scalar_mul, Point, Scalar};
use crate::encoding::{point_words, usize_word, Word};
use crate::engine::DeckEngine;
use crate::error::{DeckError, Result};
use crate::ledger::DeckLedger;
use crate::session::{CardIndex, TableSession};
use crate::store::SecretStore;

const LOG_TARGET: &str = "hodlem_deck::decryption";

/// One seat's contribution to a card's decryption.
///
/// `proof` is `None` when the seat is the card's recipient: it forwards the point untouched and
/// keeps its own mask until it peeks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecryptionShare {
    pub index: CardIndex,
    pub card: Point,
    pub proof: Option<ChaumPedersenProof>,
}

impl DecryptionShare {
    /// `[index, x, y, gs.x, gs.y, hs.x, hs.y, scx]`
    pub fn abi_words(&self) -> [Word; 8] {
        let [x, y] = point_words(&self.card);
        let [gs_x, gs_y, hs_x, hs_y, scx] = match &self.proof {
            Some(proof) => proof.abi_words(),
            None => empty_proof_words(),
        };
        [usize_word(self.index), x, y, gs_x, gs_y, hs_x, hs_y, scx]
    }
}

impl<L, S> DeckEngine<L, S>
where
    L: DeckLedger + ?Sized,
    S: SecretStore + ?Sized,
{
    /// Strips this seat's mask from each requested card.
    ///
    /// The proof binds `(g, decrypt, gx, before)` where `g` and `gx` are the shuffle bases of this
    /// seat and the next one, so `gx = g^secret` is exactly this seat's shuffle contribution.
    #[instrument(
        skip(self, session, rng),
        fields(deck_id = session.deck_id, seat = session.seat_index),
        level = "debug"
    )]
    pub async fn decrypt_cards<R: RngCore + CryptoRng>(
        &self,
        session: &TableSession,
        card_indices: &[CardIndex],
        rng: &mut R,
    ) -> Result<Vec<DecryptionShare>> {
        let deck_id = session.deck_id;
        let mut shares = Vec::with_capacity(card_indices.len());
        let mut masking: Option<MaskingKey> = None;

        for &index in card_indices {
            let before = self.ledger().last_partial_decrypt(deck_id, index).await?;

            if session.owns_card(index) {
                tracing::debug!(target: LOG_TARGET, index, "own card, passing through");
                shares.push(DecryptionShare {
                    index,
                    card: before,
                    proof: None,
                });
                continue;
            }

            let key = match masking {
                Some(key) => key,
                None => {
                    let key = self.masking_key(session).await?;
                    masking = Some(key);
                    key
                }
            };

            let decrypt = scalar_mul(&before, &key.inverse);
            let statement = DlogEquality {
                g: key.g,
                h: decrypt,
                gx: key.gx,
                hx: before,
            };
            let proof = ChaumPedersenProof::prove(&key.secret, &statement, rng);
            if self.config().self_verify && !proof.verify(&statement) {
                return Err(DeckError::SelfCheck("decryption proof"));
            }
            shares.push(DecryptionShare {
                index,
                card: decrypt,
                proof: Some(proof),
            });
        }

        tracing::info!(
            target: LOG_TARGET,
            deck_id,
            cards = shares.len(),
            "partial decryptions produced"
        );
        Ok(shares)
    }

    /// Loads the shuffle secret and this seat's pair of shuffle bases.
    pub(crate) async fn masking_key(&self, session: &TableSession) -> Result<MaskingKey> {
        let secret = self.require_shuffle_secret(session).await?.secret;
        let inverse = mod_inverse(&secret)?;
        let g = self
            .ledger()
            .shuffle_base_for_seat(session.deck_id, session.seat_index)
            .await?;
        let gx = self
            .ledger()
            .shuffle_base_for_seat(session.deck_id, session.seat_index + 1)
            .await?;
        Ok(MaskingKey {
            secret,
            inverse,
            g,
            gx,
        })
    }
}

/// A seat's shuffle secret with the public bases that pin it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MaskingKey {
    pub secret: Scalar,
    pub inverse: Scalar,
    pub g: Point,
    pub gx: Point,
}
