//! Re-mask and permute the composite deck, with a cut-and-choose proof of the permutation.
//!
//! A shuffle publishes the new deck plus a hash over `verif_rounds` shadow decks, each the new
//! deck re-masked by its own scalar and permuted by its own permutation. Once the contract picks
//! a challenge, every round reveals either the shadow alone (bit 0) or the shadow bound to the
//! real shuffle (bit 1). A single round never discloses the real permutation; a dishonest shuffle
//! survives `k` rounds with probability `2^-k`.

use ark_ff::{BigInteger, Zero};
use ark_std::rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::commitment::{shuffle_commitment_hash, CommitmentHash};
use crate::config::{check_verif_rounds, MAX_SECURITY};
use crate::curve::{random_scalar, scalar_mul, Point, Scalar, DECK_SIZE};
use crate::encoding::{encode_scalar_as_bytes32, point_words, usize_word, Word};
use crate::engine::DeckEngine;
use crate::error::{DeckError, Result};
use crate::ledger::{Challenge, DeckLedger};
use crate::permutation::{Permutation, PermutationSampler};
use crate::session::TableSession;
use crate::store::SecretStore;
use crate::verifier::verify_shuffle_response;

const LOG_TARGET: &str = "hodlem_deck::shuffle";

/// The real shuffle: masking scalar and permutation applied to the incoming deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleSecret {
    #[serde(with = "crate::crypto_serde::scalar")]
    pub secret: Scalar,
    pub permutation: Permutation,
}

/// Shadow rounds committed to alongside the real shuffle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleRounds {
    #[serde(with = "crate::crypto_serde::scalar_vec")]
    pub secrets: Vec<Scalar>,
    pub permutations: Vec<Permutation>,
    /// `commitment[k][j] = cards[permutations[k][j]]·secrets[k]`
    #[serde(with = "crate::crypto_serde::point_rounds")]
    pub commitment: Vec<Vec<Point>>,
}

impl ShuffleRounds {
    pub fn generate<R: RngCore + CryptoRng>(
        cards: &[Point],
        verif_rounds: usize,
        sampler: PermutationSampler,
        rng: &mut R,
    ) -> Result<Self> {
        let mut secrets = Vec::with_capacity(verif_rounds);
        let mut permutations = Vec::with_capacity(verif_rounds);
        let mut commitment = Vec::with_capacity(verif_rounds);
        for _ in 0..verif_rounds {
            let secret = random_scalar(rng);
            let permutation = Permutation::random_shadow(sampler, rng);
            commitment.push(remask_and_permute(cards, &secret, &permutation)?);
            secrets.push(secret);
            permutations.push(permutation);
        }
        Ok(Self {
            secrets,
            permutations,
            commitment,
        })
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn commitment_hash(&self) -> CommitmentHash {
        shuffle_commitment_hash(&self.commitment)
    }

    /// Rejects rounds that [`ShuffleRounds::generate`] could not have produced: a count outside
    /// `1..=MAX_SECURITY`, parallel arrays of different lengths, or a round not covering the deck.
    pub fn validate(&self) -> Result<()> {
        check_verif_rounds(self.len())?;
        for (what, actual) in [
            ("permutations", self.permutations.len()),
            ("commitment", self.commitment.len()),
        ] {
            if actual != self.len() {
                return Err(DeckError::RoundsMismatch {
                    what,
                    expected: self.len(),
                    actual,
                });
            }
        }
        let widths = self
            .permutations
            .iter()
            .map(Permutation::len)
            .chain(self.commitment.iter().map(Vec::len));
        for actual in widths {
            if actual != DECK_SIZE {
                return Err(DeckError::DeckSize {
                    expected: DECK_SIZE,
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// What a shuffle publishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShuffleOutput {
    pub cards: Vec<Point>,
    pub commitment_hash: CommitmentHash,
}

impl ShuffleOutput {
    /// 53 coordinate pairs, then the commitment hash.
    pub fn abi_words(&self) -> Vec<Word> {
        let mut words: Vec<Word> = self.cards.iter().flat_map(point_words).collect();
        words.push(self.commitment_hash);
        words
    }
}

/// Answer to the contract's challenge, padded to [`MAX_SECURITY`] rounds.
///
/// Padding rounds hold identity points, a zero scalar and an all-zero index array, so
/// `permutations` is kept as raw indices rather than [`Permutation`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShuffleResponse {
    pub commitment: Vec<Vec<Point>>,
    pub scalars: Vec<Scalar>,
    pub permutations: Vec<Vec<usize>>,
}

impl ShuffleResponse {
    /// Commitment coordinates round by round, then the scalars, then the permutations.
    pub fn abi_words(&self) -> Vec<Word> {
        let commitment = self
            .commitment
            .iter()
            .flat_map(|round| round.iter().flat_map(point_words));
        let scalars = self.scalars.iter().map(encode_scalar_as_bytes32);
        let permutations = self
            .permutations
            .iter()
            .flat_map(|round| round.iter().map(|&index| usize_word(index)));
        commitment.chain(scalars).chain(permutations).collect()
    }
}

/// `output[k] = input[permutation[k]]·secret`
pub fn remask_and_permute(
    input: &[Point],
    secret: &Scalar,
    permutation: &Permutation,
) -> Result<Vec<Point>> {
    if input.len() != DECK_SIZE {
        return Err(DeckError::DeckSize {
            expected: DECK_SIZE,
            actual: input.len(),
        });
    }
    Ok(permutation
        .apply(input)?
        .iter()
        .map(|point| scalar_mul(point, secret))
        .collect())
}

/// Opens every committed round according to the challenge bits, least significant first.
pub fn build_response(
    secret: &ShuffleSecret,
    rounds: &ShuffleRounds,
    challenge: &Challenge,
) -> Result<ShuffleResponse> {
    rounds.validate()?;

    let mut commitment = Vec::with_capacity(MAX_SECURITY);
    let mut scalars = Vec::with_capacity(MAX_SECURITY);
    let mut permutations = Vec::with_capacity(MAX_SECURITY);

    let opened = rounds
        .secrets
        .iter()
        .zip(&rounds.permutations)
        .zip(&rounds.commitment)
        .enumerate();
    for (i, ((shadow_secret, shadow), round)) in opened {
        if challenge.get_bit(i) {
            scalars.push(secret.secret * shadow_secret);
            permutations.push(secret.permutation.compose(shadow)?.into_inner());
        } else {
            scalars.push(*shadow_secret);
            permutations.push(shadow.as_slice().to_vec());
        }
        commitment.push(round.clone());
    }

    while commitment.len() < MAX_SECURITY {
        commitment.push(vec![Point::identity(); DECK_SIZE]);
        scalars.push(Scalar::zero());
        permutations.push(vec![0; DECK_SIZE]);
    }

    Ok(ShuffleResponse {
        commitment,
        scalars,
        permutations,
    })
}

impl<L, S> DeckEngine<L, S>
where
    L: DeckLedger + ?Sized,
    S: SecretStore + ?Sized,
{
    /// Shuffles the ledger's latest deck with a freshly sampled permutation.
    pub async fn shuffle<R: RngCore + CryptoRng>(
        &self,
        session: &TableSession,
        rng: &mut R,
    ) -> Result<ShuffleOutput> {
        let permutation = Permutation::random_deck(self.config().permutation_sampler, rng);
        self.shuffle_with(session, permutation, rng).await
    }

    /// Shuffles with a caller-chosen order of the 52 playable positions (values `1..=52`).
    pub async fn shuffle_with_permutation<R: RngCore + CryptoRng>(
        &self,
        session: &TableSession,
        order: Vec<usize>,
        rng: &mut R,
    ) -> Result<ShuffleOutput> {
        let permutation = Permutation::from_playable(order)?;
        self.shuffle_with(session, permutation, rng).await
    }

    #[instrument(
        skip(self, session, permutation, rng),
        fields(deck_id = session.deck_id, seat = session.seat_index, rounds = session.verif_rounds),
        level = "debug"
    )]
    async fn shuffle_with<R: RngCore + CryptoRng>(
        &self,
        session: &TableSession,
        permutation: Permutation,
        rng: &mut R,
    ) -> Result<ShuffleOutput> {
        check_verif_rounds(session.verif_rounds)?;

        let secret = ShuffleSecret {
            secret: random_scalar(rng),
            permutation,
        };
        let last_cards = self.ledger().last_shuffle_deck(session.deck_id).await?;
        let cards = remask_and_permute(&last_cards, &secret.secret, &secret.permutation)?;

        let rounds = ShuffleRounds::generate(
            &cards,
            session.verif_rounds,
            self.config().permutation_sampler,
            rng,
        )?;
        let commitment_hash = rounds.commitment_hash();

        if self.config().self_verify {
            self_check(&last_cards, &cards, &commitment_hash, &secret, &rounds)?;
        }

        self.store()
            .put_shuffle(&session.key(), secret, rounds)
            .await?;

        tracing::info!(
            target: LOG_TARGET,
            deck_id = session.deck_id,
            seat = session.seat_index,
            commitment = %hex::encode(commitment_hash),
            "deck shuffled"
        );
        Ok(ShuffleOutput {
            cards,
            commitment_hash,
        })
    }

    /// Answers the contract's challenge for this seat over the persisted rounds.
    #[instrument(
        skip(self, session),
        fields(deck_id = session.deck_id, seat = session.seat_index),
        level = "debug"
    )]
    pub async fn verify_shuffle(&self, session: &TableSession) -> Result<ShuffleResponse> {
        let secret = self.require_shuffle_secret(session).await?;
        let rounds = self.require_shuffle_rounds(session).await?;
        let challenge = self
            .ledger()
            .verification_challenge(session.deck_id, session.seat_index)
            .await?;

        let bound = (0..rounds.len()).filter(|&i| challenge.get_bit(i)).count();
        tracing::debug!(
            target: LOG_TARGET,
            rounds = rounds.len(),
            bound,
            "opening shuffle rounds"
        );
        build_response(&secret, &rounds, &challenge)
    }
}

/// Opens the rounds under the two extreme challenges and runs the verifier on both.
fn self_check(
    last_cards: &[Point],
    cards: &[Point],
    commitment_hash: &CommitmentHash,
    secret: &ShuffleSecret,
    rounds: &ShuffleRounds,
) -> Result<()> {
    for challenge in [Challenge::from(0u64), Challenge::new([u64::MAX; 4])] {
        let response = build_response(secret, rounds, &challenge)?;
        if let Err(err) = verify_shuffle_response(
            last_cards,
            cards,
            commitment_hash,
            &challenge,
            rounds.len(),
            &response,
        ) {
            tracing::warn!(target: LOG_TARGET, %err, "shuffle failed its own verification");
            return Err(DeckError::SelfCheck("shuffle response"));
        }
    }
    Ok(())
}
