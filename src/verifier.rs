//! Checks the contract runs on submitted values, reproduced off-chain.
//!
//! Peers use these to audit each other before disputing; the engine runs them on its own output
//! when `self_verify` is set.

use ark_ff::{BigInteger, Zero};
use thiserror::Error;

use crate::chaum_pedersen::DlogEquality;
use crate::commitment::{prep_payload, shuffle_commitment_hash, CommitmentHash, PrepHasher};
use crate::config::MAX_SECURITY;
use crate::curve::{scalar_mul, Point, DECK_SIZE};
use crate::decryption::DecryptionShare;
use crate::deck_prep::DeckPrepCard;
use crate::ledger::Challenge;
use crate::permutation::Permutation;
use crate::reveal::CardReveal;
use crate::shuffle::ShuffleResponse;

const LOG_TARGET: &str = "hodlem_deck::verifier";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShuffleVerifyError {
    #[error("{what} has {actual} entries, expected {expected}")]
    Length {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("verification rounds must be in 1..={MAX_SECURITY}, got {0}")]
    Rounds(usize),

    #[error("commitment does not match the published hash")]
    CommitmentHash,

    #[error("round {0} permutation is not a bijection")]
    Permutation(usize),

    #[error("round {round} does not open its commitment (bound: {bound})")]
    Opening { round: usize, bound: bool },

    #[error("padding round {0} is not zero")]
    Padding(usize),
}

pub fn verify_prep_card(card: &DeckPrepCard) -> bool {
    let valid = card.proof.verify(&card.statement());
    if !valid {
        tracing::warn!(target: LOG_TARGET, "deck preparation proof rejected");
    }
    valid
}

/// Recomputes the preparation hash from the revealed `g, gx, h` of every slot.
pub fn verify_prep_commitment(cards: &[DeckPrepCard], hash: &CommitmentHash) -> bool {
    if cards.len() != DECK_SIZE {
        return false;
    }
    let mut hasher = PrepHasher::new();
    for card in cards {
        hasher.absorb(&prep_payload(&card.g, &card.gx, &card.h));
    }
    hasher.digest() == *hash
}

/// Checks a challenge response against the deck the shuffler received and the deck it published.
///
/// Bit 0 rounds must satisfy `commitment[k][j] == cards[perm[j]]·s`; bit 1 rounds
/// `commitment[k][j] == prev_deck[perm[j]]·s`, the scalar there already carrying the shuffle
/// secret.
pub fn verify_shuffle_response(
    prev_deck: &[Point],
    cards: &[Point],
    commitment_hash: &CommitmentHash,
    challenge: &Challenge,
    verif_rounds: usize,
    response: &ShuffleResponse,
) -> Result<(), ShuffleVerifyError> {
    if verif_rounds == 0 || verif_rounds > MAX_SECURITY {
        return Err(ShuffleVerifyError::Rounds(verif_rounds));
    }
    check_len("previous deck", DECK_SIZE, prev_deck.len())?;
    check_len("shuffled deck", DECK_SIZE, cards.len())?;
    check_len("commitment", MAX_SECURITY, response.commitment.len())?;
    check_len("scalars", MAX_SECURITY, response.scalars.len())?;
    check_len("permutations", MAX_SECURITY, response.permutations.len())?;

    let opened = &response.commitment[..verif_rounds];
    if shuffle_commitment_hash(opened) != *commitment_hash {
        tracing::warn!(target: LOG_TARGET, "shuffle commitment hash mismatch");
        return Err(ShuffleVerifyError::CommitmentHash);
    }

    for round in 0..verif_rounds {
        let commitment = &response.commitment[round];
        check_len("commitment round", DECK_SIZE, commitment.len())?;
        let permutation = Permutation::try_new(response.permutations[round].clone())
            .ok()
            .filter(|p| p.len() == DECK_SIZE)
            .ok_or(ShuffleVerifyError::Permutation(round))?;

        let bound = challenge.get_bit(round);
        let source = if bound { prev_deck } else { cards };
        let scalar = &response.scalars[round];
        let opens = permutation
            .as_slice()
            .iter()
            .zip(commitment)
            .all(|(&index, committed)| scalar_mul(&source[index], scalar) == *committed);
        if !opens {
            tracing::warn!(target: LOG_TARGET, round, bound, "shuffle round failed to open");
            return Err(ShuffleVerifyError::Opening { round, bound });
        }
    }

    for round in verif_rounds..MAX_SECURITY {
        let zero = response.commitment[round].iter().all(|p| p.infinity)
            && response.scalars[round].is_zero()
            && response.permutations[round].iter().all(|&i| i == 0);
        if !zero {
            return Err(ShuffleVerifyError::Padding(round));
        }
    }
    Ok(())
}

/// `g` and `gx` are the shuffle bases of the decrypting seat and the seat after it.
pub fn verify_decryption(g: &Point, gx: &Point, before: &Point, share: &DecryptionShare) -> bool {
    match &share.proof {
        // Recipient passes the point through.
        None => share.card == *before,
        Some(proof) => {
            let statement = DlogEquality {
                g: *g,
                h: share.card,
                gx: *gx,
                hx: *before,
            };
            let valid = proof.verify(&statement);
            if !valid {
                tracing::warn!(target: LOG_TARGET, index = share.index, "decryption proof rejected");
            }
            valid
        }
    }
}

/// `hx` is the point the revealing seat stripped; the proof binds it to the claimed base card.
pub fn verify_reveal(
    g: &Point,
    gx: &Point,
    base_cards: &[Point],
    hx: &Point,
    reveal: &CardReveal,
) -> bool {
    let Some(h) = base_cards.get(reveal.open_index) else {
        return false;
    };
    let statement = DlogEquality {
        g: *g,
        h: *h,
        gx: *gx,
        hx: *hx,
    };
    let valid = reveal.proof.verify(&statement);
    if !valid {
        tracing::warn!(target: LOG_TARGET, index = reveal.index, "reveal proof rejected");
    }
    valid
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), ShuffleVerifyError> {
    if expected != actual {
        return Err(ShuffleVerifyError::Length {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{random_point, random_scalar};
    use crate::permutation::PermutationSampler;
    use crate::shuffle::{build_response, remask_and_permute, ShuffleRounds, ShuffleSecret};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    struct Fixture {
        prev: Vec<Point>,
        cards: Vec<Point>,
        hash: CommitmentHash,
        secret: ShuffleSecret,
        rounds: ShuffleRounds,
    }

    fn fixture(verif_rounds: usize, seed: u64) -> Fixture {
        let mut rng = StdRng::seed_from_u64(seed);
        let prev: Vec<Point> = (0..DECK_SIZE).map(|_| random_point(&mut rng)).collect();
        let secret = ShuffleSecret {
            secret: random_scalar(&mut rng),
            permutation: Permutation::random_deck(PermutationSampler::FisherYates, &mut rng),
        };
        let cards = remask_and_permute(&prev, &secret.secret, &secret.permutation).unwrap();
        let rounds = ShuffleRounds::generate(
            &cards,
            verif_rounds,
            PermutationSampler::FisherYates,
            &mut rng,
        )
        .unwrap();
        Fixture {
            hash: rounds.commitment_hash(),
            prev,
            cards,
            secret,
            rounds,
        }
    }

    #[test]
    fn honest_response_verifies_for_any_challenge() {
        let f = fixture(6, 40);
        for bits in [0u64, 0b101, 0b111111, 0b010010] {
            let challenge = Challenge::from(bits);
            let response = build_response(&f.secret, &f.rounds, &challenge).unwrap();
            assert_eq!(
                verify_shuffle_response(&f.prev, &f.cards, &f.hash, &challenge, 6, &response),
                Ok(())
            );
        }
    }

    #[test]
    fn swapped_card_is_caught_by_a_bound_round() {
        let f = fixture(4, 41);
        let mut forged = f.cards.clone();
        forged.swap(5, 6);
        // Shadows committed over the forged deck open fine; binding to the previous deck fails.
        let mut rng = StdRng::seed_from_u64(42);
        let rounds =
            ShuffleRounds::generate(&forged, 4, PermutationSampler::FisherYates, &mut rng).unwrap();
        let hash = rounds.commitment_hash();

        let shadow_only = Challenge::from(0u64);
        let response = build_response(&f.secret, &rounds, &shadow_only).unwrap();
        assert!(verify_shuffle_response(&f.prev, &forged, &hash, &shadow_only, 4, &response).is_ok());

        let bound = Challenge::from(0b0100u64);
        let response = build_response(&f.secret, &rounds, &bound).unwrap();
        assert_eq!(
            verify_shuffle_response(&f.prev, &forged, &hash, &bound, 4, &response),
            Err(ShuffleVerifyError::Opening {
                round: 2,
                bound: true
            })
        );
    }

    #[test]
    fn tampered_responses_are_rejected() {
        let f = fixture(3, 43);
        let challenge = Challenge::from(0b011u64);
        let honest = build_response(&f.secret, &f.rounds, &challenge).unwrap();

        let mut wrong_hash = f.hash;
        wrong_hash[0] ^= 1;
        assert_eq!(
            verify_shuffle_response(&f.prev, &f.cards, &wrong_hash, &challenge, 3, &honest),
            Err(ShuffleVerifyError::CommitmentHash)
        );

        let mut dirty_padding = honest.clone();
        dirty_padding.permutations[10][0] = 1;
        assert_eq!(
            verify_shuffle_response(&f.prev, &f.cards, &f.hash, &challenge, 3, &dirty_padding),
            Err(ShuffleVerifyError::Padding(10))
        );

        let mut repeated = honest.clone();
        repeated.permutations[1][1] = repeated.permutations[1][2];
        assert_eq!(
            verify_shuffle_response(&f.prev, &f.cards, &f.hash, &challenge, 3, &repeated),
            Err(ShuffleVerifyError::Permutation(1))
        );

        let mut short = honest;
        short.scalars.pop();
        assert!(matches!(
            verify_shuffle_response(&f.prev, &f.cards, &f.hash, &challenge, 3, &short),
            Err(ShuffleVerifyError::Length { what: "scalars", .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn shuffle_response_soundness(
            seed in any::<u64>(),
            bits in any::<u64>(),
            verif_rounds in 1usize..=8,
        ) {
            let f = fixture(verif_rounds, seed);
            let challenge = Challenge::from(bits);

            let honest = build_response(&f.secret, &f.rounds, &challenge).unwrap();
            prop_assert_eq!(
                verify_shuffle_response(&f.prev, &f.cards, &f.hash, &challenge, verif_rounds, &honest),
                Ok(())
            );

            // Shadow openings carry nothing of the real shuffle.
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
            let other = ShuffleSecret {
                secret: random_scalar(&mut rng),
                permutation: Permutation::random_deck(PermutationSampler::FisherYates, &mut rng),
            };
            let other_response = build_response(&other, &f.rounds, &challenge).unwrap();
            for round in (0..verif_rounds).filter(|&k| !challenge.get_bit(k)) {
                prop_assert_eq!(
                    honest.permutations[round].as_slice(),
                    f.rounds.permutations[round].as_slice()
                );
                prop_assert_eq!(&other_response.permutations[round], &honest.permutations[round]);
                prop_assert_eq!(other_response.scalars[round], honest.scalars[round]);
            }

            // Two swapped cards survive exactly the challenges that open no bound round.
            let first = 1 + (seed % 51) as usize;
            let mut forged = f.cards.clone();
            forged.swap(first, first + 1);
            let forged_rounds =
                ShuffleRounds::generate(&forged, verif_rounds, PermutationSampler::FisherYates, &mut rng)
                    .unwrap();
            let forged_hash = forged_rounds.commitment_hash();
            let response = build_response(&f.secret, &forged_rounds, &challenge).unwrap();
            let opens_bound_round = bits & ((1u64 << verif_rounds) - 1) != 0;
            prop_assert_eq!(
                verify_shuffle_response(&f.prev, &forged, &forged_hash, &challenge, verif_rounds, &response)
                    .is_err(),
                opens_bound_round
            );
        }
    }
}
