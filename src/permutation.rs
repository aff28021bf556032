//! Deck permutations and their sampling.

use ark_std::rand::{seq::SliceRandom, CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::curve::{DECK_SIZE, PLAYABLE_CARDS};
use crate::error::DeckError;

/// How a permutation is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermutationSampler {
    /// Fisher-Yates with `j` uniform over `[0, i]`: every permutation equally likely.
    #[default]
    FisherYates,
    /// Swap partner drawn from `[0, i)`: only single-cycle permutations.
    /// Kept for parity with verifiers tested against that distribution.
    Sattolo,
}

impl PermutationSampler {
    pub fn shuffle<T, R: RngCore + CryptoRng>(&self, items: &mut [T], rng: &mut R) {
        match self {
            PermutationSampler::FisherYates => items.shuffle(rng),
            PermutationSampler::Sattolo => {
                for i in (1..items.len()).rev() {
                    let j = rng.gen_range(0..i);
                    items.swap(i, j);
                }
            }
        }
    }
}

/// A bijection on `0..len`, applied as `output[k] = input[self[k]]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Permutation(Vec<usize>);

impl Permutation {
    pub fn identity(len: usize) -> Self {
        Self((0..len).collect())
    }

    pub fn try_new(indices: Vec<usize>) -> Result<Self, DeckError> {
        let mut seen = vec![false; indices.len()];
        for &index in &indices {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(DeckError::InvalidPermutation(format!(
                        "index {index} appears twice"
                    )))
                }
                None => {
                    return Err(DeckError::InvalidPermutation(format!(
                        "index {index} out of range for length {}",
                        indices.len()
                    )))
                }
            }
        }
        Ok(Self(indices))
    }

    /// The real shuffle of a player: the 52 playable slots permuted, slot 0 pinned.
    pub fn random_deck<R: RngCore + CryptoRng>(sampler: PermutationSampler, rng: &mut R) -> Self {
        let mut playable: Vec<usize> = (1..=PLAYABLE_CARDS).collect();
        sampler.shuffle(&mut playable, rng);
        Self::with_flag_slot(playable)
    }

    /// A shadow permutation over all 53 slots, slot 0 included.
    pub fn random_shadow<R: RngCore + CryptoRng>(sampler: PermutationSampler, rng: &mut R) -> Self {
        let mut all: Vec<usize> = (0..DECK_SIZE).collect();
        sampler.shuffle(&mut all, rng);
        Self(all)
    }

    /// Builds a deck permutation from the 52 playable positions (values `1..=52`).
    pub fn from_playable(order: Vec<usize>) -> Result<Self, DeckError> {
        if order.len() != PLAYABLE_CARDS {
            return Err(DeckError::InvalidPermutation(format!(
                "expected {PLAYABLE_CARDS} playable positions, got {}",
                order.len()
            )));
        }
        let permutation = Self::with_flag_slot(order);
        Self::try_new(permutation.0)
    }

    fn with_flag_slot(playable: Vec<usize>) -> Self {
        let mut indices = Vec::with_capacity(playable.len() + 1);
        indices.push(0);
        indices.extend(playable);
        Self(indices)
    }

    /// `result[j] = self[inner[j]]`.
    pub fn compose(&self, inner: &Permutation) -> Result<Self, DeckError> {
        if self.len() != inner.len() {
            return Err(DeckError::InvalidPermutation(format!(
                "cannot compose lengths {} and {}",
                self.len(),
                inner.len()
            )));
        }
        Ok(Self(inner.0.iter().map(|&j| self.0[j]).collect()))
    }

    pub fn apply<T: Clone>(&self, input: &[T]) -> Result<Vec<T>, DeckError> {
        if input.len() != self.len() {
            return Err(DeckError::DeckSize {
                expected: self.len(),
                actual: input.len(),
            });
        }
        Ok(self.0.iter().map(|&i| input[i].clone()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = DeckError;

    fn try_from(indices: Vec<usize>) -> Result<Self, Self::Error> {
        Self::try_new(indices)
    }
}

impl From<Permutation> for Vec<usize> {
    fn from(permutation: Permutation) -> Self {
        permutation.0
    }
}

impl AsRef<[usize]> for Permutation {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}
