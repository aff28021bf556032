//! BN254 group adapter.
//!
//! Every protocol value lives in the G1 group of BN254: masked cards, shuffle bases and proof
//! commitments are [`Point`]s, secrets and challenges are [`Scalar`]s modulo the group order.
//! The domain hash is SHA-256, the hash the on-chain verifier recomputes.

use ark_bn254::{Fq, Fr, G1Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, PrimeField, UniformRand, Zero};
use ark_std::rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::DeckError;

pub type Point = G1Affine;
pub type Scalar = Fr;
pub type Coordinate = Fq;

/// Number of slots in a deck: slot 0 is the flag/base slot, 1..=52 are playable cards.
pub const DECK_SIZE: usize = 53;

/// Number of playable cards.
pub const PLAYABLE_CARDS: usize = DECK_SIZE - 1;

/// Uniform scalar in `[1, n)`.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let candidate = Scalar::rand(rng);
        if !candidate.is_zero() {
            return candidate;
        }
    }
}

/// Independent generator `G·r` for a fresh `r`. The discrete log is discarded by the caller.
pub fn random_point<R: RngCore + CryptoRng>(rng: &mut R) -> Point {
    scalar_mul(&Point::generator(), &random_scalar(rng))
}

pub fn scalar_mul(point: &Point, scalar: &Scalar) -> Point {
    (*point * scalar).into_affine()
}

pub fn domain_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Interprets a digest as a big-endian integer reduced modulo the group order.
pub fn hash_to_scalar(bytes: &[u8]) -> Scalar {
    Scalar::from_be_bytes_mod_order(&domain_hash(bytes))
}

pub fn mod_inverse(scalar: &Scalar) -> Result<Scalar, DeckError> {
    scalar.inverse().ok_or(DeckError::NotInvertible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::test_rng;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn random_scalars_are_nonzero_and_fresh() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = random_scalar(&mut rng);
        let b = random_scalar(&mut rng);
        assert!(!a.is_zero());
        assert_ne!(a, b);
    }

    #[test]
    fn random_points_are_on_curve() {
        let mut rng = StdRng::seed_from_u64(11);
        let p = random_point(&mut rng);
        assert!(p.is_on_curve());
        assert!(!p.is_zero());
    }

    #[test]
    fn inverse_strips_a_mask() {
        let mut rng = test_rng();
        let card = Point::rand(&mut rng);
        let x = Scalar::rand(&mut rng);
        let masked = scalar_mul(&card, &x);
        let unmasked = scalar_mul(&masked, &mod_inverse(&x).unwrap());
        assert_eq!(unmasked, card);
    }

    #[test]
    fn zero_has_no_inverse() {
        assert!(matches!(
            mod_inverse(&Scalar::zero()),
            Err(DeckError::NotInvertible)
        ));
    }

    #[test]
    fn domain_hash_is_sha256() {
        // sha256("abc")
        assert_eq!(
            hex::encode(domain_hash(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
