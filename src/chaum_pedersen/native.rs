use ark_ff::Zero;
use ark_std::rand::{CryptoRng, RngCore};

use crate::curve::{hash_to_scalar, random_scalar, scalar_mul, Point, Scalar};
use crate::encoding::{encode_point, encode_scalar_as_bytes32, point_words, Word, POINT_BYTES};

const LOG_TARGET: &str = "hodlem_deck::chaum_pedersen";

/// Public side of a discrete-log equality claim: `gx = g^x` and `hx = h^x` for one secret `x`.
///
/// Field order is the order in which the points are hashed into the challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DlogEquality {
    pub g: Point,
    pub h: Point,
    pub gx: Point,
    pub hx: Point,
}

/// Chaum-Pedersen proof for proving equality of discrete logarithms
///
/// Non-interactive via Fiat-Shamir over the six points `g ‖ h ‖ gx ‖ hx ‖ gs ‖ hs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChaumPedersenProof {
    /// First commitment: gs = g^s
    pub gs: Point,
    /// Second commitment: hs = h^s
    pub hs: Point,
    /// Response: scx = s + c·secret mod n
    pub scx: Scalar,
}

impl ChaumPedersenProof {
    /// Proves knowledge of `secret` with `statement.gx = g^secret` and `statement.hx = h^secret`.
    ///
    /// Each call draws its own nonce `s`, so two proofs of the same statement differ.
    pub fn prove<R: RngCore + CryptoRng>(
        secret: &Scalar,
        statement: &DlogEquality,
        rng: &mut R,
    ) -> Self {
        let s = random_scalar(rng);
        let gs = scalar_mul(&statement.g, &s);
        let hs = scalar_mul(&statement.h, &s);

        let challenge = compute_challenge(statement, &gs, &hs);
        tracing::trace!(target: LOG_TARGET, %challenge, "computed Fiat-Shamir challenge");

        Self {
            gs,
            hs,
            scx: s + challenge * secret,
        }
    }

    /// Checks `g^scx == gs·gx^c` and `h^scx == hs·hx^c`.
    pub fn verify(&self, statement: &DlogEquality) -> bool {
        let challenge = compute_challenge(statement, &self.gs, &self.hs);

        let lhs1 = statement.g * self.scx;
        let rhs1 = statement.gx * challenge + self.gs;
        let check1 = lhs1 == rhs1;

        let lhs2 = statement.h * self.scx;
        let rhs2 = statement.hx * challenge + self.hs;
        let check2 = lhs2 == rhs2;

        tracing::debug!(target: LOG_TARGET, check1, check2, "Chaum-Pedersen verification");
        check1 && check2
    }

    /// `[gs.x, gs.y, hs.x, hs.y, scx]`
    pub fn abi_words(&self) -> [Word; 5] {
        let [gs_x, gs_y] = point_words(&self.gs);
        let [hs_x, hs_y] = point_words(&self.hs);
        [gs_x, gs_y, hs_x, hs_y, encode_scalar_as_bytes32(&self.scx)]
    }
}

/// The five zero words sent in place of a proof for a card the caller already owns.
pub fn empty_proof_words() -> [Word; 5] {
    let zero = encode_scalar_as_bytes32(&Scalar::zero());
    [zero; 5]
}

/// `c = H(g ‖ h ‖ gx ‖ hx ‖ gs ‖ hs)` reduced modulo the group order.
pub fn compute_challenge(statement: &DlogEquality, gs: &Point, hs: &Point) -> Scalar {
    let mut transcript = [0u8; 6 * POINT_BYTES];
    let points = [
        &statement.g,
        &statement.h,
        &statement.gx,
        &statement.hx,
        gs,
        hs,
    ];
    for (i, point) in points.into_iter().enumerate() {
        transcript[i * POINT_BYTES..(i + 1) * POINT_BYTES].copy_from_slice(&encode_point(point));
    }
    hash_to_scalar(&transcript)
}
