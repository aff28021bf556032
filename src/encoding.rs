//! Fixed-width big-endian encodings.
//!
//! These byte layouts are hashed into every commitment and challenge, so they must match the
//! on-chain verifier bit for bit: a scalar is 32 bytes, a point is its affine `x ‖ y`.

use ark_ff::{BigInt, BigInteger, PrimeField, Zero};
use thiserror::Error;

use crate::curve::{Coordinate, Point, Scalar};

pub const WORD_BYTES: usize = 32;
pub const POINT_BYTES: usize = 2 * WORD_BYTES;

/// One 256-bit ABI word.
pub type Word = [u8; WORD_BYTES];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("value is not reduced below the modulus")]
    NotCanonical,

    #[error("coordinates are not on the curve")]
    NotOnCurve,

    #[error("invalid hex: {0}")]
    Hex(String),
}

/// Reads 32 big-endian bytes as a 256-bit integer.
pub fn bytes32_to_bigint(bytes: &Word) -> BigInt<4> {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let start = WORD_BYTES - 8 * (i + 1);
        let mut chunk = [0u8; 8];
        chunk.copy_from_slice(&bytes[start..start + 8]);
        *limb = u64::from_be_bytes(chunk);
    }
    BigInt::new(limbs)
}

pub fn bigint_to_bytes32(value: &BigInt<4>) -> Word {
    let mut out = [0u8; WORD_BYTES];
    out.copy_from_slice(&value.to_bytes_be());
    out
}

fn field_to_bytes32<F: PrimeField<BigInt = BigInt<4>>>(value: &F) -> Word {
    bigint_to_bytes32(&value.into_bigint())
}

fn bytes32_to_field<F: PrimeField<BigInt = BigInt<4>>>(bytes: &Word) -> Result<F, EncodingError> {
    F::from_bigint(bytes32_to_bigint(bytes)).ok_or(EncodingError::NotCanonical)
}

pub fn encode_scalar_as_bytes32(scalar: &Scalar) -> Word {
    field_to_bytes32(scalar)
}

pub fn decode_bytes32_to_scalar(bytes: &Word) -> Result<Scalar, EncodingError> {
    bytes32_to_field(bytes)
}

pub fn encode_coordinate(value: &Coordinate) -> Word {
    field_to_bytes32(value)
}

/// Encodes the affine coordinates; the identity is the all-zero placeholder.
pub fn encode_point(point: &Point) -> [u8; POINT_BYTES] {
    let mut out = [0u8; POINT_BYTES];
    if point.infinity {
        return out;
    }
    out[..WORD_BYTES].copy_from_slice(&encode_coordinate(&point.x));
    out[WORD_BYTES..].copy_from_slice(&encode_coordinate(&point.y));
    out
}

pub fn decode_point(bytes: &[u8; POINT_BYTES]) -> Result<Point, EncodingError> {
    let mut x_bytes = [0u8; WORD_BYTES];
    let mut y_bytes = [0u8; WORD_BYTES];
    x_bytes.copy_from_slice(&bytes[..WORD_BYTES]);
    y_bytes.copy_from_slice(&bytes[WORD_BYTES..]);
    let x: Coordinate = bytes32_to_field(&x_bytes)?;
    let y: Coordinate = bytes32_to_field(&y_bytes)?;
    point_from_coordinates(x, y)
}

pub fn point_from_coordinates(x: Coordinate, y: Coordinate) -> Result<Point, EncodingError> {
    if x.is_zero() && y.is_zero() {
        return Ok(Point::identity());
    }
    let point = Point::new_unchecked(x, y);
    // BN254 G1 has cofactor 1, so on-curve is sufficient.
    if !point.is_on_curve() {
        return Err(EncodingError::NotOnCurve);
    }
    Ok(point)
}

/// `(x, y)` as two ABI words.
pub fn point_words(point: &Point) -> [Word; 2] {
    let bytes = encode_point(point);
    let mut x = [0u8; WORD_BYTES];
    let mut y = [0u8; WORD_BYTES];
    x.copy_from_slice(&bytes[..WORD_BYTES]);
    y.copy_from_slice(&bytes[WORD_BYTES..]);
    [x, y]
}

pub fn usize_word(value: usize) -> Word {
    let mut out = [0u8; WORD_BYTES];
    out[WORD_BYTES - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    out
}

/// `0x`-prefixed hex with leading zero bytes kept, one word per call.
pub fn word_to_hex(word: &Word) -> String {
    format!("0x{}", hex::encode(word))
}

pub fn hex_to_bytes(value: &str) -> Result<Vec<u8>, EncodingError> {
    let trimmed = value.trim();
    let without_prefix = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(without_prefix).map_err(|err| EncodingError::Hex(err.to_string()))
}

pub fn hex_to_array<const N: usize>(value: &str) -> Result<[u8; N], EncodingError> {
    let bytes = hex_to_bytes(value)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| EncodingError::Length {
            expected: N,
            actual: bytes.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{random_point, random_scalar};
    use ark_ec::AffineRepr;
    use ark_ff::{Field, One};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn scalar_encoding_is_left_padded_big_endian() {
        let bytes = encode_scalar_as_bytes32(&Scalar::from(0x0102u64));
        assert_eq!(&bytes[..30], &[0u8; 30]);
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
    }

    #[test]
    fn generator_encodes_as_one_two() {
        let bytes = encode_point(&Point::generator());
        assert_eq!(bytes[31], 1);
        assert_eq!(bytes[63], 2);
        assert_eq!(decode_point(&bytes).unwrap(), Point::generator());
    }

    #[test]
    fn identity_is_the_zero_placeholder() {
        let bytes = encode_point(&Point::identity());
        assert_eq!(bytes, [0u8; POINT_BYTES]);
        assert_eq!(decode_point(&bytes).unwrap(), Point::identity());
    }

    #[test]
    fn off_curve_coordinates_are_rejected() {
        let mut bytes = encode_point(&Point::generator());
        bytes[63] = 3;
        assert_eq!(decode_point(&bytes), Err(EncodingError::NotOnCurve));
    }

    #[test]
    fn unreduced_scalars_are_rejected() {
        assert_eq!(
            decode_bytes32_to_scalar(&[0xff; 32]),
            Err(EncodingError::NotCanonical)
        );
        let minus_one = -Scalar::one();
        let bytes = encode_scalar_as_bytes32(&minus_one);
        assert_eq!(decode_bytes32_to_scalar(&bytes).unwrap(), minus_one);
        assert_eq!(minus_one.inverse().unwrap(), minus_one);
    }

    #[test]
    fn hex_words_keep_leading_zeroes() {
        let word = usize_word(17);
        let text = word_to_hex(&word);
        assert_eq!(text.len(), 66);
        assert!(text.ends_with("11"));
        assert_eq!(hex_to_array::<32>(&text).unwrap(), word);
        assert!(matches!(
            hex_to_array::<64>(&text),
            Err(EncodingError::Length { expected: 64, actual: 32 })
        ));
    }

    proptest! {
        #[test]
        fn points_round_trip(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let point = random_point(&mut rng);
            prop_assert_eq!(decode_point(&encode_point(&point)).unwrap(), point);
        }

        #[test]
        fn scalars_round_trip(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let scalar = random_scalar(&mut rng);
            prop_assert_eq!(decode_bytes32_to_scalar(&encode_scalar_as_bytes32(&scalar)).unwrap(), scalar);
        }
    }
}
