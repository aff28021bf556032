//! Serde helpers encoding group elements in the fixed-width wire format as 0x-prefixed hex.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::curve::{Point, Scalar};
use crate::encoding::{
    decode_bytes32_to_scalar, decode_point, encode_point, encode_scalar_as_bytes32, hex_to_array,
    POINT_BYTES, WORD_BYTES,
};

fn point_to_hex(point: &Point) -> String {
    format!("0x{}", hex::encode(encode_point(point)))
}

fn point_from_hex<E: DeError>(value: &str) -> Result<Point, E> {
    let bytes = hex_to_array::<POINT_BYTES>(value).map_err(E::custom)?;
    decode_point(&bytes).map_err(E::custom)
}

fn scalar_to_hex(scalar: &Scalar) -> String {
    format!("0x{}", hex::encode(encode_scalar_as_bytes32(scalar)))
}

fn scalar_from_hex<E: DeError>(value: &str) -> Result<Scalar, E> {
    let bytes = hex_to_array::<WORD_BYTES>(value).map_err(E::custom)?;
    decode_bytes32_to_scalar(&bytes).map_err(E::custom)
}

/// Serde helpers for a single curve point.
pub mod point {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Point, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&point_to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Point, D::Error> {
        let s = String::deserialize(deserializer)?;
        point_from_hex(&s)
    }
}

/// Serde helpers for a single scalar.
pub mod scalar {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Scalar, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&scalar_to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Scalar, D::Error> {
        let s = String::deserialize(deserializer)?;
        scalar_from_hex(&s)
    }
}

/// Serde helpers for `Vec<Point>`.
pub mod point_vec {
    use super::*;

    pub fn serialize<S: Serializer>(value: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<String> = value.iter().map(point_to_hex).collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Point>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| point_from_hex(s))
            .collect()
    }
}

/// Serde helpers for `Vec<Vec<Point>>`, one inner vector per verification round.
pub mod point_rounds {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &[Vec<Point>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded: Vec<Vec<String>> = value
            .iter()
            .map(|round| round.iter().map(point_to_hex).collect())
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<Point>>, D::Error> {
        Vec::<Vec<String>>::deserialize(deserializer)?
            .iter()
            .map(|round| round.iter().map(|s| point_from_hex(s)).collect())
            .collect()
    }
}

/// Serde helpers for `Vec<Scalar>`.
pub mod scalar_vec {
    use super::*;

    pub fn serialize<S: Serializer>(value: &[Scalar], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<String> = value.iter().map(scalar_to_hex).collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Scalar>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| scalar_from_hex(s))
            .collect()
    }
}
