use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;
use crate::permutation::PermutationSampler;

/// Width of the on-chain verification arrays; responses are always padded to this many rounds.
pub const MAX_SECURITY: usize = 63;

/// Client-side protocol knobs. Everything that must agree with the contract is a constant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub permutation_sampler: PermutationSampler,
    /// Run the verifier over every produced proof before returning it.
    pub self_verify: bool,
}

impl ProtocolConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json_str(&contents)?)
    }
}

pub fn check_verif_rounds(rounds: usize) -> Result<(), DeckError> {
    if rounds == 0 || rounds > MAX_SECURITY {
        return Err(DeckError::InvalidRounds {
            rounds,
            max: MAX_SECURITY,
        });
    }
    Ok(())
}
