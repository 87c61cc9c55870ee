// crates/optima-core/src/identity.rs

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind a validator id (hex-encoded to 40 chars).
pub const VALIDATOR_ID_BYTES: usize = 20;

/// Unique identifier of a simulated validator.
///
/// Hex encoding of 20 random bytes. Ids are drawn from the caller's RNG so a
/// seeded network reproduces the same ids on every run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorId(String);

impl ValidatorId {
    /// Draw a fresh random id.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; VALIDATOR_ID_BYTES];
        rng.fill(&mut bytes[..]);
        ValidatorId(hex::encode(bytes))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, used for default monikers.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ValidatorId {
    fn from(s: &str) -> Self {
        ValidatorId(s.to_string())
    }
}

impl From<String> for ValidatorId {
    fn from(s: String) -> Self {
        ValidatorId(s)
    }
}

/// Immutable identity of a validator, fixed at network initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorIdentity {
    /// Unique id within the network.
    pub id: ValidatorId,
    /// Display name (e.g. "validator-7").
    pub moniker: String,
    /// Stake weight. Summed into the network's total stake.
    pub voting_power: u64,
    /// Commission rate as a fraction, rounded to two decimals.
    pub commission_rate: f64,
}

impl ValidatorIdentity {
    /// Build an identity, rounding the commission to two decimals.
    pub fn new(id: ValidatorId, moniker: impl Into<String>, voting_power: u64, commission: f64) -> Self {
        Self {
            id,
            moniker: moniker.into(),
            voting_power,
            commission_rate: round_commission(commission),
        }
    }
}

fn round_commission(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_id_is_forty_hex_chars() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = ValidatorId::random(&mut rng);
        assert_eq!(id.as_str().len(), 40);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn test_seeded_ids_are_reproducible() {
        let a = ValidatorId::random(&mut StdRng::seed_from_u64(42));
        let b = ValidatorId::random(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_commission_rounded_to_two_decimals() {
        let identity = ValidatorIdentity::new(ValidatorId::from("abc"), "v", 10, 0.123456);
        assert_eq!(identity.commission_rate, 0.12);
    }
}
