//! Note Commitments
//!
//! ```text
//! cm = SHA-256( 0xB0 || a_pk[32] || value[8, big-endian] || rho[32] || r[32] )
//! ```
//!
//! Every field is fixed width, so no two field tuples share an encoding.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::keys::SpendingAddress;

const COMMITMENT_PREFIX: u8 = 0xb0;

/// A note commitment (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Commit to a note's contents
pub fn note_commitment(
    apk: &SpendingAddress,
    value: u64,
    rho: &[u8; 32],
    r: &[u8; 32],
) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update([COMMITMENT_PREFIX]);
    hasher.update(apk.as_bytes());
    hasher.update(value.to_be_bytes());
    hasher.update(rho);
    hasher.update(r);
    Commitment(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_deterministic() {
        let apk = SpendingAddress([1u8; 32]);
        let c1 = note_commitment(&apk, 1000, &[2u8; 32], &[3u8; 32]);
        let c2 = note_commitment(&apk, 1000, &[2u8; 32], &[3u8; 32]);
        assert_eq!(c1, c2, "same inputs should produce same commitment");
    }

    #[test]
    fn test_commitment_hiding() {
        let apk = SpendingAddress([1u8; 32]);
        let c1 = note_commitment(&apk, 1000, &[2u8; 32], &[1u8; 32]);
        let c2 = note_commitment(&apk, 1000, &[2u8; 32], &[2u8; 32]);
        assert_ne!(c1, c2, "different randomness should produce different commitments");
    }

    #[test]
    fn test_commitment_binding() {
        let apk = SpendingAddress([1u8; 32]);
        let rho = [2u8; 32];
        let r = [3u8; 32];
        assert_ne!(
            note_commitment(&apk, 1000, &rho, &r),
            note_commitment(&apk, 2000, &rho, &r)
        );
        assert_ne!(
            note_commitment(&apk, 1000, &rho, &r),
            note_commitment(&SpendingAddress([9u8; 32]), 1000, &rho, &r)
        );
    }

    #[test]
    fn test_fields_not_interchangeable() {
        let apk = SpendingAddress([0u8; 32]);
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(
            note_commitment(&apk, 5, &a, &b),
            note_commitment(&apk, 5, &b, &a)
        );
    }
}
