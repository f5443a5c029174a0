//! Nullifiers
//!
//! ```text
//! nf = PRF_nf(a_sk, rho)
//! ```
//!
//! Publishing `nf` spends the note. Only the holder of `a_sk` can compute it,
//! and it does not reveal which commitment it belongs to.

use serde::{Deserialize, Serialize};

use crate::keys::SpendingKey;
use crate::prf::prf_nf;

/// A nullifier (32 bytes) - unique tag for a spent note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Nullifier(pub [u8; 32]);

impl Nullifier {
    /// Derive the nullifier for the note with nonce `rho`
    pub fn derive(spending_key: &SpendingKey, rho: &[u8; 32]) -> Self {
        Self(prf_nf(spending_key.as_bytes(), rho))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Nullifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
