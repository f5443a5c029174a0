//! Shielded Notes
//!
//! A Note represents value held privately by the owner of `apk`.
//!
//! ```text
//! Note = {
//!     value: u64,      // Amount in the smallest unit
//!     apk:   [u8; 32], // Owner's spending address
//!     rho:   [u8; 32], // Nullifier nonce
//!     r:     [u8; 32], // Commitment randomness
//!     cm,              // Commitment (fixed at construction)
//!     nf,              // Nullifier (known only to the owner)
//! }
//! ```

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::commitment::{Commitment, note_commitment};
use crate::keys::{SpendingAddress, SpendingKey};
use crate::nullifier::Nullifier;

/// A shielded note representing privately held value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    value: NoteValue,
    apk: SpendingAddress,
    rho: [u8; 32],
    r: [u8; 32],
    cm: Commitment,
    nf: Option<Nullifier>,
}

/// Note value with overflow protection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteValue(pub u64);

impl NoteValue {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Checked addition
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Checked sum of an iterator of values
    pub fn checked_sum<I: IntoIterator<Item = NoteValue>>(values: I) -> Option<Self> {
        values
            .into_iter()
            .try_fold(Self::ZERO, |acc, v| acc.checked_add(v))
    }
}

impl Note {
    /// Build a note from all of its fields; the commitment is computed here
    pub fn new(value: u64, apk: SpendingAddress, rho: [u8; 32], r: [u8; 32]) -> Self {
        let cm = note_commitment(&apk, value, &rho, &r);
        Self {
            value: NoteValue(value),
            apk,
            rho,
            r,
            cm,
            nf: None,
        }
    }

    /// Create a note with fresh random `rho` and `r`
    pub fn random<R: RngCore + CryptoRng>(value: u64, apk: SpendingAddress, rng: &mut R) -> Self {
        let mut rho = [0u8; 32];
        let mut r = [0u8; 32];
        rng.fill_bytes(&mut rho);
        rng.fill_bytes(&mut r);
        Self::new(value, apk, rho, r)
    }

    /// Zero-value note owned by `spending_key`, used only to pad descriptors
    pub fn dummy<R: RngCore + CryptoRng>(spending_key: &SpendingKey, rng: &mut R) -> Self {
        Self::random(0, spending_key.spending_address(), rng).with_nullifier(spending_key)
    }

    /// Attach the owner's nullifier
    pub fn with_nullifier(mut self, spending_key: &SpendingKey) -> Self {
        self.nf = Some(Nullifier::derive(spending_key, &self.rho));
        self
    }

    pub fn value(&self) -> NoteValue {
        self.value
    }

    pub fn apk(&self) -> &SpendingAddress {
        &self.apk
    }

    pub fn rho(&self) -> &[u8; 32] {
        &self.rho
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn commitment(&self) -> Commitment {
        self.cm
    }

    /// Nullifier, if it has been attached with [`Note::with_nullifier`]
    pub fn nullifier(&self) -> Option<Nullifier> {
        self.nf
    }
}
