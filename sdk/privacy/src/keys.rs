//! Shielded key hierarchy
//!
//! ```text
//! SpendingKey (a_sk, 252 bits)
//!   ├── PRF_addr(a_sk, 0) ──────────────▶ SpendingAddress (a_pk)
//!   └── clamp(PRF_addr(a_sk, 1)) ───────▶ ReceivingKey (sk_enc)
//!                                          └── X25519(sk_enc, 9) ─▶ TransmissionKey (pk_enc)
//!
//! ViewingKey     = { a_pk, sk_enc }
//! PaymentAddress = { a_pk, pk_enc }
//! ```

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::prf::prf_addr;

pub const SPENDING_KEY_LEN: usize = 32;
pub const RECEIVING_KEY_LEN: usize = 32;
pub const SPENDING_ADDRESS_LEN: usize = 32;
pub const TRANSMISSION_KEY_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], KeyError> {
    bytes.try_into().map_err(|_| KeyError::InvalidKeyLength {
        expected: N,
        got: bytes.len(),
    })
}

/// Root secret. The top 4 bits of the last byte are always zero.
#[derive(Clone, PartialEq, Eq)]
pub struct SpendingKey([u8; SPENDING_KEY_LEN]);

impl SpendingKey {
    /// Sample 252 uniform bits
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut key = [0u8; SPENDING_KEY_LEN];
        rng.fill_bytes(&mut key);
        Self::from_bytes(key)
    }

    /// Wrap raw bytes, masking the top nibble
    pub fn from_bytes(mut key: [u8; SPENDING_KEY_LEN]) -> Self {
        key[SPENDING_KEY_LEN - 1] &= 0x0f;
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; SPENDING_KEY_LEN] {
        &self.0
    }

    pub fn spending_address(&self) -> SpendingAddress {
        SpendingAddress(prf_addr(&self.0, 0))
    }

    pub fn receiving_key(&self) -> ReceivingKey {
        ReceivingKey(clamp_curve25519(prf_addr(&self.0, 1)))
    }

    pub fn viewing_key(&self) -> ViewingKey {
        ViewingKey {
            apk: self.spending_address(),
            sk_enc: self.receiving_key(),
        }
    }

    pub fn payment_address(&self) -> PaymentAddress {
        PaymentAddress {
            apk: self.spending_address(),
            pk_enc: self.receiving_key().transmission_key(),
        }
    }

    pub fn full_key(&self) -> FullKey {
        FullKey {
            spending_key: self.clone(),
            viewing_key: self.viewing_key(),
            address: self.payment_address(),
        }
    }
}

impl TryFrom<&[u8]> for SpendingKey {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self::from_bytes(to_array(bytes)?))
    }
}

impl std::fmt::Debug for SpendingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SpendingKey(..)")
    }
}

/// Standard X25519 scalar clamp
fn clamp_curve25519(mut x: [u8; 32]) -> [u8; 32] {
    x[0] &= 0xf8;
    x[31] &= 0x7f;
    x[31] |= 0x40;
    x
}

/// Public spending address (`a_pk`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpendingAddress(pub [u8; SPENDING_ADDRESS_LEN]);

impl SpendingAddress {
    pub fn as_bytes(&self) -> &[u8; SPENDING_ADDRESS_LEN] {
        &self.0
    }

    /// Trailing byte, used for shard selection
    pub fn last_byte(&self) -> u8 {
        self.0[SPENDING_ADDRESS_LEN - 1]
    }
}

impl TryFrom<&[u8]> for SpendingAddress {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(to_array(bytes)?))
    }
}

/// X25519 secret used to decrypt incoming notes (`sk_enc`, clamped)
#[derive(Clone, PartialEq, Eq)]
pub struct ReceivingKey([u8; RECEIVING_KEY_LEN]);

impl ReceivingKey {
    pub fn as_bytes(&self) -> &[u8; RECEIVING_KEY_LEN] {
        &self.0
    }

    pub fn transmission_key(&self) -> TransmissionKey {
        let secret = StaticSecret::from(self.0);
        TransmissionKey(PublicKey::from(&secret).to_bytes())
    }

    pub(crate) fn static_secret(&self) -> StaticSecret {
        StaticSecret::from(self.0)
    }
}

impl TryFrom<&[u8]> for ReceivingKey {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(clamp_curve25519(to_array(bytes)?)))
    }
}

impl std::fmt::Debug for ReceivingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReceivingKey(..)")
    }
}

/// X25519 public key notes are encrypted to (`pk_enc`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransmissionKey(pub [u8; TRANSMISSION_KEY_LEN]);

impl TransmissionKey {
    pub fn as_bytes(&self) -> &[u8; TRANSMISSION_KEY_LEN] {
        &self.0
    }
}

impl TryFrom<&[u8]> for TransmissionKey {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(to_array(bytes)?))
    }
}

/// Viewing key - detects and decrypts incoming notes, cannot spend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewingKey {
    pub apk: SpendingAddress,
    pub sk_enc: ReceivingKey,
}

impl ViewingKey {
    pub fn payment_address(&self) -> PaymentAddress {
        PaymentAddress {
            apk: self.apk,
            pk_enc: self.sk_enc.transmission_key(),
        }
    }
}

/// Shareable destination for payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentAddress {
    pub apk: SpendingAddress,
    pub pk_enc: TransmissionKey,
}

/// All keys derived from one spending key
#[derive(Debug, Clone)]
pub struct FullKey {
    pub spending_key: SpendingKey,
    pub viewing_key: ViewingKey,
    pub address: PaymentAddress,
}

impl FullKey {
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        SpendingKey::random(rng).full_key()
    }
}
