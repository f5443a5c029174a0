//! Cinder signatures
//!
//! One-time signing keys authorise a shielded transaction: the builder signs
//! the canonical transaction hash and embeds the public key next to the
//! signature.

pub mod schnorr;

use rand::{CryptoRng, RngCore};
use thiserror::Error;

pub use schnorr::{
    PUBLIC_KEY_LEN, PublicKey, SECRET_KEY_LEN, SIGNATURE_LEN, Schnorr, SchnorrKeypair, Signature,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("hash to sign must be 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid signature length: expected {expected}, got {got}")]
    InvalidSignatureLength { expected: usize, got: usize },

    #[error("invalid key encoding")]
    InvalidKeyEncoding,

    #[error("signing key does not match the embedded public key")]
    KeyMismatch,
}

/// A signature scheme over 32-byte message hashes
pub trait SignatureScheme {
    type Keypair;
    type PublicKey;
    type Signature;

    fn keygen<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Self::Keypair;

    /// Sign a 32-byte hash; any other length is rejected
    fn sign<R: RngCore + CryptoRng>(
        &self,
        keypair: &Self::Keypair,
        hash: &[u8],
        rng: &mut R,
    ) -> Result<Self::Signature, SignatureError>;

    /// `false` on any malformed input, never an error
    fn verify(&self, public_key: &Self::PublicKey, signature: &Self::Signature, hash: &[u8])
    -> bool;
}
