//! Cinder Privacy SDK
//!
//! Shielded keys, notes and the primitives a join-split descriptor is built from.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    JoinSplit Descriptor                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐ │
//! │  │  Nullifiers  │  │ Commitments  │  │   Encrypted Outputs   │ │
//! │  │  PRF_nf      │  │  SHA-256     │  │   X25519 + ChaCha20   │ │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘ │
//! │         │                 │                     │               │
//! │         ▼                 ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              JoinSplit proof (external prover)          │   │
//! │  │  • Inputs are in the shard tree under the anchor        │   │
//! │  │  • Nullifiers and macs derive from the spending key     │   │
//! │  │  • Σ inputs + reward − fee = Σ outputs                  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod encryption;
pub mod keys;
pub mod merkle;
pub mod note;
pub mod nullifier;
pub mod prf;

pub use commitment::{Commitment, note_commitment};
pub use encryption::{
    EncryptionError, EphemeralKey, NOTE_CIPHERTEXT_LEN, decrypt_note, encrypt_note,
    try_decrypt_note,
};
pub use keys::{
    FullKey, KeyError, PaymentAddress, ReceivingKey, SpendingAddress, SpendingKey,
    TransmissionKey, ViewingKey,
};
pub use merkle::{MerklePath, MerkleTree, TREE_DEPTH};
pub use note::{Note, NoteValue};
pub use nullifier::Nullifier;
pub use prf::{prf_addr, prf_nf, prf_pk, prf_rho};
