//! Cinder shielded transactions
//!
//! ```text
//! ShieldedTransaction
//! ├── version, kind, lock_time, fee, shard_selector
//! ├── signing_pubkey            (one-time Schnorr key)
//! ├── descriptors[..]
//! │     ├── anchors[2]          (shard roots, one per input slot)
//! │     ├── nullifiers[2]
//! │     ├── commitments[2]
//! │     ├── proof               (opaque, from the join-split prover)
//! │     ├── ciphertexts[2]      (one per output slot)
//! │     ├── ephemeral_pubkey, h_sig_seed, reward
//! │     └── macs[2]             (PRF_pk(a_sk_i, i, hSig))
//! └── signature                 (over the double-SHA-256 of everything above)
//! ```

pub mod descriptor;
pub mod shard;
pub mod transaction;
pub mod wire;

pub use descriptor::{JoinSplitDescriptor, NUM_DESC_INPUTS, NUM_DESC_OUTPUTS, h_sig};
pub use shard::{DEFAULT_SHARD_COUNT, ShardId};
pub use transaction::{ShieldedTransaction, TxKind, UnsignedTransaction};
pub use wire::{MAX_CIPHERTEXT_LEN, MAX_DESCRIPTORS, MAX_PROOF_LEN, WireError};
