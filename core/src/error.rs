use cinder_privacy::{Commitment, EncryptionError, Nullifier};
use cinder_signature::SignatureError;
use cinder_transaction::ShardId;
use thiserror::Error;

/// Reasons a transaction could not be assembled. Any of these aborts the
/// build; no partial transaction is returned.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("insufficient input value: have {available}, need {required}")]
    InsufficientInputValue { available: u64, required: u64 },

    #[error("commitment {} not found in {shard}", hex_prefix(.commitment))]
    CommitmentNotFound {
        shard: ShardId,
        commitment: Commitment,
    },

    #[error("note {} supplied more than once", hex_prefix(.commitment))]
    DuplicateNote { commitment: Commitment },

    #[error("anchor mismatch for {shard}")]
    AnchorMismatch { shard: ShardId },

    #[error("descriptor needs {expected} {side}, got {got}")]
    DescriptorArityViolation {
        side: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("transaction would need more than {limit} descriptors")]
    TooManyDescriptors { limit: usize },

    #[error("invalid build request: {0}")]
    InvalidRequest(&'static str),

    #[error("prover unavailable: {0}")]
    ProverUnavailable(String),

    #[error("proof rejected by prover")]
    ProofRejected,

    #[error("note encryption failed: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("signing failed: {0}")]
    Signature(#[from] SignatureError),
}

/// Diagnostic reason a transaction failed validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("transaction signature invalid")]
    SignatureInvalid,

    #[error("nullifier {} spent more than once", hex::encode(.nullifier.as_bytes()))]
    DuplicateNullifier { nullifier: Nullifier },

    #[error("descriptor {index} carries a reward outside a salary transaction")]
    UnexpectedReward { index: usize },

    #[error("proof of descriptor {index} rejected")]
    ProofRejected { index: usize },

    #[error("verifier unavailable: {0}")]
    ProverUnavailable(String),
}

fn hex_prefix(cm: &Commitment) -> String {
    hex::encode(&cm.0[..4])
}
