//! Transaction validation: signature plus per-descriptor proof delegation.
//!
//! Nullifiers must be unique within a transaction; spends against earlier
//! transactions are the ledger's job (see `MemoryStore::spent_nullifiers`).

use std::collections::HashSet;

use cinder_curve::CurveContext;
use cinder_transaction::{ShardId, ShieldedTransaction, TxKind};
use log::{debug, warn};

use crate::error::ValidationError;
use crate::prover::{JoinSplitProver, JoinSplitStatement, VerifyRequest};

pub struct TxValidator<'a> {
    ctx: &'a CurveContext,
    verifier: &'a dyn JoinSplitProver,
}

impl<'a> TxValidator<'a> {
    pub fn new(ctx: &'a CurveContext, verifier: &'a dyn JoinSplitProver) -> Self {
        Self { ctx, verifier }
    }

    pub fn validate(&self, tx: &ShieldedTransaction) -> bool {
        match self.check(tx) {
            Ok(()) => true,
            Err(e) => {
                warn!("Transaction rejected: {}", e);
                false
            }
        }
    }

    /// Like [`validate`](Self::validate), with the first failing check
    pub fn check(&self, tx: &ShieldedTransaction) -> Result<(), ValidationError> {
        if !tx.verify_signature(self.ctx) {
            return Err(ValidationError::SignatureInvalid);
        }

        let mut seen = HashSet::new();
        if let Some(nullifier) = tx.nullifiers().into_iter().find(|nf| !seen.insert(*nf)) {
            return Err(ValidationError::DuplicateNullifier { nullifier });
        }

        if tx.kind() != TxKind::Salary {
            if let Some(index) = tx.descriptors().iter().position(|d| d.reward != 0) {
                return Err(ValidationError::UnexpectedReward { index });
            }
        }

        let shard = ShardId(tx.shard_selector());
        for (index, desc) in tx.descriptors().iter().enumerate() {
            let statement = JoinSplitStatement {
                anchors: desc.anchors,
                nullifiers: desc.nullifiers,
                commitments: desc.commitments,
                macs: desc.macs,
                h_sig: desc.h_sig(tx.signing_pubkey()),
                reward: desc.reward,
                fee: if index == 0 { tx.fee() } else { 0 },
                shard,
            };
            let request = VerifyRequest {
                statement,
                proof: desc.proof.clone(),
            };

            let reply = self
                .verifier
                .verify(&request)
                .map_err(|e| ValidationError::ProverUnavailable(format!("{e:#}")))?;
            if !reply.success {
                return Err(ValidationError::ProofRejected { index });
            }
            debug!("Descriptor {} verified", index);
        }

        Ok(())
    }
}
