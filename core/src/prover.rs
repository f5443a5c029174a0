//! Join-split prover boundary
//!
//! The arithmetic-circuit prover is an external collaborator. The core talks to
//! it through [`JoinSplitProver`] with typed requests.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     JoinSplit Statement                         │
//! │                                                                 │
//! │  Public:                                                        │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │ • anchors[2]        (shard roots)                         │  │
//! │  │ • nullifiers[2]     (PRF_nf(a_sk_i, rho_i))               │  │
//! │  │ • commitments[2]    (output notes)                        │  │
//! │  │ • macs[2]           (PRF_pk(a_sk_i, i, hSig))             │  │
//! │  │ • hSig, reward, fee, shard                                │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                                                                 │
//! │  Private:                                                       │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │ • input notes, spending keys, witness paths               │  │
//! │  │ • output notes, phi                                       │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                                                                 │
//! │  Σ inputs + reward = Σ outputs + fee                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Err` from the trait means the service could not be reached; a reply with
//! `success == false` is an explicit rejection.

use std::thread::JoinHandle;

use anyhow::{Context, Result};
use cinder_privacy::{
    Commitment, MerklePath, Note, NoteValue, Nullifier, SpendingKey, prf_pk, prf_rho,
};
use cinder_transaction::{NUM_DESC_INPUTS, NUM_DESC_OUTPUTS, ShardId};
use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};

const MOCK_PROOF_CONTEXT: &str = "cinder mock joinsplit proof v1";

// ============================================================================
// Request / Reply Types
// ============================================================================

/// Public inputs of one descriptor's proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSplitStatement {
    pub anchors: [[u8; 32]; NUM_DESC_INPUTS],
    pub nullifiers: [Nullifier; NUM_DESC_INPUTS],
    pub commitments: [Commitment; NUM_DESC_OUTPUTS],
    pub macs: [[u8; 32]; NUM_DESC_INPUTS],
    pub h_sig: [u8; 32],
    pub reward: u64,
    /// Non-zero only on a transaction's first descriptor
    pub fee: u64,
    pub shard: ShardId,
}

/// Private input slot
#[derive(Debug, Clone)]
pub struct InputWitness {
    pub note: Note,
    pub spending_key: SpendingKey,
    pub path: MerklePath,
}

#[derive(Debug, Clone)]
pub struct ProveRequest {
    pub statement: JoinSplitStatement,
    pub inputs: [InputWitness; NUM_DESC_INPUTS],
    pub outputs: [Note; NUM_DESC_OUTPUTS],
    /// Seed the output `rho`s derive from
    pub phi: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProveReply {
    pub success: bool,
    pub proof: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub statement: JoinSplitStatement,
    pub proof: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReply {
    pub success: bool,
}

// ============================================================================
// Prover Trait
// ============================================================================

/// Request/reply contract of the join-split proof system
pub trait JoinSplitProver: Send + Sync {
    fn prove(&self, request: &ProveRequest) -> Result<ProveReply>;

    fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply>;
}

// ============================================================================
// Mock Prover
// ============================================================================

/// Checks the statement against the witness in the clear and emits a proof
/// that is a hash over every public input.
///
/// Provides no privacy or soundness against a malicious prover; it exists for
/// tests and dev mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockProver;

impl MockProver {
    pub fn new() -> Self {
        Self
    }

    /// Why the witness fails the statement, if it does
    pub fn check_statement(request: &ProveRequest) -> Option<&'static str> {
        let st = &request.statement;

        if has_duplicate_nullifier(&st.nullifiers) {
            return Some("duplicate nullifier");
        }

        let inputs = NoteValue::checked_sum(request.inputs.iter().map(|i| i.note.value()));
        let outputs = NoteValue::checked_sum(request.outputs.iter().map(|n| n.value()));
        let (Some(inputs), Some(outputs)) = (inputs, outputs) else {
            return Some("value overflow");
        };
        let lhs = inputs.checked_add(NoteValue(st.reward));
        let rhs = outputs.checked_add(NoteValue(st.fee));
        if lhs.is_none() || lhs != rhs {
            return Some("value not conserved");
        }

        for (i, input) in request.inputs.iter().enumerate() {
            let sk = &input.spending_key;
            if input.note.apk() != &sk.spending_address() {
                return Some("input not owned by spending key");
            }
            if st.nullifiers[i] != Nullifier::derive(sk, input.note.rho()) {
                return Some("nullifier mismatch");
            }
            if st.macs[i] != prf_pk(sk.as_bytes(), i as u8, &st.h_sig) {
                return Some("mac mismatch");
            }
            if input.note.value() != NoteValue::ZERO
                && !input.path.verify(&input.note.commitment(), &st.anchors[i])
            {
                return Some("witness path does not reach anchor");
            }
        }

        for (j, output) in request.outputs.iter().enumerate() {
            if st.commitments[j] != output.commitment() {
                return Some("output commitment mismatch");
            }
            if output.rho() != &prf_rho(&request.phi, j as u8, &st.h_sig) {
                return Some("output rho not derived from phi");
            }
        }

        None
    }

    /// Proof bytes bound to the statement
    pub fn binding(statement: &JoinSplitStatement) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new_derive_key(MOCK_PROOF_CONTEXT);
        for anchor in &statement.anchors {
            hasher.update(anchor);
        }
        for nf in &statement.nullifiers {
            hasher.update(nf.as_bytes());
        }
        for cm in &statement.commitments {
            hasher.update(cm.as_bytes());
        }
        for mac in &statement.macs {
            hasher.update(mac);
        }
        hasher.update(&statement.h_sig);
        hasher.update(&statement.reward.to_be_bytes());
        hasher.update(&statement.fee.to_be_bytes());
        hasher.update(&[statement.shard.as_u8()]);
        hasher.finalize().as_bytes().to_vec()
    }
}

impl JoinSplitProver for MockProver {
    fn prove(&self, request: &ProveRequest) -> Result<ProveReply> {
        if let Some(reason) = Self::check_statement(request) {
            warn!("Mock prover rejected statement: {}", reason);
            return Ok(ProveReply {
                success: false,
                proof: Vec::new(),
            });
        }
        Ok(ProveReply {
            success: true,
            proof: Self::binding(&request.statement),
        })
    }

    fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply> {
        let statement = &request.statement;
        Ok(VerifyReply {
            success: !has_duplicate_nullifier(&statement.nullifiers)
                && request.proof == Self::binding(statement),
        })
    }
}

fn has_duplicate_nullifier(nullifiers: &[Nullifier]) -> bool {
    nullifiers
        .iter()
        .enumerate()
        .any(|(i, nf)| nullifiers[..i].contains(nf))
}

// ============================================================================
// Prover Service
// ============================================================================

enum Job {
    Prove(ProveRequest, oneshot::Sender<Result<ProveReply>>),
    Verify(VerifyRequest, oneshot::Sender<Result<VerifyReply>>),
    Shutdown,
}

/// Runs a prover on a dedicated thread behind a bounded queue
pub struct ProverService {
    handle: ProverHandle,
    worker: Option<JoinHandle<()>>,
}

/// Cloneable client of a [`ProverService`].
///
/// Calls block the current thread; do not use from inside an async task.
#[derive(Clone)]
pub struct ProverHandle {
    request_tx: mpsc::Sender<Job>,
}

impl ProverService {
    /// Start the prover service with the given prover implementation
    pub fn start<P: JoinSplitProver + 'static>(prover: P, queue_depth: usize) -> Self {
        let (request_tx, mut request_rx) = mpsc::channel::<Job>(queue_depth.max(1));

        // Proving is CPU-bound, keep it off any async runtime
        let worker = std::thread::spawn(move || {
            while let Some(job) = request_rx.blocking_recv() {
                match job {
                    Job::Prove(request, reply) => {
                        let _ = reply.send(prover.prove(&request));
                    }
                    Job::Verify(request, reply) => {
                        let _ = reply.send(prover.verify(&request));
                    }
                    Job::Shutdown => break,
                }
            }
            debug!("Prover service stopped");
        });

        Self {
            handle: ProverHandle { request_tx },
            worker: Some(worker),
        }
    }

    pub fn handle(&self) -> ProverHandle {
        self.handle.clone()
    }

    /// Stop the worker; outstanding handles start failing
    pub fn shutdown(mut self) {
        let _ = self.handle.request_tx.blocking_send(Job::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl JoinSplitProver for ProverHandle {
    fn prove(&self, request: &ProveRequest) -> Result<ProveReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .blocking_send(Job::Prove(request.clone(), reply_tx))
            .ok()
            .context("prover service unavailable")?;
        reply_rx.blocking_recv().context("prover crashed")?
    }

    fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .blocking_send(Job::Verify(request.clone(), reply_tx))
            .ok()
            .context("prover service unavailable")?;
        reply_rx.blocking_recv().context("prover crashed")?
    }
}
