//! Shielded Transaction Builder
//!
//! Turns spendable notes and payment requests into a chain of fixed-arity
//! join-split descriptors, then signs the result with a one-time key.
//!
//! ```text
//!  notes (largest first) ──┐
//!                          ▼
//!   ┌───────────────────────────────────────────┐
//!   │ descriptor k                              │
//!   │  inputs:  up to 2 real + dummy padding    │
//!   │  outputs: payments | change | dummies     │◀── payments (largest first)
//!   │  fee only when k == 0                     │
//!   └───────────────────────────────────────────┘
//!                          │ change re-queued while payments remain
//!                          ▼
//!                    descriptor k+1 ...
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use cinder_config::CinderConfig;
use cinder_curve::CurveContext;
use cinder_privacy::{
    Commitment, EphemeralKey, MerklePath, MerkleTree, Note, NoteValue, Nullifier,
    PaymentAddress, SpendingKey, encrypt_note, prf_pk, prf_rho,
};
use cinder_signature::{PublicKey, Schnorr, SignatureScheme};
use cinder_transaction::{
    DEFAULT_SHARD_COUNT, JoinSplitDescriptor, MAX_DESCRIPTORS, NUM_DESC_INPUTS,
    NUM_DESC_OUTPUTS, ShardId, ShieldedTransaction, TxKind, UnsignedTransaction, h_sig,
};
use log::{debug, info, warn};
use rand::{CryptoRng, RngCore};

use crate::error::BuildError;
use crate::prover::{InputWitness, JoinSplitProver, JoinSplitStatement, ProveRequest};
use crate::store::CommitmentStore;

const DEFAULT_TX_VERSION: u32 = 1;

// ============================================================================
// Request Types
// ============================================================================

/// Pay `amount` to `address`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentRequest {
    pub amount: u64,
    pub address: PaymentAddress,
}

/// A note the sender can spend and the shard its commitment lives in
#[derive(Debug, Clone)]
pub struct SpendableNote {
    pub note: Note,
    pub shard: ShardId,
}

impl SpendableNote {
    pub fn new(note: Note, shard: ShardId) -> Self {
        Self { note, shard }
    }
}

/// Validated input of one build
#[derive(Debug, Clone)]
pub struct BuildRequest {
    spending_key: SpendingKey,
    payments: Vec<PaymentRequest>,
    anchors: HashMap<ShardId, [u8; 32]>,
    notes: Vec<SpendableNote>,
    fee: u64,
    lock_time: u64,
}

impl BuildRequest {
    /// Check the request shape and that the notes cover payments plus fee
    pub fn new(
        spending_key: SpendingKey,
        payments: Vec<PaymentRequest>,
        anchors: HashMap<ShardId, [u8; 32]>,
        notes: Vec<SpendableNote>,
        fee: u64,
    ) -> Result<Self, BuildError> {
        if payments.is_empty() {
            return Err(BuildError::InvalidRequest("no payments"));
        }
        if payments.iter().any(|p| p.amount == 0) {
            return Err(BuildError::InvalidRequest("zero payment amount"));
        }
        let owner = spending_key.spending_address();
        if notes.iter().any(|n| n.note.apk() != &owner) {
            return Err(BuildError::InvalidRequest("note not owned by spending key"));
        }
        let mut seen = HashSet::with_capacity(notes.len());
        if let Some(dup) = notes.iter().find(|n| !seen.insert(n.note.commitment())) {
            return Err(BuildError::DuplicateNote {
                commitment: dup.note.commitment(),
            });
        }

        let available = NoteValue::checked_sum(notes.iter().map(|n| n.note.value()));
        let required = NoteValue::checked_sum(
            payments
                .iter()
                .map(|p| NoteValue(p.amount))
                .chain([NoteValue(fee)]),
        );
        match (available, required) {
            (Some(available), Some(required)) if available >= required => {}
            (available, required) => {
                return Err(BuildError::InsufficientInputValue {
                    available: available.map_or(u64::MAX, |v| v.as_u64()),
                    required: required.map_or(u64::MAX, |v| v.as_u64()),
                });
            }
        }

        Ok(Self {
            spending_key,
            payments,
            anchors,
            notes,
            fee,
            lock_time: 0,
        })
    }

    pub fn with_lock_time(mut self, lock_time: u64) -> Self {
        self.lock_time = lock_time;
        self
    }
}

// ============================================================================
// Shard Working Set
// ============================================================================

/// Per-build copy of the commitment trees of every touched shard
#[derive(Debug, Default)]
pub struct ShardWorkingSet {
    trees: HashMap<ShardId, MerkleTree>,
}

impl ShardWorkingSet {
    pub fn load<S, I>(store: &S, shards: I) -> Self
    where
        S: CommitmentStore + ?Sized,
        I: IntoIterator<Item = ShardId>,
    {
        let trees = shards
            .into_iter()
            .map(|shard| {
                let commitments = store.list_commitments(shard);
                (shard, MerkleTree::from_commitments(&commitments))
            })
            .collect();
        Self { trees }
    }

    pub fn root(&self, shard: ShardId) -> [u8; 32] {
        match self.trees.get(&shard) {
            Some(tree) => tree.root(),
            None => MerkleTree::new().root(),
        }
    }

    pub fn witness(&self, shard: ShardId, commitment: &Commitment) -> Option<MerklePath> {
        self.trees.get(&shard)?.witness(commitment)
    }

    pub fn append(&mut self, shard: ShardId, commitment: &Commitment) {
        self.trees.entry(shard).or_default().insert(commitment);
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct TxBuilder<'a> {
    ctx: &'a CurveContext,
    prover: &'a dyn JoinSplitProver,
    tx_version: u32,
    shard_count: u8,
}

/// One output slot before randomness is fixed
struct PlannedOutput {
    value: u64,
    address: PaymentAddress,
}

impl<'a> TxBuilder<'a> {
    pub fn new(ctx: &'a CurveContext, prover: &'a dyn JoinSplitProver) -> Self {
        Self {
            ctx,
            prover,
            tx_version: DEFAULT_TX_VERSION,
            shard_count: DEFAULT_SHARD_COUNT,
        }
    }

    pub fn from_config(
        ctx: &'a CurveContext,
        prover: &'a dyn JoinSplitProver,
        config: &CinderConfig,
    ) -> Self {
        Self {
            ctx,
            prover,
            tx_version: config.builder.tx_version,
            shard_count: config.builder.shard_count,
        }
    }

    pub fn shard_of(&self, address: &PaymentAddress) -> ShardId {
        ShardId::of(&address.apk, self.shard_count)
    }

    /// Build and sign a transaction
    pub fn build<S, R>(
        &self,
        request: BuildRequest,
        store: &S,
        rng: &mut R,
    ) -> Result<ShieldedTransaction, BuildError>
    where
        S: CommitmentStore + ?Sized,
        R: RngCore + CryptoRng,
    {
        let BuildRequest {
            spending_key,
            payments,
            anchors,
            mut notes,
            fee,
            lock_time,
        } = request;

        let sender = spending_key.payment_address();
        let sender_shard = self.shard_of(&sender);

        let touched: HashSet<ShardId> = notes
            .iter()
            .map(|n| n.shard)
            .chain([sender_shard])
            .collect();
        let mut working = ShardWorkingSet::load(store, touched);

        let schnorr = Schnorr::new(self.ctx);
        let signing_key = schnorr.keygen(rng);
        let signing_pubkey = signing_key.public_key();

        let mut payments: VecDeque<PaymentRequest> = payments.into();

        let mut descriptors = Vec::new();
        while !notes.is_empty() || !payments.is_empty() {
            if descriptors.len() == MAX_DESCRIPTORS {
                warn!("Build needs more than {} descriptors", MAX_DESCRIPTORS);
                return Err(BuildError::TooManyDescriptors {
                    limit: MAX_DESCRIPTORS,
                });
            }
            let first = descriptors.is_empty();
            let desc_fee = if first { fee } else { 0 };

            // 1-2. largest notes and payments first; splits and change reorder both
            notes.sort_by(|a, b| b.note.value().cmp(&a.note.value()));
            payments
                .make_contiguous()
                .sort_by(|a, b| b.amount.cmp(&a.amount));
            let take = notes.len().min(NUM_DESC_INPUTS);
            let selected: Vec<SpendableNote> = notes.drain(..take).collect();
            if selected.is_empty() {
                return Err(BuildError::InsufficientInputValue {
                    available: 0,
                    required: payments
                        .iter()
                        .fold(0u64, |acc, p| acc.saturating_add(p.amount)),
                });
            }

            let input_value = NoteValue::checked_sum(selected.iter().map(|n| n.note.value()))
                .map(|v| v.as_u64())
                .ok_or(BuildError::InsufficientInputValue {
                    available: u64::MAX,
                    required: u64::MAX,
                })?;
            let mut remaining =
                input_value
                    .checked_sub(desc_fee)
                    .ok_or(BuildError::InsufficientInputValue {
                        available: input_value,
                        required: desc_fee,
                    })?;

            // 4-5. membership and witness paths
            let mut inputs = Vec::with_capacity(NUM_DESC_INPUTS);
            let mut input_anchors = Vec::with_capacity(NUM_DESC_INPUTS);
            for spendable in &selected {
                let commitment = spendable.note.commitment();
                let path = working.witness(spendable.shard, &commitment).ok_or(
                    BuildError::CommitmentNotFound {
                        shard: spendable.shard,
                        commitment,
                    },
                )?;
                input_anchors.push(working.root(spendable.shard));
                inputs.push(InputWitness {
                    note: spendable.note.clone().with_nullifier(&spending_key),
                    spending_key: spending_key.clone(),
                    path,
                });
            }

            // 6. anchors supplied by the caller must match
            if first {
                for spendable in &selected {
                    let shard = spendable.shard;
                    if anchors.get(&shard) != Some(&working.root(shard)) {
                        warn!("Anchor mismatch for {}", shard);
                        return Err(BuildError::AnchorMismatch { shard });
                    }
                }
            }

            // 3. dummy inputs
            let dummy_anchor = input_anchors
                .first()
                .copied()
                .unwrap_or_else(|| working.root(sender_shard));
            while inputs.len() < NUM_DESC_INPUTS {
                let dummy_key = SpendingKey::random(rng);
                inputs.push(InputWitness {
                    note: Note::dummy(&dummy_key, rng),
                    spending_key: dummy_key,
                    path: MerklePath::empty(),
                });
                input_anchors.push(dummy_anchor);
            }

            // 7. payments, splitting when the input value runs short
            let mut planned = Vec::with_capacity(NUM_DESC_OUTPUTS);
            while planned.len() < NUM_DESC_OUTPUTS - 1 && remaining > 0 {
                let Some(payment) = payments.front_mut() else {
                    break;
                };
                if payment.amount <= remaining {
                    remaining -= payment.amount;
                    planned.push(PlannedOutput {
                        value: payment.amount,
                        address: payment.address,
                    });
                    payments.pop_front();
                } else {
                    debug!(
                        "Splitting payment of {}: {} now, rest later",
                        payment.amount, remaining
                    );
                    payment.amount -= remaining;
                    planned.push(PlannedOutput {
                        value: remaining,
                        address: payment.address,
                    });
                    remaining = 0;
                }
            }
            if remaining > 0 && payments.front().is_some_and(|p| p.amount == remaining) {
                if let Some(payment) = payments.pop_front() {
                    planned.push(PlannedOutput {
                        value: payment.amount,
                        address: payment.address,
                    });
                    remaining = 0;
                }
            }

            // 8. change back to the sender
            let change_slot = (remaining > 0).then(|| {
                planned.push(PlannedOutput {
                    value: remaining,
                    address: sender,
                });
                planned.len() - 1
            });

            // 9. dummy outputs to random addresses
            while planned.len() < NUM_DESC_OUTPUTS {
                planned.push(PlannedOutput {
                    value: 0,
                    address: SpendingKey::random(rng).payment_address(),
                });
            }

            let descriptor_index = descriptors.len();
            let (descriptor, outputs) = self.assemble(
                inputs,
                input_anchors,
                planned,
                0,
                desc_fee,
                sender_shard,
                &signing_pubkey,
                rng,
            )?;
            debug!(
                "Descriptor {}: {} real inputs, input value {}, change {:?}",
                descriptor_index,
                selected.len(),
                input_value,
                change_slot.map(|slot| outputs[slot].value().as_u64())
            );

            // 11. later descriptors see these outputs
            for output in &outputs {
                working.append(sender_shard, &output.commitment());
            }
            if let Some(slot) = change_slot {
                if !payments.is_empty() {
                    debug!("Re-queueing change note for the next descriptor");
                    notes.push(SpendableNote::new(outputs[slot].clone(), sender_shard));
                }
            }

            descriptors.push(descriptor);
        }

        info!(
            "Built shielded transaction: {} descriptors, fee {}",
            descriptors.len(),
            fee
        );

        let unsigned = UnsignedTransaction {
            version: self.tx_version,
            kind: TxKind::Normal,
            lock_time,
            fee,
            descriptors,
            signing_pubkey,
            shard_selector: sender_shard.as_u8(),
        };
        Ok(unsigned.sign(self.ctx, &signing_key, rng)?)
    }

    /// Mint `reward` to `address` from nothing: a salary transaction with two
    /// dummy inputs, as issued by a block producer.
    pub fn build_salary<S, R>(
        &self,
        address: PaymentAddress,
        reward: u64,
        store: &S,
        rng: &mut R,
    ) -> Result<ShieldedTransaction, BuildError>
    where
        S: CommitmentStore + ?Sized,
        R: RngCore + CryptoRng,
    {
        if reward == 0 {
            return Err(BuildError::InvalidRequest("zero reward"));
        }

        let shard = self.shard_of(&address);
        let working = ShardWorkingSet::load(store, [shard]);
        let anchor = working.root(shard);

        let schnorr = Schnorr::new(self.ctx);
        let signing_key = schnorr.keygen(rng);
        let signing_pubkey = signing_key.public_key();

        let mut inputs = Vec::with_capacity(NUM_DESC_INPUTS);
        for _ in 0..NUM_DESC_INPUTS {
            let dummy_key = SpendingKey::random(rng);
            inputs.push(InputWitness {
                note: Note::dummy(&dummy_key, rng),
                spending_key: dummy_key,
                path: MerklePath::empty(),
            });
        }

        let mut planned = vec![PlannedOutput {
            value: reward,
            address,
        }];
        while planned.len() < NUM_DESC_OUTPUTS {
            planned.push(PlannedOutput {
                value: 0,
                address: SpendingKey::random(rng).payment_address(),
            });
        }

        let (descriptor, _) = self.assemble(
            inputs,
            vec![anchor; NUM_DESC_INPUTS],
            planned,
            reward,
            0,
            shard,
            &signing_pubkey,
            rng,
        )?;
        info!("Built salary transaction: reward {} to {}", reward, shard);

        let unsigned = UnsignedTransaction {
            version: self.tx_version,
            kind: TxKind::Salary,
            lock_time: 0,
            fee: 0,
            descriptors: vec![descriptor],
            signing_pubkey,
            shard_selector: shard.as_u8(),
        };
        Ok(unsigned.sign(self.ctx, &signing_key, rng)?)
    }

    /// Fix output randomness, prove, encrypt. Returns the descriptor and its
    /// output notes.
    #[allow(clippy::too_many_arguments)]
    fn assemble<R: RngCore + CryptoRng>(
        &self,
        inputs: Vec<InputWitness>,
        anchors: Vec<[u8; 32]>,
        planned: Vec<PlannedOutput>,
        reward: u64,
        fee: u64,
        shard: ShardId,
        signing_pubkey: &PublicKey,
        rng: &mut R,
    ) -> Result<(JoinSplitDescriptor, [Note; NUM_DESC_OUTPUTS]), BuildError> {
        let inputs: [InputWitness; NUM_DESC_INPUTS] =
            inputs
                .try_into()
                .map_err(|v: Vec<_>| BuildError::DescriptorArityViolation {
                    side: "inputs",
                    expected: NUM_DESC_INPUTS,
                    got: v.len(),
                })?;
        let anchors: [[u8; 32]; NUM_DESC_INPUTS] =
            anchors
                .try_into()
                .map_err(|v: Vec<_>| BuildError::DescriptorArityViolation {
                    side: "anchors",
                    expected: NUM_DESC_INPUTS,
                    got: v.len(),
                })?;
        let planned: [PlannedOutput; NUM_DESC_OUTPUTS] =
            planned
                .try_into()
                .map_err(|v: Vec<_>| BuildError::DescriptorArityViolation {
                    side: "outputs",
                    expected: NUM_DESC_OUTPUTS,
                    got: v.len(),
                })?;

        let nullifiers: [Nullifier; NUM_DESC_INPUTS] = inputs.each_ref().map(|input| {
            input
                .note
                .nullifier()
                .unwrap_or_else(|| Nullifier::derive(&input.spending_key, input.note.rho()))
        });

        let mut h_sig_seed = [0u8; 32];
        rng.fill_bytes(&mut h_sig_seed);
        let h_sig = h_sig(&h_sig_seed, &nullifiers, signing_pubkey);

        // 10. output rho from phi, fresh r
        let mut phi = [0u8; 32];
        rng.fill_bytes(&mut phi);
        let mut index = 0u8;
        let outputs: [Note; NUM_DESC_OUTPUTS] = planned.each_ref().map(|out| {
            let rho = prf_rho(&phi, index, &h_sig);
            index += 1;
            let mut r = [0u8; 32];
            rng.fill_bytes(&mut r);
            Note::new(out.value, out.address.apk, rho, r)
        });

        let mut macs = [[0u8; 32]; NUM_DESC_INPUTS];
        for (i, (mac, input)) in macs.iter_mut().zip(inputs.iter()).enumerate() {
            *mac = prf_pk(input.spending_key.as_bytes(), i as u8, &h_sig);
        }

        let statement = JoinSplitStatement {
            anchors,
            nullifiers,
            commitments: outputs.each_ref().map(Note::commitment),
            macs,
            h_sig,
            reward,
            fee,
            shard,
        };
        let request = ProveRequest {
            statement,
            inputs,
            outputs: outputs.clone(),
            phi,
        };

        let reply = self.prover.prove(&request).map_err(|e| {
            warn!("Prover call failed: {:#}", e);
            BuildError::ProverUnavailable(format!("{e:#}"))
        })?;
        if !reply.success {
            return Err(BuildError::ProofRejected);
        }

        let ephemeral = EphemeralKey::random(rng);
        let mut ciphertexts: [Vec<u8>; NUM_DESC_OUTPUTS] = Default::default();
        for (j, (ct, (note, out))) in ciphertexts
            .iter_mut()
            .zip(outputs.iter().zip(planned.iter()))
            .enumerate()
        {
            *ct = encrypt_note(note, &out.address.pk_enc, &ephemeral, &h_sig, j as u8)?;
        }

        let statement = request.statement;
        let descriptor = JoinSplitDescriptor {
            anchors: statement.anchors,
            nullifiers: statement.nullifiers,
            commitments: statement.commitments,
            proof: reply.proof,
            ciphertexts,
            ephemeral_pubkey: ephemeral.public_bytes(),
            h_sig_seed,
            reward: statement.reward,
            macs: statement.macs,
        };
        Ok((descriptor, outputs))
    }
}
