//! Commitment / nullifier store boundary.
//!
//! The core only reads shard state; `MemoryStore` additionally lets a ledger
//! (or a test) apply transactions and look up spent nullifiers.

use std::collections::{HashMap, HashSet};

use cinder_privacy::{Commitment, MerkleTree, Nullifier};
use cinder_transaction::{ShardId, ShieldedTransaction};

/// Read access to per-shard commitments and nullifiers
pub trait CommitmentStore {
    /// Commitments of `shard` in insertion order
    fn list_commitments(&self, shard: ShardId) -> Vec<Commitment>;

    fn list_nullifiers(&self, shard: ShardId) -> HashSet<Nullifier>;
}

#[derive(Debug, Default, Clone)]
struct ShardState {
    commitments: Vec<Commitment>,
    nullifiers: HashSet<Nullifier>,
}

/// In-memory store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    shards: HashMap<ShardId, ShardState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_commitment(&mut self, shard: ShardId, commitment: Commitment) {
        self.shards
            .entry(shard)
            .or_default()
            .commitments
            .push(commitment);
    }

    /// Returns `false` if the nullifier was already present
    pub fn insert_nullifier(&mut self, shard: ShardId, nullifier: Nullifier) -> bool {
        self.shards
            .entry(shard)
            .or_default()
            .nullifiers
            .insert(nullifier)
    }

    /// Merkle root over the shard's commitments
    pub fn anchor(&self, shard: ShardId) -> [u8; 32] {
        let commitments = self
            .shards
            .get(&shard)
            .map(|s| s.commitments.as_slice())
            .unwrap_or_default();
        MerkleTree::from_commitments(commitments).root()
    }

    /// Nullifiers of `tx` already spent in its shard
    pub fn spent_nullifiers(&self, tx: &ShieldedTransaction) -> Vec<Nullifier> {
        let Some(state) = self.shards.get(&ShardId(tx.shard_selector())) else {
            return Vec::new();
        };
        tx.nullifiers()
            .into_iter()
            .filter(|nf| state.nullifiers.contains(nf))
            .collect()
    }

    /// Record the nullifiers and output commitments of an included transaction
    pub fn apply(&mut self, tx: &ShieldedTransaction) {
        let shard = ShardId(tx.shard_selector());
        let state = self.shards.entry(shard).or_default();
        for desc in tx.descriptors() {
            state.nullifiers.extend(desc.nullifiers.iter().copied());
            state.commitments.extend(desc.commitments.iter().copied());
        }
    }
}

impl CommitmentStore for MemoryStore {
    fn list_commitments(&self, shard: ShardId) -> Vec<Commitment> {
        self.shards
            .get(&shard)
            .map(|s| s.commitments.clone())
            .unwrap_or_default()
    }

    fn list_nullifiers(&self, shard: ShardId) -> HashSet<Nullifier> {
        self.shards
            .get(&shard)
            .map(|s| s.nullifiers.clone())
            .unwrap_or_default()
    }
}
