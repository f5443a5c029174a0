#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use cinder_core::{
    JoinSplitProver, MemoryStore, MockProver, ProveReply, ProveRequest, SpendableNote,
    VerifyReply, VerifyRequest,
};
use cinder_privacy::{FullKey, Note};
use cinder_transaction::{DEFAULT_SHARD_COUNT, ShardId};
use rand::rngs::OsRng;

/// A sender with notes already committed to its shard
pub struct Wallet {
    pub key: FullKey,
    pub shard: ShardId,
    pub notes: Vec<SpendableNote>,
}

impl Wallet {
    pub fn new() -> Self {
        let key = FullKey::random(&mut OsRng);
        let shard = ShardId::of(&key.address.apk, DEFAULT_SHARD_COUNT);
        Self {
            key,
            shard,
            notes: Vec::new(),
        }
    }

    /// Mint a note of `value` and commit it in `store`
    pub fn fund(&mut self, store: &mut MemoryStore, value: u64) -> Note {
        let note = Note::random(value, self.key.address.apk, &mut OsRng);
        store.append_commitment(self.shard, note.commitment());
        self.notes.push(SpendableNote::new(note.clone(), self.shard));
        note
    }

    pub fn anchors(&self, store: &MemoryStore) -> HashMap<ShardId, [u8; 32]> {
        HashMap::from([(self.shard, store.anchor(self.shard))])
    }
}

/// Forwards to [`MockProver`] and keeps every prove request
#[derive(Default)]
pub struct RecordingProver {
    inner: MockProver,
    pub requests: Mutex<Vec<ProveRequest>>,
}

impl RecordingProver {
    pub fn take(&self) -> Vec<ProveRequest> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }
}

impl JoinSplitProver for RecordingProver {
    fn prove(&self, request: &ProveRequest) -> Result<ProveReply> {
        self.requests.lock().unwrap().push(request.clone());
        self.inner.prove(request)
    }

    fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply> {
        self.inner.verify(request)
    }
}

/// Always answers with a rejection
pub struct RejectingProver;

impl JoinSplitProver for RejectingProver {
    fn prove(&self, _request: &ProveRequest) -> Result<ProveReply> {
        Ok(ProveReply {
            success: false,
            proof: Vec::new(),
        })
    }

    fn verify(&self, _request: &VerifyRequest) -> Result<VerifyReply> {
        Ok(VerifyReply { success: false })
    }
}
