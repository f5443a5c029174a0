use cinder_privacy::{Commitment, Nullifier};
use cinder_signature::PublicKey;

/// Inputs per descriptor, real or dummy
pub const NUM_DESC_INPUTS: usize = 2;
/// Outputs per descriptor, real or dummy
pub const NUM_DESC_OUTPUTS: usize = 2;

const H_SIG_CONTEXT: &str = "cinder hsig";

/// One fixed-arity join-split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSplitDescriptor {
    /// Root of each input's shard tree
    pub anchors: [[u8; 32]; NUM_DESC_INPUTS],
    pub nullifiers: [Nullifier; NUM_DESC_INPUTS],
    pub commitments: [Commitment; NUM_DESC_OUTPUTS],
    pub proof: Vec<u8>,
    /// Encrypted note for each output slot
    pub ciphertexts: [Vec<u8>; NUM_DESC_OUTPUTS],
    pub ephemeral_pubkey: [u8; 32],
    pub h_sig_seed: [u8; 32],
    pub reward: u64,
    /// Value-authorising tags, one per input slot
    pub macs: [[u8; 32]; NUM_DESC_INPUTS],
}

impl JoinSplitDescriptor {
    /// hSig binding this descriptor to the transaction's signing key
    pub fn h_sig(&self, signing_pubkey: &PublicKey) -> [u8; 32] {
        h_sig(&self.h_sig_seed, &self.nullifiers, signing_pubkey)
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        let fixed = 32 * (3 * NUM_DESC_INPUTS + NUM_DESC_OUTPUTS) + 32 + 32 + 8;
        let proof = 4 + self.proof.len();
        let ciphertexts: usize = self.ciphertexts.iter().map(|c| 4 + c.len()).sum();
        fixed + proof + ciphertexts
    }
}

/// `hSig = BLAKE3-derive("cinder hsig", seed || nf_0 || nf_1 || signing_pubkey)`
pub fn h_sig(
    seed: &[u8; 32],
    nullifiers: &[Nullifier; NUM_DESC_INPUTS],
    signing_pubkey: &PublicKey,
) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(H_SIG_CONTEXT);
    hasher.update(seed);
    for nf in nullifiers {
        hasher.update(nf.as_bytes());
    }
    hasher.update(signing_pubkey.as_bytes());
    *hasher.finalize().as_bytes()
}
