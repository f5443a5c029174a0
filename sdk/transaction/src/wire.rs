//! Wire encoding
//!
//! ```text
//! version u32 | kind u8 | lock_time u64 | fee u64 | shard_selector u8
//! signing_pubkey [32] | descriptor_count u32 | descriptors.. | signature [96]
//!
//! descriptor:
//! anchors [2][32] | nullifiers [2][32] | commitments [2][32]
//! proof_len u32 | proof | (ct_len u32 | ct) x2
//! ephemeral_pubkey [32] | h_sig_seed [32] | reward u64 | macs [2][32]
//! ```
//!
//! Integers are big-endian. The signed hash covers everything before the
//! signature.

use std::io::{self, Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use cinder_privacy::{Commitment, Nullifier};
use cinder_signature::{PublicKey, Signature};
use thiserror::Error;

use crate::descriptor::{JoinSplitDescriptor, NUM_DESC_INPUTS, NUM_DESC_OUTPUTS};
use crate::transaction::{ShieldedTransaction, TxKind, UnsignedTransaction};

pub const MAX_PROOF_LEN: usize = 64 * 1024;
pub const MAX_CIPHERTEXT_LEN: usize = 1024;
pub const MAX_DESCRIPTORS: usize = 256;

/// version + kind + lock_time + fee + shard + pubkey + count
const HEADER_LEN: usize = 4 + 1 + 8 + 8 + 1 + 32 + 4;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("truncated or unreadable input: {0}")]
    Io(#[from] io::Error),

    #[error("unknown transaction kind {0}")]
    UnknownKind(u8),

    #[error("proof of {0} bytes exceeds limit")]
    ProofTooLarge(usize),

    #[error("ciphertext of {0} bytes exceeds limit")]
    CiphertextTooLarge(usize),

    #[error("descriptor count {0} out of range")]
    DescriptorCount(usize),

    #[error("{0} trailing bytes")]
    TrailingBytes(usize),
}

fn read_array<R: Read>(r: &mut R) -> io::Result<[u8; 32]> {
    let mut out = [0u8; 32];
    r.read_exact(&mut out)?;
    Ok(out)
}

fn read_blob<R: Read>(
    r: &mut R,
    limit: usize,
    too_large: fn(usize) -> WireError,
) -> Result<Vec<u8>, WireError> {
    let len = r.read_u32::<BigEndian>()? as usize;
    if len > limit {
        return Err(too_large(len));
    }
    let mut out = vec![0u8; len];
    r.read_exact(&mut out)?;
    Ok(out)
}

impl JoinSplitDescriptor {
    /// Encode, refusing blobs the decoder would reject
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.check_limits()?;
        self.encode(w)?;
        Ok(())
    }

    pub(crate) fn check_limits(&self) -> Result<(), WireError> {
        if self.proof.len() > MAX_PROOF_LEN {
            return Err(WireError::ProofTooLarge(self.proof.len()));
        }
        if let Some(ct) = self.ciphertexts.iter().find(|ct| ct.len() > MAX_CIPHERTEXT_LEN) {
            return Err(WireError::CiphertextTooLarge(ct.len()));
        }
        Ok(())
    }

    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for anchor in &self.anchors {
            w.write_all(anchor)?;
        }
        for nf in &self.nullifiers {
            w.write_all(nf.as_bytes())?;
        }
        for cm in &self.commitments {
            w.write_all(cm.as_bytes())?;
        }
        w.write_u32::<BigEndian>(self.proof.len() as u32)?;
        w.write_all(&self.proof)?;
        for ct in &self.ciphertexts {
            w.write_u32::<BigEndian>(ct.len() as u32)?;
            w.write_all(ct)?;
        }
        w.write_all(&self.ephemeral_pubkey)?;
        w.write_all(&self.h_sig_seed)?;
        w.write_u64::<BigEndian>(self.reward)?;
        for mac in &self.macs {
            w.write_all(mac)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let mut anchors = [[0u8; 32]; NUM_DESC_INPUTS];
        for anchor in anchors.iter_mut() {
            *anchor = read_array(r)?;
        }
        let mut nullifiers = [Nullifier([0u8; 32]); NUM_DESC_INPUTS];
        for nf in nullifiers.iter_mut() {
            *nf = Nullifier(read_array(r)?);
        }
        let mut commitments = [Commitment([0u8; 32]); NUM_DESC_OUTPUTS];
        for cm in commitments.iter_mut() {
            *cm = Commitment(read_array(r)?);
        }
        let proof = read_blob(r, MAX_PROOF_LEN, WireError::ProofTooLarge)?;
        let mut ciphertexts: [Vec<u8>; NUM_DESC_OUTPUTS] = Default::default();
        for ct in ciphertexts.iter_mut() {
            *ct = read_blob(r, MAX_CIPHERTEXT_LEN, WireError::CiphertextTooLarge)?;
        }
        let ephemeral_pubkey = read_array(r)?;
        let h_sig_seed = read_array(r)?;
        let reward = r.read_u64::<BigEndian>()?;
        let mut macs = [[0u8; 32]; NUM_DESC_INPUTS];
        for mac in macs.iter_mut() {
            *mac = read_array(r)?;
        }

        Ok(Self {
            anchors,
            nullifiers,
            commitments,
            proof,
            ciphertexts,
            ephemeral_pubkey,
            h_sig_seed,
            reward,
            macs,
        })
    }
}

impl UnsignedTransaction {
    /// Encode, refusing anything [`ShieldedTransaction::from_bytes`] would reject
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.check_limits()?;
        self.encode(w)?;
        Ok(())
    }

    pub fn check_limits(&self) -> Result<(), WireError> {
        let count = self.descriptors.len();
        if count == 0 || count > MAX_DESCRIPTORS {
            return Err(WireError::DescriptorCount(count));
        }
        self.descriptors
            .iter()
            .try_for_each(JoinSplitDescriptor::check_limits)
    }

    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<BigEndian>(self.version)?;
        w.write_u8(self.kind.as_u8())?;
        w.write_u64::<BigEndian>(self.lock_time)?;
        w.write_u64::<BigEndian>(self.fee)?;
        w.write_u8(self.shard_selector)?;
        w.write_all(self.signing_pubkey.as_bytes())?;
        w.write_u32::<BigEndian>(self.descriptors.len() as u32)?;
        for desc in &self.descriptors {
            desc.encode(w)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Encoding without the limit checks; the signed hash covers this
    pub(crate) fn hash_preimage(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        // writing into a Vec cannot fail
        let _ = self.encode(&mut out);
        out
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_LEN
            + self
                .descriptors
                .iter()
                .map(JoinSplitDescriptor::encoded_len)
                .sum::<usize>()
    }

    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let version = r.read_u32::<BigEndian>()?;
        let kind_byte = r.read_u8()?;
        let kind = TxKind::from_u8(kind_byte).ok_or(WireError::UnknownKind(kind_byte))?;
        let lock_time = r.read_u64::<BigEndian>()?;
        let fee = r.read_u64::<BigEndian>()?;
        let shard_selector = r.read_u8()?;
        let signing_pubkey = PublicKey(read_array(r)?);

        let count = r.read_u32::<BigEndian>()? as usize;
        if count == 0 || count > MAX_DESCRIPTORS {
            return Err(WireError::DescriptorCount(count));
        }
        let mut descriptors = Vec::with_capacity(count);
        for _ in 0..count {
            descriptors.push(JoinSplitDescriptor::read_from(r)?);
        }

        Ok(Self {
            version,
            kind,
            lock_time,
            fee,
            descriptors,
            signing_pubkey,
            shard_selector,
        })
    }
}

impl ShieldedTransaction {
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut out = self.body.to_bytes()?;
        out.extend_from_slice(self.signature.as_bytes());
        Ok(out)
    }

    /// Decode a complete transaction; the input must be consumed exactly
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let mut cursor = Cursor::new(bytes);
        let body = UnsignedTransaction::read_from(&mut cursor)?;
        let mut signature = [0u8; Signature::LEN];
        cursor.read_exact(&mut signature)?;

        let remaining = bytes.len() - cursor.position() as usize;
        if remaining != 0 {
            return Err(WireError::TrailingBytes(remaining));
        }

        Ok(Self {
            body,
            signature: Signature(signature),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> JoinSplitDescriptor {
        JoinSplitDescriptor {
            anchors: [[1u8; 32], [2u8; 32]],
            nullifiers: [Nullifier([3u8; 32]), Nullifier([4u8; 32])],
            commitments: [Commitment([5u8; 32]), Commitment([6u8; 32])],
            proof: vec![7u8; 32],
            ciphertexts: [vec![8u8; 88], vec![9u8; 88]],
            ephemeral_pubkey: [10u8; 32],
            h_sig_seed: [11u8; 32],
            reward: 12,
            macs: [[13u8; 32], [14u8; 32]],
        }
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let desc = descriptor();
        let mut bytes = Vec::new();
        desc.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), desc.encoded_len());

        let decoded = JoinSplitDescriptor::read_from(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(decoded, desc);
    }

    #[test]
    fn test_oversized_proof_rejected() {
        let mut desc = descriptor();
        desc.proof = vec![0u8; MAX_PROOF_LEN + 1];
        let mut bytes = Vec::new();
        assert!(matches!(
            desc.write_to(&mut bytes),
            Err(WireError::ProofTooLarge(n)) if n == MAX_PROOF_LEN + 1
        ));

        desc.encode(&mut bytes).unwrap();
        assert!(matches!(
            JoinSplitDescriptor::read_from(&mut Cursor::new(&bytes)),
            Err(WireError::ProofTooLarge(n)) if n == MAX_PROOF_LEN + 1
        ));
    }

    #[test]
    fn test_oversized_ciphertext_rejected() {
        let mut desc = descriptor();
        desc.ciphertexts[1] = vec![0u8; MAX_CIPHERTEXT_LEN + 1];
        let mut bytes = Vec::new();
        assert!(matches!(
            desc.write_to(&mut bytes),
            Err(WireError::CiphertextTooLarge(_))
        ));

        desc.encode(&mut bytes).unwrap();
        assert!(matches!(
            JoinSplitDescriptor::read_from(&mut Cursor::new(&bytes)),
            Err(WireError::CiphertextTooLarge(_))
        ));
    }

    #[test]
    fn test_encoder_enforces_descriptor_count() {
        let mut unsigned = UnsignedTransaction {
            version: 1,
            kind: TxKind::Normal,
            lock_time: 0,
            fee: 0,
            descriptors: Vec::new(),
            signing_pubkey: PublicKey([0u8; 32]),
            shard_selector: 0,
        };
        assert!(matches!(unsigned.to_bytes(), Err(WireError::DescriptorCount(0))));

        unsigned.descriptors = vec![descriptor(); MAX_DESCRIPTORS];
        assert!(unsigned.to_bytes().is_ok());

        unsigned.descriptors.push(descriptor());
        assert!(matches!(
            unsigned.to_bytes(),
            Err(WireError::DescriptorCount(n)) if n == MAX_DESCRIPTORS + 1
        ));
    }
}
