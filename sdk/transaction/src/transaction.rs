use cinder_curve::CurveContext;
use cinder_privacy::Nullifier;
use cinder_signature::{
    PublicKey, Schnorr, SchnorrKeypair, Signature, SignatureError, SignatureScheme,
};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::descriptor::JoinSplitDescriptor;

/// Transaction kind, one byte on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    /// Wallet-built shielded transfer
    Normal,
    /// Block-producer reward; descriptors carry a non-zero `reward`
    Salary,
}

impl TxKind {
    pub fn as_u8(self) -> u8 {
        match self {
            TxKind::Normal => 0,
            TxKind::Salary => 1,
        }
    }

    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(TxKind::Normal),
            1 => Some(TxKind::Salary),
            _ => None,
        }
    }
}

/// Draft transaction; signing consumes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub version: u32,
    pub kind: TxKind,
    pub lock_time: u64,
    pub fee: u64,
    pub descriptors: Vec<JoinSplitDescriptor>,
    pub signing_pubkey: PublicKey,
    pub shard_selector: u8,
}

impl UnsignedTransaction {
    /// Double SHA-256 over the encoding without the signature
    pub fn hash(&self) -> [u8; 32] {
        let first = Sha256::digest(self.hash_preimage());
        Sha256::digest(first).into()
    }

    /// Sign with the one-time key whose public half is `signing_pubkey`
    pub fn sign<R: RngCore + CryptoRng>(
        self,
        ctx: &CurveContext,
        keypair: &SchnorrKeypair,
        rng: &mut R,
    ) -> Result<ShieldedTransaction, SignatureError> {
        if keypair.public_key() != self.signing_pubkey {
            return Err(SignatureError::KeyMismatch);
        }
        let signature = Schnorr::new(ctx).sign(keypair, &self.hash(), rng)?;
        Ok(ShieldedTransaction {
            body: self,
            signature,
        })
    }
}

/// Signed shielded transaction. Fields are read-only; a changed body needs a
/// new signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldedTransaction {
    pub(crate) body: UnsignedTransaction,
    pub(crate) signature: Signature,
}

impl ShieldedTransaction {
    pub fn version(&self) -> u32 {
        self.body.version
    }

    pub fn kind(&self) -> TxKind {
        self.body.kind
    }

    pub fn lock_time(&self) -> u64 {
        self.body.lock_time
    }

    pub fn fee(&self) -> u64 {
        self.body.fee
    }

    pub fn descriptors(&self) -> &[JoinSplitDescriptor] {
        &self.body.descriptors
    }

    pub fn signing_pubkey(&self) -> &PublicKey {
        &self.body.signing_pubkey
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn shard_selector(&self) -> u8 {
        self.body.shard_selector
    }

    /// The signed hash
    pub fn hash(&self) -> [u8; 32] {
        self.body.hash()
    }

    /// Every nullifier spent, in descriptor order
    pub fn nullifiers(&self) -> Vec<Nullifier> {
        self.body
            .descriptors
            .iter()
            .flat_map(|d| d.nullifiers.iter().copied())
            .collect()
    }

    /// Check the embedded signature against the embedded one-time key
    pub fn verify_signature(&self, ctx: &CurveContext) -> bool {
        Schnorr::new(ctx).verify(&self.body.signing_pubkey, &self.signature, &self.hash())
    }

    /// Encoded size in bytes
    pub fn estimated_size(&self) -> usize {
        self.body.encoded_len() + Signature::LEN
    }

    /// Drop the signature, e.g. to re-sign after a change
    pub fn into_unsigned(self) -> UnsignedTransaction {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{NUM_DESC_INPUTS, NUM_DESC_OUTPUTS};
    use cinder_privacy::Commitment;
    use rand::rngs::OsRng;

    fn descriptor(tag: u8) -> JoinSplitDescriptor {
        JoinSplitDescriptor {
            anchors: [[tag; 32]; NUM_DESC_INPUTS],
            nullifiers: [Nullifier([tag; 32]), Nullifier([tag + 1; 32])],
            commitments: [Commitment([tag + 2; 32]); NUM_DESC_OUTPUTS],
            proof: vec![tag; 32],
            ciphertexts: [vec![1u8; 88], vec![2u8; 88]],
            ephemeral_pubkey: [5u8; 32],
            h_sig_seed: [6u8; 32],
            reward: 0,
            macs: [[7u8; 32]; NUM_DESC_INPUTS],
        }
    }

    fn draft(keypair: &SchnorrKeypair) -> UnsignedTransaction {
        UnsignedTransaction {
            version: 1,
            kind: TxKind::Normal,
            lock_time: 0,
            fee: 10,
            descriptors: vec![descriptor(10), descriptor(20)],
            signing_pubkey: keypair.public_key(),
            shard_selector: 3,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let ctx = CurveContext::new();
        let kp = Schnorr::new(&ctx).keygen(&mut OsRng);
        let tx = draft(&kp).sign(&ctx, &kp, &mut OsRng).unwrap();

        assert!(tx.verify_signature(&ctx));
        assert_eq!(tx.nullifiers().len(), 4);
        assert_eq!(tx.nullifiers()[2], Nullifier([20u8; 32]));
        assert_eq!(tx.estimated_size(), tx.to_bytes().unwrap().len());
    }

    #[test]
    fn test_sign_with_wrong_key() {
        let ctx = CurveContext::new();
        let schnorr = Schnorr::new(&ctx);
        let kp = schnorr.keygen(&mut OsRng);
        let other = schnorr.keygen(&mut OsRng);

        assert_eq!(
            draft(&kp).sign(&ctx, &other, &mut OsRng).unwrap_err(),
            SignatureError::KeyMismatch
        );
    }

    #[test]
    fn test_mutation_invalidates_signature() {
        let ctx = CurveContext::new();
        let kp = Schnorr::new(&ctx).keygen(&mut OsRng);
        let tx = draft(&kp).sign(&ctx, &kp, &mut OsRng).unwrap();
        let signature = *tx.signature();

        let mut body = tx.into_unsigned();
        body.fee += 1;
        let forged = ShieldedTransaction { body, signature };
        assert!(!forged.verify_signature(&ctx));
    }

    #[test]
    fn test_hash_excludes_signature() {
        let ctx = CurveContext::new();
        let kp = Schnorr::new(&ctx).keygen(&mut OsRng);
        let unsigned = draft(&kp);
        let expected = unsigned.hash();

        let a = unsigned.clone().sign(&ctx, &kp, &mut OsRng).unwrap();
        let b = unsigned.sign(&ctx, &kp, &mut OsRng).unwrap();
        assert_ne!(a.signature(), b.signature());
        assert_eq!(a.hash(), expected);
        assert_eq!(b.hash(), expected);
    }

    #[test]
    fn test_kind_byte() {
        assert_eq!(TxKind::from_u8(TxKind::Salary.as_u8()), Some(TxKind::Salary));
        assert_eq!(TxKind::from_u8(7), None);
    }
}
