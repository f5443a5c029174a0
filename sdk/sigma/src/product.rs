//! Product proof over Pedersen commitments.
//!
//! The challenge `x` is a 256-bit digest. Commitments are multiplied by it as
//! an unreduced integer; responses are computed with `x mod N`. Both agree on
//! the prime-order subgroup.

use cinder_curve::{
    CurveContext, POINT_LEN, Point, SCALAR_LEN, Scalar, challenge_scalar, decode_point,
    decode_scalar, encode_point, encode_scalar, mul_unreduced, pedersen, random_scalar,
};
use log::debug;
use rand::{CryptoRng, RngCore};
use thiserror::Error;

const CHALLENGE_CONTEXT: &str = "cinder sigma product challenge";

/// 6 points + 5 scalars
pub const PROOF_LEN: usize = 6 * POINT_LEN + 5 * SCALAR_LEN;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigmaError {
    #[error("invalid proof length: expected {expected}, got {got}")]
    InvalidProofLength { expected: usize, got: usize },

    #[error("non-canonical scalar at offset {0}")]
    InvalidScalar(usize),
}

/// Secret opening of the three commitments
#[derive(Clone)]
pub struct ProductWitness {
    pub a: Scalar,
    pub r_a: Scalar,
    pub b: Scalar,
    pub r_b: Scalar,
    pub r_c: Scalar,
}

impl ProductWitness {
    /// Witness for `a`, `b` with fresh blinding factors
    pub fn new<R: RngCore + CryptoRng>(a: Scalar, b: Scalar, rng: &mut R) -> Self {
        Self {
            a,
            r_a: random_scalar(rng),
            b,
            r_b: random_scalar(rng),
            r_c: random_scalar(rng),
        }
    }

    pub fn commitments(&self, ctx: &CurveContext) -> ProductCommitments {
        let (g, h) = ctx.sigma_bases();
        ProductCommitments {
            cm_a: encode_point(&pedersen(&g, &h, &self.a, &self.r_a)),
            cm_b: encode_point(&pedersen(&g, &h, &self.b, &self.r_b)),
            cm_c: encode_point(&pedersen(&g, &h, &(self.a * self.b), &self.r_c)),
        }
    }
}

impl std::fmt::Debug for ProductWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProductWitness(..)")
    }
}

/// Compressed commitments `cmA`, `cmB`, `cmC`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductCommitments {
    pub cm_a: [u8; POINT_LEN],
    pub cm_b: [u8; POINT_LEN],
    pub cm_c: [u8; POINT_LEN],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductProof {
    pub d: [u8; POINT_LEN],
    pub d_prime: [u8; POINT_LEN],
    pub e: [u8; POINT_LEN],
    pub f1: Scalar,
    pub z1: Scalar,
    pub f2: Scalar,
    pub z2: Scalar,
    pub z3: Scalar,
    pub commitments: ProductCommitments,
}

impl ProductProof {
    /// `D || D' || E || f1 || z1 || f2 || z2 || z3 || cmA || cmB || cmC`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PROOF_LEN);
        out.extend_from_slice(&self.d);
        out.extend_from_slice(&self.d_prime);
        out.extend_from_slice(&self.e);
        for s in [&self.f1, &self.z1, &self.f2, &self.z2, &self.z3] {
            out.extend_from_slice(&encode_scalar(s));
        }
        out.extend_from_slice(&self.commitments.cm_a);
        out.extend_from_slice(&self.commitments.cm_b);
        out.extend_from_slice(&self.commitments.cm_c);
        out
    }

    /// Parse the fixed layout. Points stay compressed and are only checked by
    /// [`verify`]; scalars must be canonical.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigmaError> {
        if bytes.len() != PROOF_LEN {
            return Err(SigmaError::InvalidProofLength {
                expected: PROOF_LEN,
                got: bytes.len(),
            });
        }

        let point = |i: usize| -> [u8; POINT_LEN] {
            let mut p = [0u8; POINT_LEN];
            p.copy_from_slice(&bytes[i * POINT_LEN..(i + 1) * POINT_LEN]);
            p
        };
        let scalar = |i: usize| -> Result<Scalar, SigmaError> {
            let offset = 3 * POINT_LEN + i * SCALAR_LEN;
            decode_scalar(&bytes[offset..offset + SCALAR_LEN])
                .map_err(|_| SigmaError::InvalidScalar(offset))
        };

        Ok(Self {
            d: point(0),
            d_prime: point(1),
            e: point(2),
            f1: scalar(0)?,
            z1: scalar(1)?,
            f2: scalar(2)?,
            z2: scalar(3)?,
            z3: scalar(4)?,
            commitments: ProductCommitments {
                cm_a: point(8),
                cm_b: point(9),
                cm_c: point(10),
            },
        })
    }
}

fn challenge(g: &Point, h: &Point, d: &[u8; 32], d_prime: &[u8; 32], e: &[u8; 32]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(CHALLENGE_CONTEXT);
    hasher.update(&encode_point(g));
    hasher.update(&encode_point(h));
    hasher.update(d);
    hasher.update(d_prime);
    hasher.update(e);
    *hasher.finalize().as_bytes()
}

/// Prove that the commitments of `witness` satisfy `c = a·b`
pub fn prove<R: RngCore + CryptoRng>(
    ctx: &CurveContext,
    witness: &ProductWitness,
    rng: &mut R,
) -> ProductProof {
    let (g, h) = ctx.sigma_bases();
    let cm_b = pedersen(&g, &h, &witness.b, &witness.r_b);

    let d = random_scalar(rng);
    let e = random_scalar(rng);
    let s = random_scalar(rng);
    let s1 = random_scalar(rng);
    let t = random_scalar(rng);

    let d_point = encode_point(&pedersen(&g, &h, &d, &s));
    let e_point = encode_point(&pedersen(&g, &h, &e, &t));
    let d_prime = encode_point(&pedersen(&cm_b, &h, &d, &s1));

    let x = challenge_scalar(&challenge(&g, &h, &d_point, &d_prime, &e_point));

    ProductProof {
        d: d_point,
        d_prime,
        e: e_point,
        f1: witness.a * x + d,
        z1: witness.r_a * x + s,
        f2: witness.b * x + e,
        z2: witness.r_b * x + t,
        z3: (witness.r_c - witness.a * witness.r_b) * x + s1,
        commitments: witness.commitments(ctx),
    }
}

/// Check all three relations; any undecodable point rejects
pub fn verify(ctx: &CurveContext, proof: &ProductProof) -> bool {
    let decoded = (|| {
        Some((
            decode_point(&proof.d).ok()?,
            decode_point(&proof.d_prime).ok()?,
            decode_point(&proof.e).ok()?,
            decode_point(&proof.commitments.cm_a).ok()?,
            decode_point(&proof.commitments.cm_b).ok()?,
            decode_point(&proof.commitments.cm_c).ok()?,
        ))
    })();
    let Some((d, d_prime, e, cm_a, cm_b, cm_c)) = decoded else {
        debug!("product proof rejected: undecodable point");
        return false;
    };

    let (g, h) = ctx.sigma_bases();
    let x = challenge(&g, &h, &proof.d, &proof.d_prime, &proof.e);

    let first = mul_unreduced(&cm_a, &x) + d == pedersen(&g, &h, &proof.f1, &proof.z1);
    let second = mul_unreduced(&cm_b, &x) + e == pedersen(&g, &h, &proof.f2, &proof.z2);
    let third = mul_unreduced(&cm_c, &x) + d_prime == pedersen(&cm_b, &h, &proof.f1, &proof.z3);

    if !(first && second && third) {
        debug!(
            "product proof rejected: checks cmA={} cmB={} cmC={}",
            first, second, third
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_proof_length() {
        let ctx = CurveContext::new();
        let w = ProductWitness::new(Scalar::from(3u64), Scalar::from(5u64), &mut OsRng);
        let proof = prove(&ctx, &w, &mut OsRng);
        assert_eq!(proof.to_bytes().len(), PROOF_LEN);
        assert_eq!(PROOF_LEN, 352);
    }

    #[test]
    fn test_from_bytes_rejects_bad_length() {
        assert_eq!(
            ProductProof::from_bytes(&[0u8; 351]),
            Err(SigmaError::InvalidProofLength {
                expected: 352,
                got: 351
            })
        );
    }

    #[test]
    fn test_from_bytes_rejects_noncanonical_scalar() {
        let ctx = CurveContext::new();
        let w = ProductWitness::new(Scalar::from(2u64), Scalar::from(9u64), &mut OsRng);
        let mut bytes = prove(&ctx, &w, &mut OsRng).to_bytes();
        bytes[96..128].copy_from_slice(&[0xff; 32]);
        assert_eq!(
            ProductProof::from_bytes(&bytes),
            Err(SigmaError::InvalidScalar(96))
        );
    }
}
