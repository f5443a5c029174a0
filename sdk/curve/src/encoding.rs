//! Point and scalar encodings.
//!
//! Points travel as 32-byte compressed Edwards encodings, scalars as 32-byte
//! little-endian integers below the group order. Decoding checks the length
//! before touching any curve arithmetic.

use ark_ec::{CurveGroup, PrimeGroup};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{UniformRand, Zero};
use rand::{CryptoRng, RngCore};
use thiserror::Error;

use crate::{Point, Scalar};

pub const POINT_LEN: usize = 32;
pub const SCALAR_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("invalid point encoding ({0} bytes)")]
    InvalidPointEncoding(usize),

    #[error("invalid scalar encoding ({0} bytes)")]
    InvalidScalarEncoding(usize),
}

/// Compress a point to its canonical 32-byte form
pub fn encode_point(point: &Point) -> [u8; POINT_LEN] {
    let mut out = [0u8; POINT_LEN];
    // writing a compressed Jubjub point into a 32-byte buffer cannot fail
    let _ = point.into_affine().serialize_compressed(&mut out[..]);
    out
}

/// Decompress a point, rejecting anything off the curve or outside the
/// prime-order subgroup
pub fn decode_point(bytes: &[u8]) -> Result<Point, CurveError> {
    if bytes.len() != POINT_LEN {
        return Err(CurveError::InvalidPointEncoding(bytes.len()));
    }
    let affine = ark_ed_on_bls12_381::EdwardsAffine::deserialize_compressed(bytes)
        .map_err(|_| CurveError::InvalidPointEncoding(bytes.len()))?;
    Ok(affine.into())
}

pub fn encode_scalar(scalar: &Scalar) -> [u8; SCALAR_LEN] {
    let mut out = [0u8; SCALAR_LEN];
    let _ = scalar.serialize_compressed(&mut out[..]);
    out
}

/// Decode a canonical scalar (must be strictly below the group order)
pub fn decode_scalar(bytes: &[u8]) -> Result<Scalar, CurveError> {
    if bytes.len() != SCALAR_LEN {
        return Err(CurveError::InvalidScalarEncoding(bytes.len()));
    }
    Scalar::deserialize_compressed(bytes).map_err(|_| CurveError::InvalidScalarEncoding(bytes.len()))
}

/// Uniform non-zero scalar
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let s = Scalar::rand(rng);
        if !s.is_zero() {
            return s;
        }
    }
}

/// Interpret a 32-byte big-endian challenge as an integer reduced mod `N`
pub fn challenge_scalar(challenge: &[u8; 32]) -> Scalar {
    Scalar::from_be_bytes_mod_order(challenge)
}

/// Multiply `point` by the 256-bit big-endian integer in `challenge` without
/// reducing it modulo the group order first.
pub fn mul_unreduced(point: &Point, challenge: &[u8; 32]) -> Point {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let end = 32 - 8 * i;
        let mut word = [0u8; 8];
        word.copy_from_slice(&challenge[end - 8..end]);
        *limb = u64::from_be_bytes(word);
    }
    point.mul_bigint(limbs)
}
