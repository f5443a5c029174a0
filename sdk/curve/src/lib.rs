//! Cinder Curve
//!
//! Group parameters shared by the signature scheme and the sigma proofs.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       CurveContext                           │
//! │                                                              │
//! │   G ──hash("schnorr-h")──▶ H_schnorr     (signatures)        │
//! │   G ──hash("sigma-base")─▶ G_sigma                           │
//! │          G_sigma ──hash("sigma-base")──▶ H_sigma  (proofs)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The group is the prime-order subgroup of Jubjub. Every derived generator
//! comes out of try-and-increment hashing, so nobody knows a discrete-log
//! relation between any two of them.

pub mod context;
pub mod encoding;

pub use context::{CurveContext, hash_to_point, pedersen};
pub use encoding::{
    CurveError, POINT_LEN, SCALAR_LEN, challenge_scalar, decode_point, decode_scalar,
    encode_point, encode_scalar, mul_unreduced, random_scalar,
};

/// Group element (projective form, immutable value type)
pub type Point = ark_ed_on_bls12_381::EdwardsProjective;

/// Scalar field element (integers mod the group order `N`)
pub type Scalar = ark_ed_on_bls12_381::Fr;
