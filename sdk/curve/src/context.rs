//! Curve context
//!
//! All generators are derived once and then only read. Pass a `&CurveContext`
//! into every operation, or use [`CurveContext::global`] for a process-wide
//! read-only handle.

use std::sync::OnceLock;

use ark_ec::{AffineRepr, PrimeGroup};
use ark_serialize::CanonicalDeserialize;
use ark_std::Zero;

use crate::encoding::encode_point;
use crate::{Point, Scalar};

static GLOBAL_CONTEXT: OnceLock<CurveContext> = OnceLock::new();

const HASH_TO_CURVE_CONTEXT: &str = "cinder 2026-01 hash to curve v1";
const SCHNORR_H_DOMAIN: &[u8] = b"schnorr-h";
const SIGMA_BASE_DOMAIN: &[u8] = b"sigma-base";

/// Immutable generator set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveContext {
    g: Point,
    schnorr_h: Point,
    sigma_g: Point,
    sigma_h: Point,
}

impl CurveContext {
    pub fn new() -> Self {
        let g = Point::generator();
        let schnorr_h = hash_to_point(SCHNORR_H_DOMAIN, &encode_point(&g));
        let sigma_g = hash_to_point(SIGMA_BASE_DOMAIN, &encode_point(&g));
        let sigma_h = hash_to_point(SIGMA_BASE_DOMAIN, &encode_point(&sigma_g));

        Self {
            g,
            schnorr_h,
            sigma_g,
            sigma_h,
        }
    }

    /// Shared read-only context, derived on first use
    pub fn global() -> &'static CurveContext {
        GLOBAL_CONTEXT.get_or_init(Self::new)
    }

    /// Curve base point `G`
    pub fn generator(&self) -> Point {
        self.g
    }

    /// Second signature generator `H`
    pub fn schnorr_h(&self) -> Point {
        self.schnorr_h
    }

    /// Pedersen bases `(G, H)` for the product proof
    pub fn sigma_bases(&self) -> (Point, Point) {
        (self.sigma_g, self.sigma_h)
    }
}

impl Default for CurveContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash arbitrary bytes onto the prime-order subgroup.
///
/// Try-and-increment: `blake3(domain_len || domain || seed || counter)` is read
/// as a compressed point; candidates that do not decompress or clear to the
/// identity are skipped.
pub fn hash_to_point(domain: &[u8], seed: &[u8]) -> Point {
    let mut counter: u32 = 0;
    loop {
        let mut hasher = blake3::Hasher::new_derive_key(HASH_TO_CURVE_CONTEXT);
        hasher.update(&(domain.len() as u32).to_be_bytes());
        hasher.update(domain);
        hasher.update(seed);
        hasher.update(&counter.to_be_bytes());
        let candidate = *hasher.finalize().as_bytes();

        if let Ok(affine) =
            ark_ed_on_bls12_381::EdwardsAffine::deserialize_compressed_unchecked(&candidate[..])
        {
            let cleared = affine.clear_cofactor();
            if !cleared.is_zero() {
                return cleared.into();
            }
        }
        counter = counter.wrapping_add(1);
    }
}

/// `v·g + r·h`
pub fn pedersen(g: &Point, h: &Point, v: &Scalar, r: &Scalar) -> Point {
    *g * v + *h * r
}
