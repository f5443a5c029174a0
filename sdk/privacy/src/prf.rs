//! Pseudorandom functions
//!
//! ```text
//! PRF_tag(key, input) = SHA-256( key[0..31] || (tag << 4 | key[31] & 0x0f) || input )
//! ```
//!
//! Spending keys carry only 252 bits, so the top nibble of the last key byte
//! is free to hold the domain tag. Inputs are fixed width.

use sha2::{Digest, Sha256};

const TAG_PK: u8 = 0x0;
const TAG_RHO: u8 = 0x2;
const TAG_ADDR: u8 = 0xC;
const TAG_NF: u8 = 0xE;

fn prf(tag: u8, key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
    let mut block = *key;
    block[31] = (block[31] & 0x0f) | (tag << 4);

    let mut hasher = Sha256::new();
    hasher.update(block);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Address derivation: `t = 0` gives `a_pk`, `t = 1` the receiving key seed
pub fn prf_addr(a_sk: &[u8; 32], t: u8) -> [u8; 32] {
    let mut input = [0u8; 32];
    input[0] = t;
    prf(TAG_ADDR, a_sk, &[&input])
}

/// Nullifier derivation
pub fn prf_nf(a_sk: &[u8; 32], rho: &[u8; 32]) -> [u8; 32] {
    prf(TAG_NF, a_sk, &[rho])
}

/// Per-input mac binding a spend authority to `h_sig`
pub fn prf_pk(a_sk: &[u8; 32], index: u8, h_sig: &[u8; 32]) -> [u8; 32] {
    prf(TAG_PK, a_sk, &[&[index], h_sig])
}

/// Output nonce derivation from the per-descriptor seed `phi`
pub fn prf_rho(phi: &[u8; 32], index: u8, h_sig: &[u8; 32]) -> [u8; 32] {
    prf(TAG_RHO, phi, &[&[index], h_sig])
}
