//! Cinder sigma proofs
//!
//! Non-interactive proof that three Pedersen commitments hide `a`, `b` and
//! `a·b`, without revealing either factor.
//!
//! ```text
//! cmA = a·G + rA·H      cmB = b·G + rB·H      cmC = ab·G + rC·H
//!
//! Prover                                      Verifier
//!   D  = d·G + s·H
//!   E  = e·G + t·H
//!   D' = d·cmB + s1·H
//!   x  = Hash(G, H, D, D', E)
//!   f1, z1, f2, z2, z3   ───────────────▶     x·cmA + D  == f1·G   + z1·H
//!                                             x·cmB + E  == f2·G   + z2·H
//!                                             x·cmC + D' == f1·cmB + z3·H
//! ```

pub mod product;

pub use product::{
    PROOF_LEN, ProductCommitments, ProductProof, ProductWitness, SigmaError, prove, verify,
};
