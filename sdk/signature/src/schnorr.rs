//! Two-generator Schnorr
//!
//! ```text
//! keygen:  sk, r ← Z_N          PK = sk·G + r·H
//! sign:    k1, k2 ← Z_N         T  = k1·G + k2·H
//!          e  = SHA-256(T || m)                (256-bit integer)
//!          s1 = k1 − sk·e,  s2 = k2 − r·e      (mod N)
//! verify:  T' = s1·G + s2·H + e·PK;  accept iff SHA-256(T' || m) == e
//! ```
//!
//! Signatures encode as `e (32, big-endian) || s1 (32) || s2 (32)`.

use cinder_curve::{
    CurveContext, POINT_LEN, Point, SCALAR_LEN, Scalar, challenge_scalar, decode_point,
    decode_scalar, encode_point, encode_scalar, mul_unreduced, pedersen, random_scalar,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use sha2::{Digest, Sha256};

use crate::{SignatureError, SignatureScheme};

pub const PUBLIC_KEY_LEN: usize = POINT_LEN;
pub const SECRET_KEY_LEN: usize = 2 * SCALAR_LEN;
pub const SIGNATURE_LEN: usize = 32 + 2 * SCALAR_LEN;

const HASH_LEN: usize = 32;

/// Compressed public key `PK`
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = SignatureError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let key: [u8; PUBLIC_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| SignatureError::InvalidKeyLength {
                    expected: PUBLIC_KEY_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(key))
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "BigArray")] pub [u8; SIGNATURE_LEN]);

impl Signature {
    pub const LEN: usize = SIGNATURE_LEN;

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// The Fiat–Shamir challenge `e`
    pub fn challenge(&self) -> [u8; 32] {
        let mut e = [0u8; 32];
        e.copy_from_slice(&self.0[..32]);
        e
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = SignatureError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let sig: [u8; SIGNATURE_LEN] =
            bytes
                .try_into()
                .map_err(|_| SignatureError::InvalidSignatureLength {
                    expected: SIGNATURE_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(sig))
    }
}

/// Secret pair `(sk, r)` and its public key
#[derive(Clone)]
pub struct SchnorrKeypair {
    sk: Scalar,
    r: Scalar,
    public: PublicKey,
}

impl SchnorrKeypair {
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// `sk || r`, both little-endian scalars
    pub fn secret_bytes(&self) -> [u8; SECRET_KEY_LEN] {
        let mut out = [0u8; SECRET_KEY_LEN];
        out[..SCALAR_LEN].copy_from_slice(&encode_scalar(&self.sk));
        out[SCALAR_LEN..].copy_from_slice(&encode_scalar(&self.r));
        out
    }
}

impl std::fmt::Debug for SchnorrKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchnorrKeypair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Schnorr over `G` and `H = schnorr_h` of a curve context
#[derive(Debug, Clone, Copy)]
pub struct Schnorr<'a> {
    ctx: &'a CurveContext,
}

impl<'a> Schnorr<'a> {
    pub fn new(ctx: &'a CurveContext) -> Self {
        Self { ctx }
    }

    fn public_point(&self, sk: &Scalar, r: &Scalar) -> Point {
        pedersen(&self.ctx.generator(), &self.ctx.schnorr_h(), sk, r)
    }

    /// Rebuild a keypair from [`SchnorrKeypair::secret_bytes`]
    pub fn keypair_from_bytes(&self, bytes: &[u8]) -> Result<SchnorrKeypair, SignatureError> {
        if bytes.len() != SECRET_KEY_LEN {
            return Err(SignatureError::InvalidKeyLength {
                expected: SECRET_KEY_LEN,
                got: bytes.len(),
            });
        }
        let sk =
            decode_scalar(&bytes[..SCALAR_LEN]).map_err(|_| SignatureError::InvalidKeyEncoding)?;
        let r =
            decode_scalar(&bytes[SCALAR_LEN..]).map_err(|_| SignatureError::InvalidKeyEncoding)?;
        let public = PublicKey(encode_point(&self.public_point(&sk, &r)));
        Ok(SchnorrKeypair { sk, r, public })
    }

    /// Verify over raw byte slices; wrong lengths verify as `false`
    pub fn verify_bytes(&self, public_key: &[u8], signature: &[u8], hash: &[u8]) -> bool {
        match (
            PublicKey::try_from(public_key),
            Signature::try_from(signature),
        ) {
            (Ok(pk), Ok(sig)) => self.verify(&pk, &sig, hash),
            _ => false,
        }
    }
}

fn challenge(t: &Point, hash: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(encode_point(t));
    hasher.update(hash);
    hasher.finalize().into()
}

impl SignatureScheme for Schnorr<'_> {
    type Keypair = SchnorrKeypair;
    type PublicKey = PublicKey;
    type Signature = Signature;

    fn keygen<R: RngCore + CryptoRng>(&self, rng: &mut R) -> SchnorrKeypair {
        let sk = random_scalar(rng);
        let r = random_scalar(rng);
        let public = PublicKey(encode_point(&self.public_point(&sk, &r)));
        SchnorrKeypair { sk, r, public }
    }

    fn sign<R: RngCore + CryptoRng>(
        &self,
        keypair: &SchnorrKeypair,
        hash: &[u8],
        rng: &mut R,
    ) -> Result<Signature, SignatureError> {
        if hash.len() != HASH_LEN {
            return Err(SignatureError::InvalidHashLength(hash.len()));
        }

        let k1 = random_scalar(rng);
        let k2 = random_scalar(rng);
        let t = self.public_point(&k1, &k2);

        let e = challenge(&t, hash);
        let e_scalar = challenge_scalar(&e);
        let s1 = k1 - keypair.sk * e_scalar;
        let s2 = k2 - keypair.r * e_scalar;

        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&e);
        out[32..64].copy_from_slice(&encode_scalar(&s1));
        out[64..].copy_from_slice(&encode_scalar(&s2));
        Ok(Signature(out))
    }

    fn verify(&self, public_key: &PublicKey, signature: &Signature, hash: &[u8]) -> bool {
        if hash.len() != HASH_LEN {
            return false;
        }
        let Ok(pk) = decode_point(public_key.as_bytes()) else {
            return false;
        };
        let (Ok(s1), Ok(s2)) = (
            decode_scalar(&signature.0[32..64]),
            decode_scalar(&signature.0[64..]),
        ) else {
            return false;
        };

        let e = signature.challenge();
        let t = self.public_point(&s1, &s2) + mul_unreduced(&pk, &e);
        challenge(&t, hash) == e
    }
}
