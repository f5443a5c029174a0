//! Note Encryption
//!
//! Encrypts output-note payloads to the recipient's transmission key using
//! X25519 + ChaCha20-Poly1305.
//!
//! ```text
//! Flow (one ephemeral key per descriptor, shared by its output slots):
//! 1. Sender generates ephemeral keypair (esk, epk)
//! 2. Shared secret = X25519(esk, pk_enc)
//! 3. Key_i = BLAKE3-derive("cinder note encryption v1",
//!                          shared || epk || pk_enc || hSig || i)
//! 4. Ciphertext_i = ChaCha20-Poly1305(Key_i, nonce = 0, value || rho || r)
//! ```
//!
//! Each key is used for exactly one message, so the all-zero nonce is safe.

use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use rand::{CryptoRng, RngCore};
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::commitment::Commitment;
use crate::keys::{TransmissionKey, ViewingKey};
use crate::note::Note;

const KDF_CONTEXT: &str = "cinder note encryption v1";

/// value (8) + rho (32) + r (32)
pub const NOTE_PLAINTEXT_LEN: usize = 8 + 32 + 32;
/// Plaintext plus the Poly1305 tag
pub const NOTE_CIPHERTEXT_LEN: usize = NOTE_PLAINTEXT_LEN + 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("note encryption failed")]
    Encrypt,
    #[error("note decryption failed")]
    Decrypt,
    #[error("invalid plaintext length: {0}")]
    InvalidPlaintext(usize),
}

/// Per-descriptor ephemeral X25519 keypair
pub struct EphemeralKey {
    secret: StaticSecret,
    public: PublicKey,
}

impl EphemeralKey {
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let secret = StaticSecret::random_from_rng(rng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }
}

fn derive_note_key(
    shared_secret: &[u8; 32],
    ephemeral_pk: &[u8; 32],
    pk_enc: &[u8; 32],
    h_sig: &[u8; 32],
    index: u8,
) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT);
    hasher.update(shared_secret);
    hasher.update(ephemeral_pk);
    hasher.update(pk_enc);
    hasher.update(h_sig);
    hasher.update(&[index]);
    *hasher.finalize().as_bytes()
}

fn cipher(key: &[u8; 32]) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(Key::from_slice(key))
}

/// Encrypt output slot `index` of a descriptor for `recipient`
pub fn encrypt_note(
    note: &Note,
    recipient: &TransmissionKey,
    ephemeral: &EphemeralKey,
    h_sig: &[u8; 32],
    index: u8,
) -> Result<Vec<u8>, EncryptionError> {
    let shared = ephemeral
        .secret
        .diffie_hellman(&PublicKey::from(recipient.0));
    let key = derive_note_key(
        shared.as_bytes(),
        ephemeral.public.as_bytes(),
        recipient.as_bytes(),
        h_sig,
        index,
    );

    let mut plaintext = Vec::with_capacity(NOTE_PLAINTEXT_LEN);
    plaintext.extend_from_slice(&note.value().as_u64().to_be_bytes());
    plaintext.extend_from_slice(note.rho());
    plaintext.extend_from_slice(note.r());

    cipher(&key)
        .encrypt(Nonce::from_slice(&[0u8; 12]), plaintext.as_slice())
        .map_err(|_| EncryptionError::Encrypt)
}

/// Decrypt output slot `index` with the recipient's viewing key
pub fn decrypt_note(
    ciphertext: &[u8],
    ephemeral_pk: &[u8; 32],
    viewing_key: &ViewingKey,
    h_sig: &[u8; 32],
    index: u8,
) -> Result<Note, EncryptionError> {
    let secret = viewing_key.sk_enc.static_secret();
    let pk_enc = viewing_key.sk_enc.transmission_key();
    let shared = secret.diffie_hellman(&PublicKey::from(*ephemeral_pk));
    let key = derive_note_key(shared.as_bytes(), ephemeral_pk, pk_enc.as_bytes(), h_sig, index);

    let plaintext = cipher(&key)
        .decrypt(Nonce::from_slice(&[0u8; 12]), ciphertext)
        .map_err(|_| EncryptionError::Decrypt)?;
    if plaintext.len() != NOTE_PLAINTEXT_LEN {
        return Err(EncryptionError::InvalidPlaintext(plaintext.len()));
    }

    let mut value = [0u8; 8];
    let mut rho = [0u8; 32];
    let mut r = [0u8; 32];
    value.copy_from_slice(&plaintext[..8]);
    rho.copy_from_slice(&plaintext[8..40]);
    r.copy_from_slice(&plaintext[40..]);

    Ok(Note::new(u64::from_be_bytes(value), viewing_key.apk, rho, r))
}

/// Scan mode: decrypt and keep the note only if it opens `expected`
pub fn try_decrypt_note(
    ciphertext: &[u8],
    ephemeral_pk: &[u8; 32],
    viewing_key: &ViewingKey,
    h_sig: &[u8; 32],
    index: u8,
    expected: &Commitment,
) -> Option<Note> {
    let note = decrypt_note(ciphertext, ephemeral_pk, viewing_key, h_sig, index).ok()?;
    (note.commitment() == *expected).then_some(note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SpendingKey;
    use rand::rngs::OsRng;

    #[test]
    fn test_encrypt_decrypt() {
        let recipient = SpendingKey::random(&mut OsRng);
        let address = recipient.payment_address();
        let note = Note::random(1000, address.apk, &mut OsRng);
        let h_sig = [7u8; 32];

        let epk = EphemeralKey::random(&mut OsRng);
        let ct = encrypt_note(&note, &address.pk_enc, &epk, &h_sig, 0).unwrap();
        assert_eq!(ct.len(), NOTE_CIPHERTEXT_LEN);

        let decrypted =
            decrypt_note(&ct, &epk.public_bytes(), &recipient.viewing_key(), &h_sig, 0).unwrap();
        assert_eq!(decrypted, note);
    }

    #[test]
    fn test_wrong_key_fails() {
        let recipient = SpendingKey::random(&mut OsRng);
        let other = SpendingKey::random(&mut OsRng);
        let address = recipient.payment_address();
        let note = Note::random(1000, address.apk, &mut OsRng);
        let h_sig = [7u8; 32];

        let epk = EphemeralKey::random(&mut OsRng);
        let ct = encrypt_note(&note, &address.pk_enc, &epk, &h_sig, 1).unwrap();

        let result = decrypt_note(&ct, &epk.public_bytes(), &other.viewing_key(), &h_sig, 1);
        assert_eq!(result, Err(EncryptionError::Decrypt));
    }

    #[test]
    fn test_slot_index_bound() {
        let recipient = SpendingKey::random(&mut OsRng);
        let address = recipient.payment_address();
        let note = Note::random(42, address.apk, &mut OsRng);
        let h_sig = [1u8; 32];

        let epk = EphemeralKey::random(&mut OsRng);
        let ct = encrypt_note(&note, &address.pk_enc, &epk, &h_sig, 0).unwrap();

        let vk = recipient.viewing_key();
        assert!(decrypt_note(&ct, &epk.public_bytes(), &vk, &h_sig, 1).is_err());
        assert!(decrypt_note(&ct, &epk.public_bytes(), &vk, &[2u8; 32], 0).is_err());
    }

    #[test]
    fn test_try_decrypt_checks_commitment() {
        let recipient = SpendingKey::random(&mut OsRng);
        let address = recipient.payment_address();
        let note = Note::random(500, address.apk, &mut OsRng);
        let h_sig = [3u8; 32];

        let epk = EphemeralKey::random(&mut OsRng);
        let ct = encrypt_note(&note, &address.pk_enc, &epk, &h_sig, 0).unwrap();
        let vk = recipient.viewing_key();

        let found = try_decrypt_note(&ct, &epk.public_bytes(), &vk, &h_sig, 0, &note.commitment());
        assert_eq!(found, Some(note));

        let miss = try_decrypt_note(
            &ct,
            &epk.public_bytes(),
            &vk,
            &h_sig,
            0,
            &Commitment([0u8; 32]),
        );
        assert!(miss.is_none());
    }
}
