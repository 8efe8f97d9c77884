//! Study report encryption
//!
//! Integrated encryption scheme over Curve25519: a fresh ephemeral key
//! pair is generated per message, key agreement with the recipient's
//! public key yields a shared secret, HKDF-SHA256 (empty salt, empty
//! info) derives a 32-byte AES-256-GCM key, and the sealed box travels
//! behind the 32-byte ephemeral public key. Only the holder of the
//! recipient's private key can recompute the secret and open the box.

mod keys;

pub use keys::{PrivateKey, PublicKey, SharedSecret};

use crate::error::{Error, Result};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey};
use zeroize::Zeroizing;

/// Symmetric key size (AES-256)
pub const KEY_SIZE: usize = 32;

/// Nonce size for AES-GCM
pub const NONCE_SIZE: usize = 12;

/// Length of the ephemeral public key prefixed to every ciphertext
pub const EPHEMERAL_KEY_SIZE: usize = 32;

/// Encrypt a report for a recipient.
///
/// Output layout: ephemeral public key (32 bytes), nonce (12 bytes),
/// ciphertext, authentication tag (16 bytes).
pub fn seal(plaintext: &[u8], recipient: &PublicKey) -> Result<Vec<u8>> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral);

    let shared = SharedSecret(ephemeral.diffie_hellman(&recipient.0).to_bytes());
    let key = derive_key(&shared)?;

    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| Error::Crypto(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    let mut result =
        Vec::with_capacity(EPHEMERAL_KEY_SIZE + NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(ephemeral_public.as_bytes());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt a report with the recipient's private key.
///
/// Fails with [`Error::DataTooShort`] when the input cannot even carry
/// an ephemeral public key, and with [`Error::Crypto`] when the
/// authentication tag does not verify.
pub fn open(data: &[u8], recipient: &PrivateKey) -> Result<Vec<u8>> {
    if data.len() <= EPHEMERAL_KEY_SIZE {
        return Err(Error::DataTooShort(data.len()));
    }

    let mut ephemeral_bytes = [0u8; EPHEMERAL_KEY_SIZE];
    ephemeral_bytes.copy_from_slice(&data[..EPHEMERAL_KEY_SIZE]);
    let ephemeral_public = PublicKey::from_bytes(&ephemeral_bytes);
    let sealed = &data[EPHEMERAL_KEY_SIZE..];

    let shared = recipient.diffie_hellman(&ephemeral_public);
    let key = derive_key(&shared)?;

    if sealed.len() < NONCE_SIZE {
        return Err(Error::DataTooShort(data.len()));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| Error::Crypto(format!("Failed to create cipher: {}", e)))?;

    let nonce = Nonce::from_slice(&sealed[..NONCE_SIZE]);
    cipher
        .decrypt(nonce, &sealed[NONCE_SIZE..])
        .map_err(|e| Error::Crypto(format!("Decryption failed: {}", e)))
}

/// HKDF-SHA256 with empty salt and empty info, per the report format
fn derive_key(shared: &SharedSecret) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    hkdf.expand(&[], &mut *key)
        .map_err(|e| Error::Crypto(format!("Key derivation failed: {}", e)))?;
    Ok(key)
}
