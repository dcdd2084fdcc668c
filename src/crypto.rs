//! AES-256-GCM section encryption, PBKDF2-SHA256 key derivation, and the
//! domain-separated per-segment IV scheme.
//!
//! Encryption operates at segment granularity: one segment holds blocks
//! from every stream interleaved, so `stream_domain_id` is fixed at the
//! constant "segment" domain rather than varying per stream id (see
//! `DESIGN.md`, "stream_domain_id").

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};

use crate::error::{GicsError, Result};

pub const PBKDF2_ITERATIONS: u32 = 100_000;
pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;

/// Domain id used for every segment's IV derivation; there is only one
/// encryption domain in this format (segment-granular, not per-stream).
pub const SEGMENT_DOMAIN_ID: u32 = 0;

/// Generate a fresh random 16-byte file salt.
pub fn random_salt() -> [u8; SALT_LEN] {
    use aes_gcm::aead::rand_core::RngCore;
    let mut salt = [0u8; SALT_LEN];
    aes_gcm::aead::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the 32-byte AES-256 key from `password` and the file's salt.
pub fn derive_key(password: &str, file_salt: &[u8; SALT_LEN]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), file_salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Derive the per-segment IV:
/// `SHA256(fileSalt ‖ u32_LE(stream_domain_id) ‖ u64_LE(segment_index))[..12]`.
pub fn derive_iv(file_salt: &[u8; SALT_LEN], stream_domain_id: u32, segment_index: u64) -> [u8; IV_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(file_salt);
    hasher.update(stream_domain_id.to_le_bytes());
    hasher.update(segment_index.to_le_bytes());
    let digest = hasher.finalize();
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&digest[..IV_LEN]);
    iv
}

/// Encrypt `plaintext` under `key`/`iv`, authenticating `aad` (the segment
/// header fields: stream id, segment index, uncompressed length).
pub fn encrypt(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(iv);
    cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|_| GicsError::other("AES-GCM encryption failed"))
}

/// Decrypt `ciphertext` (GCM tag appended) under `key`/`iv`, verifying
/// `aad`. Any authentication failure is an `IntegrityError`.
pub fn decrypt(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(iv);
    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map_err(|_| GicsError::integrity("AES-GCM authentication failed"))
}
