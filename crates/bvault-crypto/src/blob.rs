//! AES-256-GCM encryption of UTF-8 payloads under a password-derived key
//!
//! Every failure on the decrypt path (bad base64, wrong salt/iv length, tag
//! mismatch, non-UTF-8 plaintext) returns `BvaultError::DecryptionFailed` so a
//! wrong password cannot be told apart from a corrupted blob.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bvault_core::{BvaultError, BvaultResult, EncryptedBlob};
use rand::RngCore;
use secrecy::SecretString;

use crate::kdf::{derive_key, KdfParams};
use crate::{IV_SIZE, SALT_SIZE, TAG_SIZE};

/// Encrypt `data` under `password` with the default KDF parameters.
pub fn encrypt(data: &str, password: &SecretString) -> BvaultResult<EncryptedBlob> {
    encrypt_with(data, password, &KdfParams::default())
}

/// Encrypt `data` under `password`, deriving the key with `params`.
///
/// A fresh 16-byte salt and 12-byte iv are drawn for every call.
pub fn encrypt_with(
    data: &str,
    password: &SecretString,
    params: &KdfParams,
) -> BvaultResult<EncryptedBlob> {
    let mut rng = rand::thread_rng();

    let mut salt = [0u8; SALT_SIZE];
    rng.try_fill_bytes(&mut salt)
        .map_err(|e| BvaultError::Crypto(format!("random source failed: {e}")))?;
    let mut iv = [0u8; IV_SIZE];
    rng.try_fill_bytes(&mut iv)
        .map_err(|e| BvaultError::Crypto(format!("random source failed: {e}")))?;

    let key = derive_key(password, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| BvaultError::Crypto(format!("AES-256-GCM init failed: {e}")))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), data.as_bytes())
        .map_err(|e| BvaultError::Crypto(format!("encryption failed: {e}")))?;

    tracing::debug!(
        plaintext_bytes = data.len(),
        ciphertext_bytes = ciphertext.len(),
        iterations = params.iterations,
        "payload encrypted"
    );

    Ok(EncryptedBlob {
        ciphertext: STANDARD.encode(&ciphertext),
        salt: STANDARD.encode(salt),
        iv: STANDARD.encode(iv),
    })
}

/// Decrypt base64 `encrypted` with the default KDF parameters.
pub fn decrypt(
    encrypted: &str,
    password: &SecretString,
    salt: &str,
    iv: &str,
) -> BvaultResult<String> {
    decrypt_with(encrypted, password, salt, iv, &KdfParams::default())
}

/// Decrypt an [`EncryptedBlob`] with the default KDF parameters.
pub fn decrypt_blob(blob: &EncryptedBlob, password: &SecretString) -> BvaultResult<String> {
    decrypt(&blob.ciphertext, password, &blob.salt, &blob.iv)
}

/// Decrypt base64 `encrypted`, re-deriving the key from `password` and `salt`
/// with `params` (which must match the ones used to encrypt).
pub fn decrypt_with(
    encrypted: &str,
    password: &SecretString,
    salt: &str,
    iv: &str,
    params: &KdfParams,
) -> BvaultResult<String> {
    // The iteration count may come from a stored artifact.
    if !params.is_supported() {
        return Err(BvaultError::DecryptionFailed);
    }
    let ciphertext = decode_field(encrypted)?;
    if ciphertext.len() < TAG_SIZE {
        return Err(BvaultError::DecryptionFailed);
    }
    let salt: [u8; SALT_SIZE] = decode_field(salt)?
        .try_into()
        .map_err(|_| BvaultError::DecryptionFailed)?;
    let iv: [u8; IV_SIZE] = decode_field(iv)?
        .try_into()
        .map_err(|_| BvaultError::DecryptionFailed)?;

    let key = derive_key(password, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| BvaultError::Crypto(format!("AES-256-GCM init failed: {e}")))?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
        .map_err(|_| BvaultError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|_| BvaultError::DecryptionFailed)
}

fn decode_field(field: &str) -> BvaultResult<Vec<u8>> {
    STANDARD
        .decode(field)
        .map_err(|_| BvaultError::DecryptionFailed)
}
