//! Key derivation: PBKDF2-HMAC-SHA256 password -> 256-bit AES key

use bvault_core::config::{DEFAULT_PBKDF2_ITERATIONS, MAX_PBKDF2_ITERATIONS};
use bvault_core::{BvaultError, BvaultResult};
use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{KEY_SIZE, SALT_SIZE};

/// A 256-bit key derived from a password. Wiped when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DerivedKey").field(&format_args!("..")).finish()
    }
}

/// PBKDF2 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// HMAC-SHA256 iterations (default: 100000)
    pub iterations: u32,
}

impl KdfParams {
    /// Iteration count is within `1..=MAX_PBKDF2_ITERATIONS`.
    pub fn is_supported(&self) -> bool {
        (1..=MAX_PBKDF2_ITERATIONS).contains(&self.iterations)
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

/// Derive a 256-bit key from a password and salt using PBKDF2-HMAC-SHA256.
///
/// Deterministic for a given (password, salt, iterations); the salt is stored
/// next to the ciphertext and does not need to be secret.
pub fn derive_key(
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> BvaultResult<DerivedKey> {
    if !params.is_supported() {
        return Err(BvaultError::Crypto(format!(
            "PBKDF2 iterations must be in 1..={MAX_PBKDF2_ITERATIONS}, got {}",
            params.iterations
        )));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        password.expose_secret().as_bytes(),
        salt,
        params.iterations,
        &mut key,
    );
    Ok(DerivedKey(key))
}
