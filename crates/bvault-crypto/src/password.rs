//! Random password generation for unattended backups

use bvault_core::{BvaultError, BvaultResult};
use rand::Rng;
use secrecy::SecretString;

/// Upper, lower, digits, and eight symbols: 70 characters.
pub const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// Default generated password length
pub const DEFAULT_PASSWORD_LENGTH: usize = 32;

/// Generate a `length`-character password from [`PASSWORD_ALPHABET`].
///
/// Indices come from `gen_range`, which rejection-samples, so every symbol is
/// equally likely.
pub fn generate_secure_password(length: usize) -> BvaultResult<SecretString> {
    if length == 0 {
        return Err(BvaultError::InvalidInput(
            "password length must be non-zero".into(),
        ));
    }

    let mut rng = rand::thread_rng();
    let password: String = (0..length)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect();

    Ok(SecretString::from(password))
}
