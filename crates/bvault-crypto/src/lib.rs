//! bvault-crypto: password-based authenticated encryption for backup payloads
//!
//! Scheme:
//! ```text
//! key        = PBKDF2-HMAC-SHA256(password, salt[16], 100_000 iterations) -> 256 bits
//! ciphertext = AES-256-GCM(key, iv[12], utf8(data))  (16-byte tag appended)
//! blob       = { ciphertext, salt, iv }  each base64
//! ```
//!
//! Salt and iv are fresh per call; the blob is only decryptable with the exact
//! password, salt, and iv used to produce it.

pub mod blob;
pub mod kdf;
pub mod password;

pub use blob::{decrypt, decrypt_blob, decrypt_with, encrypt, encrypt_with};
pub use kdf::{derive_key, DerivedKey, KdfParams};
pub use password::{generate_secure_password, PASSWORD_ALPHABET};

/// AES-256 key size in bytes
pub const KEY_SIZE: usize = 32;

/// PBKDF2 salt size in bytes
pub const SALT_SIZE: usize = 16;

/// AES-GCM nonce size (96-bit)
pub const IV_SIZE: usize = 12;

/// GCM authentication tag size
pub const TAG_SIZE: usize = 16;
