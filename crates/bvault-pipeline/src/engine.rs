//! Seal and open backup artifacts
//!
//! `seal`: checksum -> compress -> encrypt (optional) -> split (optional)
//! `open`: merge -> decrypt -> decompress -> verify checksum
//!
//! Every stage is a pure call into bvault-chunks / bvault-crypto, so sealing
//! many backups concurrently needs no coordination.

use bvault_chunks::{
    checksum_bytes, compress_with, decompress_with, merge_split_file, split_large_file,
    verify_bytes_integrity, Capabilities, CompressionStrategy,
};
use bvault_core::config::{BvaultConfig, DEFAULT_MAX_CHUNK_SIZE};
use bvault_core::{BvaultError, BvaultResult, CompressionLevel};
use bvault_crypto::{decrypt_with, encrypt_with, KdfParams};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::artifact::{
    ArtifactPayload, BackupArtifact, CompressionSummary, EncryptionEnvelope, ARTIFACT_VERSION,
};

/// Knobs for `seal`.
#[derive(Debug, Clone)]
pub struct SealOptions {
    pub level: CompressionLevel,
    /// Use the run-length fallback even when the stream compressor is present
    pub force_fallback: bool,
    /// Encrypt when set
    pub password: Option<SecretString>,
    pub kdf: KdfParams,
    /// Split once the stored text exceeds this many characters
    pub max_chunk_size: usize,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            level: CompressionLevel::default(),
            force_fallback: false,
            password: None,
            kdf: KdfParams::default(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

impl SealOptions {
    pub fn from_config(config: &BvaultConfig) -> Self {
        Self {
            level: config.compression.level,
            force_fallback: config.compression.force_fallback,
            password: None,
            kdf: KdfParams {
                iterations: config.crypto.pbkdf2_iterations,
            },
            max_chunk_size: config.split.max_chunk_size,
        }
    }

    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    fn capabilities(&self) -> Capabilities {
        let caps = Capabilities::detect();
        if self.force_fallback {
            caps.without_stream()
        } else {
            caps
        }
    }
}

/// Seal an already-serialized backup.
pub fn seal(data: &str, options: &SealOptions) -> BvaultResult<BackupArtifact> {
    let checksum = checksum_bytes(data.as_bytes());

    let strategy = CompressionStrategy::resolve(options.level, options.capabilities());
    let compressed = compress_with(data, options.level, strategy)?;
    let compression = CompressionSummary {
        original_size: compressed.original_size,
        compressed_size: compressed.compressed_size,
        ratio: compressed.ratio,
    };

    let (stored, encryption) = match &options.password {
        Some(password) => {
            let blob = encrypt_with(&compressed.compressed, password, &options.kdf)?;
            let envelope = EncryptionEnvelope {
                salt: blob.salt,
                iv: blob.iv,
                kdf_iterations: options.kdf.iterations,
            };
            (blob.ciphertext, Some(envelope))
        }
        None => (compressed.compressed, None),
    };

    // base64 text is ASCII, so bytes == characters here
    let payload = if stored.len() > options.max_chunk_size {
        ArtifactPayload::Chunked(split_large_file(&stored, options.max_chunk_size)?)
    } else {
        ArtifactPayload::Inline { data: stored }
    };

    info!(
        original_size = compression.original_size,
        compressed_size = compression.compressed_size,
        encrypted = encryption.is_some(),
        chunks = payload.chunk_count(),
        "backup sealed"
    );

    Ok(BackupArtifact {
        version: ARTIFACT_VERSION,
        level: options.level,
        compression,
        encryption,
        checksum,
        payload,
    })
}

/// Serialize `value` to JSON and seal it.
pub fn seal_value<T: Serialize + ?Sized>(
    value: &T,
    options: &SealOptions,
) -> BvaultResult<BackupArtifact> {
    let data = serde_json::to_string(value)
        .map_err(|e| BvaultError::Serialization(format!("backup serialization: {e}")))?;
    seal(&data, options)
}

/// Reverse `seal`, failing unless the recovered plaintext matches the
/// checksum recorded at seal time.
pub fn open(artifact: &BackupArtifact, password: Option<&SecretString>) -> BvaultResult<String> {
    let stored = match &artifact.payload {
        ArtifactPayload::Inline { data } => data.clone(),
        ArtifactPayload::Chunked(set) => merge_split_file(&set.chunks, &set.metadata)?,
    };
    debug!(chars = stored.len(), "payload reassembled");

    let compressed = match (&artifact.encryption, password) {
        (Some(envelope), Some(password)) => decrypt_with(
            &stored,
            password,
            &envelope.salt,
            &envelope.iv,
            &KdfParams {
                iterations: envelope.kdf_iterations,
            },
        )?,
        (Some(_), None) => {
            return Err(BvaultError::InvalidInput(
                "artifact is encrypted; a password is required".into(),
            ))
        }
        (None, supplied) => {
            if supplied.is_some() {
                warn!("artifact is not encrypted; ignoring the supplied password");
            }
            stored
        }
    };

    let data = decompress_with(&compressed, artifact.level, Capabilities::detect())?;

    let report = verify_bytes_integrity(data.as_bytes(), &artifact.checksum);
    if !report.is_valid {
        return Err(BvaultError::Integrity(report.errors));
    }

    info!(size = data.len(), "backup opened");
    Ok(data)
}

/// Open an artifact sealed with [`seal_value`] and deserialize it.
pub fn open_value<T: DeserializeOwned>(
    artifact: &BackupArtifact,
    password: Option<&SecretString>,
) -> BvaultResult<T> {
    let data = open(artifact, password)?;
    serde_json::from_str(&data)
        .map_err(|e| BvaultError::Serialization(format!("backup deserialization: {e}")))
}
