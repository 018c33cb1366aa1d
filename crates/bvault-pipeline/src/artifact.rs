//! Persisted backup artifact
//!
//! One artifact carries everything needed to reconstruct the backup: the
//! compression level, the salt/iv/iteration count when encrypted, the chunk
//! metadata when split, and the plaintext checksum. Losing any field makes the
//! artifact unrecoverable, so it is always stored as a single JSON document.

use bvault_core::{BvaultError, BvaultResult, ChecksumRecord, ChunkSet, CompressionLevel};
use serde::{Deserialize, Serialize};

/// Current artifact format version
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupArtifact {
    pub version: u32,
    /// Level passed to `compress_data`; needed again to decompress
    pub level: CompressionLevel,
    pub compression: CompressionSummary,
    /// Present when the payload was encrypted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionEnvelope>,
    /// Checksum of the plaintext before any transform
    pub checksum: ChecksumRecord,
    pub payload: ArtifactPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionSummary {
    pub original_size: u64,
    pub compressed_size: u64,
    pub ratio: f64,
}

/// Non-secret inputs to decryption. The ciphertext itself is the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionEnvelope {
    pub salt: String,
    pub iv: String,
    pub kdf_iterations: u32,
}

/// The transformed text, either whole or split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ArtifactPayload {
    Inline { data: String },
    Chunked(ChunkSet),
}

impl ArtifactPayload {
    pub fn chunk_count(&self) -> usize {
        match self {
            Self::Inline { .. } => 1,
            Self::Chunked(set) => set.chunks.len(),
        }
    }
}

impl BackupArtifact {
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    pub fn to_json(&self) -> BvaultResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BvaultError::Serialization(format!("artifact serialization: {e}")))
    }

    pub fn from_json(data: &str) -> BvaultResult<Self> {
        let artifact: Self = serde_json::from_str(data)
            .map_err(|e| BvaultError::Serialization(format!("artifact deserialization: {e}")))?;
        if artifact.version > ARTIFACT_VERSION {
            return Err(BvaultError::Serialization(format!(
                "artifact version {} is newer than supported version {ARTIFACT_VERSION}",
                artifact.version
            )));
        }
        Ok(artifact)
    }
}
