use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How hard the compressor works. Must be threaded from `compress_data` to
/// `decompress_data` for legacy (untagged) payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Fast,
    #[default]
    Balanced,
    Maximum,
}

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 3] = [Self::Fast, Self::Balanced, Self::Maximum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Maximum => "maximum",
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "maximum" | "max" => Ok(Self::Maximum),
            other => Err(format!(
                "unknown compression level '{other}' (expected fast, balanced, or maximum)"
            )),
        }
    }
}

/// Output of password-based encryption. All three fields are base64 and must
/// be stored together; none of them is secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// AES-256-GCM ciphertext with the 16-byte tag appended
    pub ciphertext: String,
    /// 16-byte PBKDF2 salt
    pub salt: String,
    /// 12-byte GCM nonce
    pub iv: String,
}

/// Output of `compress_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedPayload {
    /// Base64 of the compressed bytes
    pub compressed: String,
    /// UTF-8 byte length of the input
    pub original_size: u64,
    /// Byte length of the compressed bytes (before base64)
    pub compressed_size: u64,
    /// Space saved as a percentage; negative when the input grew
    pub ratio: f64,
}

impl CompressedPayload {
    pub fn ratio_for(original_size: u64, compressed_size: u64) -> f64 {
        if original_size == 0 {
            return 0.0;
        }
        (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0
    }
}

/// Multi-algorithm fingerprint of a serialized value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecksumRecord {
    pub sha256: String,
    /// 32 hex chars. Not MD5: a truncated SHA-1 kept under its historical name.
    pub md5_like: String,
    /// 8 hex chars
    pub crc32: String,
    pub size: u64,
    /// RFC 3339 UTC time of computation
    pub timestamp: String,
}

/// One reason a checksum comparison failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IntegrityIssue {
    Sha256Mismatch,
    Md5LikeMismatch,
    Crc32Mismatch,
    SizeMismatch { expected: u64, actual: u64 },
    Unserializable { reason: String },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256Mismatch => f.write_str("sha256 mismatch"),
            Self::Md5LikeMismatch => f.write_str("md5Like mismatch"),
            Self::Crc32Mismatch => f.write_str("crc32 mismatch"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::Unserializable { reason } => write!(f, "data cannot be serialized: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub errors: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn from_issues(errors: Vec<IntegrityIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    pub total_chunks: usize,
    /// UTF-8 byte length of the unsplit data
    pub total_size: u64,
    /// Maximum characters per chunk used at split time
    pub chunk_size: usize,
    /// Rolling checksum of the unsplit data (8 hex chars)
    pub checksum: String,
}

/// An oversized payload cut into base64 parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSet {
    pub chunks: Vec<String>,
    pub metadata: ChunkMetadata,
}

/// Structural failures when reassembling a `ChunkSet`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("chunk count mismatch: expected {expected}, got {actual}")]
    ChunkCountMismatch { expected: usize, actual: usize },

    #[error("chunk {index} is unreadable: {reason}")]
    InvalidChunk { index: usize, reason: String },

    #[error("checksum mismatch: file corrupted (expected {expected}, got {actual})")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("FAST".parse::<CompressionLevel>().unwrap(), CompressionLevel::Fast);
        assert_eq!("max".parse::<CompressionLevel>().unwrap(), CompressionLevel::Maximum);
        assert!("turbo".parse::<CompressionLevel>().is_err());
    }

    #[test]
    fn ratio_handles_growth_and_empty_input() {
        assert_eq!(CompressedPayload::ratio_for(0, 10), 0.0);
        assert_eq!(CompressedPayload::ratio_for(100, 25), 75.0);
        assert!(CompressedPayload::ratio_for(10, 20) < 0.0);
    }

    #[test]
    fn checksum_record_uses_camel_case_fields() {
        let record = ChecksumRecord {
            sha256: "a".into(),
            md5_like: "b".into(),
            crc32: "c".into(),
            size: 1,
            timestamp: "t".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("md5Like").is_some());
    }

    #[test]
    fn chunk_metadata_round_trips_through_json() {
        let meta = ChunkMetadata {
            total_chunks: 2,
            total_size: 10,
            chunk_size: 5,
            checksum: "0000abcd".into(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"totalChunks\":2"));
        let back: ChunkMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn report_validity_follows_issue_list() {
        assert!(IntegrityReport::from_issues(vec![]).is_valid);
        assert!(!IntegrityReport::from_issues(vec![IntegrityIssue::Crc32Mismatch]).is_valid);
    }
}
