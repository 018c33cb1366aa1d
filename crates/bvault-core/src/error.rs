use thiserror::Error;

use crate::types::{IntegrityIssue, MergeError};

pub type BvaultResult<T> = Result<T, BvaultError>;

#[derive(Debug, Error)]
pub enum BvaultError {
    /// A cryptographic primitive failed or is unavailable.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Wrong password, bad tag, or a corrupted field. Carries no detail.
    #[error("decryption failed")]
    DecryptionFailed,

    #[error("compression error: {0}")]
    Compression(String),

    #[error("decompression error: {0}")]
    Decompression(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("integrity check failed: {}", format_issues(.0))]
    Integrity(Vec<IntegrityIssue>),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_issues(issues: &[IntegrityIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_failure_has_no_detail() {
        assert_eq!(BvaultError::DecryptionFailed.to_string(), "decryption failed");
    }

    #[test]
    fn integrity_error_lists_every_issue() {
        let err = BvaultError::Integrity(vec![
            IntegrityIssue::Sha256Mismatch,
            IntegrityIssue::SizeMismatch {
                expected: 10,
                actual: 12,
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("sha256 mismatch"), "{msg}");
        assert!(msg.contains("size mismatch: expected 10, got 12"), "{msg}");
    }
}
