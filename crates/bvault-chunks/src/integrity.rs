//! Multi-algorithm checksums over the canonical form of structured data
//!
//! The canonical form is compact JSON with object keys sorted (`serde_json`
//! maps are ordered). Three digests are taken over the same bytes:
//! - `sha256`: full SHA-256, 64 hex chars
//! - `md5Like`: SHA-1 truncated to 32 hex chars. Named for compatibility with
//!   stored records; it is not MD5 and does not match real MD5 output.
//! - `crc32`: see [`crate::crc32`]

use bvault_core::{BvaultError, BvaultResult, ChecksumRecord, IntegrityIssue, IntegrityReport};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::crc32::crc32_hex;

/// Length of the truncated `md5Like` digest in hex characters
pub const MD5_LIKE_HEX_LEN: usize = 32;

/// Serialize `data` to its canonical byte form.
pub fn canonical_bytes<T: Serialize + ?Sized>(data: &T) -> BvaultResult<Vec<u8>> {
    let value = serde_json::to_value(data)
        .map_err(|e| BvaultError::Serialization(format!("canonical form: {e}")))?;
    serde_json::to_vec(&value)
        .map_err(|e| BvaultError::Serialization(format!("canonical form: {e}")))
}

/// Checksum any serializable value.
pub fn calculate_advanced_checksum<T: Serialize + ?Sized>(data: &T) -> BvaultResult<ChecksumRecord> {
    let bytes = canonical_bytes(data)?;
    Ok(checksum_bytes(&bytes))
}

/// Checksum raw bytes that are already in their stored form.
pub fn checksum_bytes(bytes: &[u8]) -> ChecksumRecord {
    let sha256 = hex::encode(Sha256::digest(bytes));
    let mut md5_like = hex::encode(Sha1::digest(bytes));
    md5_like.truncate(MD5_LIKE_HEX_LEN);

    ChecksumRecord {
        sha256,
        md5_like,
        crc32: crc32_hex(bytes),
        size: bytes.len() as u64,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Recompute the checksum of `data` and compare each field with `expected`.
///
/// Mismatches are returned in the report, never as errors. Data that cannot
/// be serialized yields a single `Unserializable` issue.
pub fn verify_data_integrity<T: Serialize + ?Sized>(
    data: &T,
    expected: &ChecksumRecord,
) -> IntegrityReport {
    match canonical_bytes(data) {
        Ok(bytes) => verify_bytes_integrity(&bytes, expected),
        Err(e) => {
            tracing::warn!(error = %e, "integrity check on unserializable data");
            IntegrityReport::from_issues(vec![IntegrityIssue::Unserializable {
                reason: e.to_string(),
            }])
        }
    }
}

/// Byte-level counterpart of [`verify_data_integrity`].
pub fn verify_bytes_integrity(bytes: &[u8], expected: &ChecksumRecord) -> IntegrityReport {
    let actual = checksum_bytes(bytes);
    let mut issues = Vec::new();

    if !actual.sha256.eq_ignore_ascii_case(&expected.sha256) {
        issues.push(IntegrityIssue::Sha256Mismatch);
    }
    if !actual.md5_like.eq_ignore_ascii_case(&expected.md5_like) {
        issues.push(IntegrityIssue::Md5LikeMismatch);
    }
    if !actual.crc32.eq_ignore_ascii_case(&expected.crc32) {
        issues.push(IntegrityIssue::Crc32Mismatch);
    }
    if actual.size != expected.size {
        issues.push(IntegrityIssue::SizeMismatch {
            expected: expected.size,
            actual: actual.size,
        });
    }

    if !issues.is_empty() {
        tracing::warn!(
            issues = issues.len(),
            expected_size = expected.size,
            actual_size = actual.size,
            "integrity mismatch"
        );
    }

    IntegrityReport::from_issues(issues)
}
