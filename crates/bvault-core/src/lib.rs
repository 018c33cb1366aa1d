//! bvault-core: record shapes shared by every stage of the backup pipeline,
//! the workspace error type, and the `bvault.toml` configuration schema.

pub mod config;
pub mod error;
pub mod types;

pub use error::{BvaultError, BvaultResult};
pub use types::{
    ChecksumRecord, ChunkMetadata, ChunkSet, CompressedPayload, CompressionLevel, EncryptedBlob,
    IntegrityIssue, IntegrityReport, MergeError,
};
