//! bvault-pipeline: turns a serialized backup into a storable artifact and back
//!
//! Seal order: checksum plaintext -> compress -> encrypt (with a password) ->
//! split (above the chunk threshold). `open` runs the stages in reverse and
//! re-verifies the plaintext checksum recorded at seal time.

pub mod artifact;
pub mod engine;

pub use artifact::{ArtifactPayload, BackupArtifact, CompressionSummary, EncryptionEnvelope};
pub use engine::{open, open_value, seal, seal_value, SealOptions};
