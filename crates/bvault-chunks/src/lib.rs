//! bvault-chunks: size, integrity, and chunking stages of the backup pipeline
//!
//! # Overview
//! - `compress`: level-driven deflate/gzip/raw-deflate compression with a
//!   run-length fallback when no stream compressor is compiled in
//! - `rle`: the run-length token codec used by that fallback
//! - `integrity`: SHA-256 + md5Like + CRC32 fingerprints of serializable data
//! - `crc32`: table-driven CRC-32 (polynomial 0xEDB88320)
//! - `split`: fixed-size splitting into base64 parts with a rolling checksum

pub mod compress;
pub mod crc32;
pub mod integrity;
pub mod rle;
pub mod split;

// Convenience re-exports for the most common operations
pub use compress::{
    compress_data, compress_with, decompress_data, decompress_with, Capabilities,
    CompressionStrategy, StreamFormat,
};
pub use integrity::{
    calculate_advanced_checksum, checksum_bytes, verify_bytes_integrity, verify_data_integrity,
};
pub use split::{merge_split_file, simple_checksum, split_large_file};
