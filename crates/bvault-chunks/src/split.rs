//! Fixed-size splitting of oversized payloads
//!
//! The payload is cut into contiguous slices of at most `max_chunk_size`
//! characters. Each slice is base64-encoded on its own, so any chunk decodes
//! without its neighbours. A cheap rolling checksum over the whole payload is
//! stored in the metadata; it catches truncation, reordering, and accidental
//! corruption. Tamper resistance is the job of encryption and `integrity`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bvault_core::{BvaultError, BvaultResult, ChunkMetadata, ChunkSet, MergeError};

pub use bvault_core::config::DEFAULT_MAX_CHUNK_SIZE;

/// Split `data` into base64 chunks of at most `max_chunk_size` characters.
///
/// Empty input yields zero chunks.
pub fn split_large_file(data: &str, max_chunk_size: usize) -> BvaultResult<ChunkSet> {
    if max_chunk_size == 0 {
        return Err(BvaultError::InvalidInput(
            "max_chunk_size must be at least 1".into(),
        ));
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chars_in_chunk = 0;
    for (offset, _) in data.char_indices() {
        if chars_in_chunk == max_chunk_size {
            chunks.push(STANDARD.encode(&data[start..offset]));
            start = offset;
            chars_in_chunk = 0;
        }
        chars_in_chunk += 1;
    }
    if chars_in_chunk > 0 {
        chunks.push(STANDARD.encode(&data[start..]));
    }

    let metadata = ChunkMetadata {
        total_chunks: chunks.len(),
        total_size: data.len() as u64,
        chunk_size: max_chunk_size,
        checksum: simple_checksum(data),
    };

    tracing::debug!(
        total_chunks = metadata.total_chunks,
        total_size = metadata.total_size,
        chunk_size = max_chunk_size,
        "payload split"
    );

    Ok(ChunkSet { chunks, metadata })
}

/// Reassemble chunks produced by [`split_large_file`].
///
/// The count check runs before any chunk is decoded.
pub fn merge_split_file(chunks: &[String], metadata: &ChunkMetadata) -> Result<String, MergeError> {
    if chunks.len() != metadata.total_chunks {
        return Err(MergeError::ChunkCountMismatch {
            expected: metadata.total_chunks,
            actual: chunks.len(),
        });
    }

    // Sized from the chunks themselves; `total_size` is untrusted until checked.
    let capacity = chunks.iter().map(|chunk| chunk.len() / 4 * 3).sum();
    let mut merged = String::with_capacity(capacity);
    for (index, chunk) in chunks.iter().enumerate() {
        let bytes = STANDARD
            .decode(chunk)
            .map_err(|e| MergeError::InvalidChunk {
                index,
                reason: format!("base64 decode: {e}"),
            })?;
        let text = std::str::from_utf8(&bytes).map_err(|e| MergeError::InvalidChunk {
            index,
            reason: format!("not UTF-8: {e}"),
        })?;
        merged.push_str(text);
    }

    let actual = simple_checksum(&merged);
    if !actual.eq_ignore_ascii_case(&metadata.checksum) {
        tracing::warn!(
            expected = %metadata.checksum,
            actual = %actual,
            "merged payload checksum mismatch"
        );
        return Err(MergeError::ChecksumMismatch {
            expected: metadata.checksum.clone(),
            actual,
        });
    }

    if merged.len() as u64 != metadata.total_size {
        return Err(MergeError::SizeMismatch {
            expected: metadata.total_size,
            actual: merged.len() as u64,
        });
    }

    Ok(merged)
}

/// Rolling `hash = hash * 31 + unit` over UTF-16 code units with 32-bit
/// wraparound, as 8 lowercase hex digits of the bit pattern.
pub fn simple_checksum(data: &str) -> String {
    let hash = data.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    format!("{:08x}", hash as u32)
}
