//! Level-driven compression with a run-length fallback
//!
//! Level to format, when the stream compressor is compiled in:
//!   fast -> zlib deflate, balanced -> gzip, maximum -> raw deflate
//! Otherwise every level uses the run-length codec in [`crate::rle`].
//!
//! Framed output (what `compress_data` writes, then base64):
//! ```text
//! [2 bytes: "BV"][1 byte: tag = strategy << 4 | level][N bytes: body]
//! ```
//! The tag makes payloads self-describing. Unframed payloads are the legacy
//! format and are decoded with whatever strategy the caller's level resolves
//! to, exactly as they were written.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bvault_core::{BvaultError, BvaultResult, CompressedPayload, CompressionLevel};

use crate::rle;

const FRAME_MAGIC: &[u8; 2] = b"BV";
const FRAME_HEADER_LEN: usize = 3;

// Tags land in 0x80..=0x9F, which is never a valid UTF-8 lead byte, so a legacy
// run-length payload can't be mistaken for a frame.
const STRATEGY_STREAM: u8 = 0x8;
const STRATEGY_RUN_LENGTH: u8 = 0x9;

/// Container format produced by the stream compressor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// zlib-wrapped deflate
    Deflate,
    Gzip,
    /// deflate with no header or trailer
    DeflateRaw,
}

impl StreamFormat {
    pub fn for_level(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Fast => Self::Deflate,
            CompressionLevel::Balanced => Self::Gzip,
            CompressionLevel::Maximum => Self::DeflateRaw,
        }
    }
}

/// What the host build can do. Probed once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub stream: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        Self {
            stream: cfg!(feature = "stream"),
        }
    }

    /// Same host, but pretend the stream compressor is missing.
    pub fn without_stream(self) -> Self {
        Self { stream: false }
    }
}

/// The concrete codec a call will use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStrategy {
    Stream(StreamFormat),
    RunLength,
}

impl CompressionStrategy {
    pub fn resolve(level: CompressionLevel, caps: Capabilities) -> Self {
        if caps.stream {
            Self::Stream(StreamFormat::for_level(level))
        } else {
            Self::RunLength
        }
    }

    fn tag_bits(&self) -> u8 {
        match self {
            Self::Stream(_) => STRATEGY_STREAM,
            Self::RunLength => STRATEGY_RUN_LENGTH,
        }
    }
}

/// Compress `data` with the strategy `level` resolves to on this host.
pub fn compress_data(data: &str, level: CompressionLevel) -> BvaultResult<CompressedPayload> {
    compress_with(
        data,
        level,
        CompressionStrategy::resolve(level, Capabilities::detect()),
    )
}

/// Compress `data` with an explicitly chosen strategy.
pub fn compress_with(
    data: &str,
    level: CompressionLevel,
    strategy: CompressionStrategy,
) -> BvaultResult<CompressedPayload> {
    let body = encode_body(data, level, strategy)?;

    let mut framed = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    framed.extend_from_slice(FRAME_MAGIC);
    framed.push(frame_tag(strategy, level));
    framed.extend_from_slice(&body);

    let original_size = data.len() as u64;
    let compressed_size = framed.len() as u64;
    let ratio = CompressedPayload::ratio_for(original_size, compressed_size);

    tracing::debug!(
        %level,
        ?strategy,
        original_size,
        compressed_size,
        ratio,
        "payload compressed"
    );

    Ok(CompressedPayload {
        compressed: STANDARD.encode(&framed),
        original_size,
        compressed_size,
        ratio,
    })
}

/// Reverse `compress_data`. `level` must be the one used at compression time;
/// framed payloads carry it, legacy payloads depend on it.
pub fn decompress_data(compressed: &str, level: CompressionLevel) -> BvaultResult<String> {
    decompress_with(compressed, level, Capabilities::detect())
}

pub fn decompress_with(
    compressed: &str,
    level: CompressionLevel,
    caps: Capabilities,
) -> BvaultResult<String> {
    let bytes = STANDARD
        .decode(compressed)
        .map_err(|e| BvaultError::Decompression(format!("base64 decode: {e}")))?;

    if let Some((strategy, framed_level, body)) = parse_frame(&bytes) {
        if framed_level != level {
            tracing::warn!(
                requested = %level,
                recorded = %framed_level,
                "compression level mismatch; using the level recorded in the payload"
            );
        }
        match decode_body(body, strategy) {
            Ok(text) => return Ok(text),
            // A legacy raw-deflate stream can start with the frame magic.
            Err(framed_err) => {
                return decode_body(&bytes, CompressionStrategy::resolve(level, caps))
                    .map_err(|_| framed_err);
            }
        }
    }

    decode_body(&bytes, CompressionStrategy::resolve(level, caps))
}

fn frame_tag(strategy: CompressionStrategy, level: CompressionLevel) -> u8 {
    let level_bits = match level {
        CompressionLevel::Fast => 0,
        CompressionLevel::Balanced => 1,
        CompressionLevel::Maximum => 2,
    };
    strategy.tag_bits() << 4 | level_bits
}

fn parse_frame(bytes: &[u8]) -> Option<(CompressionStrategy, CompressionLevel, &[u8])> {
    if bytes.len() < FRAME_HEADER_LEN || &bytes[..2] != FRAME_MAGIC {
        return None;
    }
    let tag = bytes[2];
    let level = match tag & 0x0F {
        0 => CompressionLevel::Fast,
        1 => CompressionLevel::Balanced,
        2 => CompressionLevel::Maximum,
        _ => return None,
    };
    let strategy = match tag >> 4 {
        STRATEGY_STREAM => CompressionStrategy::Stream(StreamFormat::for_level(level)),
        STRATEGY_RUN_LENGTH => CompressionStrategy::RunLength,
        _ => return None,
    };
    Some((strategy, level, &bytes[FRAME_HEADER_LEN..]))
}

fn encode_body(
    data: &str,
    level: CompressionLevel,
    strategy: CompressionStrategy,
) -> BvaultResult<Vec<u8>> {
    match strategy {
        CompressionStrategy::Stream(format) => stream::compress(data.as_bytes(), format, level),
        CompressionStrategy::RunLength => Ok(rle::encode(data, level).into_bytes()),
    }
}

fn decode_body(body: &[u8], strategy: CompressionStrategy) -> BvaultResult<String> {
    let bytes = match strategy {
        CompressionStrategy::Stream(format) => stream::decompress(body, format)?,
        CompressionStrategy::RunLength => body.to_vec(),
    };
    let text = String::from_utf8(bytes)
        .map_err(|e| BvaultError::Decompression(format!("payload is not UTF-8: {e}")))?;

    match strategy {
        CompressionStrategy::Stream(_) => Ok(text),
        CompressionStrategy::RunLength => rle::decode(&text),
    }
}

#[cfg(feature = "stream")]
mod stream {
    use bvault_core::{BvaultError, BvaultResult, CompressionLevel};
    use flate2::read::{
        DeflateDecoder, DeflateEncoder, GzDecoder, GzEncoder, ZlibDecoder, ZlibEncoder,
    };
    use flate2::Compression;
    use std::io::Read;

    use super::StreamFormat;

    fn effort(level: CompressionLevel) -> Compression {
        match level {
            CompressionLevel::Fast => Compression::fast(),
            CompressionLevel::Balanced => Compression::default(),
            CompressionLevel::Maximum => Compression::best(),
        }
    }

    pub(super) fn compress(
        data: &[u8],
        format: StreamFormat,
        level: CompressionLevel,
    ) -> BvaultResult<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len() / 2 + 64);
        let result = match format {
            StreamFormat::Deflate => ZlibEncoder::new(data, effort(level)).read_to_end(&mut out),
            StreamFormat::Gzip => GzEncoder::new(data, effort(level)).read_to_end(&mut out),
            StreamFormat::DeflateRaw => {
                DeflateEncoder::new(data, effort(level)).read_to_end(&mut out)
            }
        };
        result.map_err(|e| BvaultError::Compression(format!("{format:?}: {e}")))?;
        Ok(out)
    }

    pub(super) fn decompress(data: &[u8], format: StreamFormat) -> BvaultResult<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len() * 2);
        let result = match format {
            StreamFormat::Deflate => ZlibDecoder::new(data).read_to_end(&mut out),
            StreamFormat::Gzip => GzDecoder::new(data).read_to_end(&mut out),
            StreamFormat::DeflateRaw => DeflateDecoder::new(data).read_to_end(&mut out),
        };
        result.map_err(|e| BvaultError::Decompression(format!("{format:?}: {e}")))?;
        Ok(out)
    }
}

#[cfg(not(feature = "stream"))]
mod stream {
    use bvault_core::{BvaultError, BvaultResult, CompressionLevel};

    use super::StreamFormat;

    pub(super) fn compress(
        _data: &[u8],
        format: StreamFormat,
        _level: CompressionLevel,
    ) -> BvaultResult<Vec<u8>> {
        Err(BvaultError::Compression(format!(
            "{format:?}: stream compressor not available in this build"
        )))
    }

    pub(super) fn decompress(_data: &[u8], format: StreamFormat) -> BvaultResult<Vec<u8>> {
        Err(BvaultError::Decompression(format!(
            "{format:?}: stream compressor not available in this build"
        )))
    }
}
