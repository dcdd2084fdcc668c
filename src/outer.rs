//! The outer (segment-level) codec: `NONE` or `ZSTD`, applied after block
//! assembly and before encryption.

use crate::config::OuterCodec;
use crate::error::{GicsError, Result};

/// Compress `payload` with `codec`.
pub fn compress(codec: OuterCodec, payload: &[u8], level: i32) -> Result<Vec<u8>> {
    match codec {
        OuterCodec::None => Ok(payload.to_vec()),
        OuterCodec::Zstd => zstd::encode_all(payload, level)
            .map_err(|e| GicsError::other(format!("zstd compression failed: {e}"))),
    }
}

/// Decompress `payload`, which is declared to expand to `uncompressed_len`
/// bytes. Guards against decompression bombs: if the declared length
/// exceeds `16 * compressed_len + 1 MiB`, refuses to decompress at all.
pub fn decompress(
    codec: OuterCodec,
    payload: &[u8],
    uncompressed_len: u64,
) -> Result<Vec<u8>> {
    let bound = 16u64
        .saturating_mul(payload.len() as u64)
        .saturating_add(1024 * 1024);
    if uncompressed_len > bound {
        return Err(GicsError::limit(format!(
            "declared uncompressed length {uncompressed_len} exceeds decompression-bomb bound {bound}"
        )));
    }

    match codec {
        OuterCodec::None => {
            if payload.len() as u64 != uncompressed_len {
                return Err(GicsError::incomplete(
                    "NONE outer codec payload length does not match declared uncompressed length",
                ));
            }
            Ok(payload.to_vec())
        }
        OuterCodec::Zstd => {
            let mut out = Vec::with_capacity(uncompressed_len as usize);
            let mut decoder = zstd::stream::read::Decoder::new(payload)
                .map_err(|e| GicsError::other(format!("zstd decoder init failed: {e}")))?;
            std::io::copy(&mut decoder, &mut out)
                .map_err(|e| GicsError::other(format!("zstd decompression failed: {e}")))?;
            if out.len() as u64 != uncompressed_len {
                return Err(GicsError::incomplete(
                    "zstd output length does not match declared uncompressed length",
                ));
            }
            Ok(out)
        }
    }
}
