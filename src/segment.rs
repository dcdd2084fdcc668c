//! Segment framing: outer compression, optional AES-GCM encryption, CRC32,
//! and the hash-chain update all operate on one segment's bytes as a unit.
//!
//! On-wire layout: `[u32 uncompressed_len][u32 compressed_len][body][u32
//! crc32]`, where `body` is the outer-compressed, optionally encrypted
//! payload. CRC32 covers exactly `body`; the hash chain covers the whole
//! record — both length prefixes, `body`, and the stored CRC32 — so a bit
//! flip anywhere in the record, including the length prefixes CRC32 itself
//! doesn't protect, still changes the chained hash.

use crate::config::OuterCodec;
use crate::crypto;
use crate::error::{GicsError, Result};
use crate::integrity;

/// EOS marker tag byte.
pub const EOS_TAG: u8 = 0xFF;
/// Total EOS record size: tag byte + u32 segment count + 32-byte chain root.
pub const EOS_LEN: usize = 1 + 4 + 32;

/// Key material needed to encrypt or decrypt one segment.
pub struct SegmentCrypto<'a> {
    pub key: &'a [u8; crypto::KEY_LEN],
    pub file_salt: &'a [u8; crypto::SALT_LEN],
}

/// Seal `plaintext` (one segment's concatenated block bytes) into its
/// on-wire form.
pub fn write_segment(
    plaintext: &[u8],
    segment_index: u64,
    outer_codec: OuterCodec,
    compression_level: i32,
    crypto_ctx: Option<SegmentCrypto>,
) -> Result<Vec<u8>> {
    let compressed = crate::outer::compress(outer_codec, plaintext, compression_level)?;
    let uncompressed_len = plaintext.len() as u32;

    let body = match crypto_ctx {
        Some(ctx) => {
            let iv = crypto::derive_iv(ctx.file_salt, crypto::SEGMENT_DOMAIN_ID, segment_index);
            let aad = build_aad(segment_index, uncompressed_len as u64);
            crypto::encrypt(ctx.key, &iv, &aad, &compressed)?
        }
        None => compressed,
    };

    let mut out = Vec::with_capacity(8 + body.len() + 4);
    out.extend_from_slice(&uncompressed_len.to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out.extend_from_slice(&integrity::crc32(&body).to_le_bytes());
    Ok(out)
}

/// One parsed-and-verified segment.
pub struct ReadSegment {
    /// Decompressed, decrypted block bytes.
    pub plaintext: Vec<u8>,
    /// The full on-wire segment record (length prefixes ‖ body ‖ CRC32) —
    /// needed by the caller to fold this segment into its running
    /// [`integrity::HashChain`]. Deliberately wider than what CRC32 checks:
    /// see the module docs.
    pub chained_bytes: Vec<u8>,
    /// Bytes consumed from the input buffer.
    pub consumed: usize,
}

/// Parse one segment's frame and CRC-check its body, without decrypting or
/// decompressing anything. This is all [`crate::decoder::Decoder::verify`]
/// needs to CRC-check; the hash chain, however, covers the *entire*
/// on-wire record (length prefixes, body, and stored CRC), not just the
/// body — see [`scan_segment`]/[`read_segment`] — so a bit flip in the
/// length prefixes is still caught even though it doesn't touch the body
/// CRC covers.
fn parse_segment_frame(buf: &[u8]) -> Result<(u32, Vec<u8>, usize)> {
    if buf.len() < 8 {
        return Err(GicsError::incomplete("segment header past buffer end"));
    }
    let uncompressed_len = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let compressed_len = u32::from_le_bytes(buf[4..8].try_into().unwrap()) as usize;
    let body_start = 8;
    let body_end = body_start
        .checked_add(compressed_len)
        .ok_or_else(|| GicsError::incomplete("segment compressed_len overflows"))?;
    if buf.len() < body_end + 4 {
        return Err(GicsError::incomplete("segment body/crc past buffer end"));
    }
    let body = buf[body_start..body_end].to_vec();
    let stored_crc = u32::from_le_bytes(buf[body_end..body_end + 4].try_into().unwrap());
    if integrity::crc32(&body) != stored_crc {
        return Err(GicsError::integrity("segment CRC32 mismatch"));
    }
    Ok((uncompressed_len, body, body_end + 4))
}

/// CRC-check one segment's frame, returning the bytes the hash chain covers
/// (the full on-wire record: length prefixes ‖ body ‖ CRC32) and the number
/// of bytes consumed. Used by `verify()`, which never decrypts or
/// decompresses. Chaining the whole record, not just the CRC-checked body,
/// is what makes a bit flip in either length prefix visible at the EOS root
/// comparison even though it leaves `body` and `stored_crc` untouched.
pub fn scan_segment(buf: &[u8]) -> Result<(Vec<u8>, usize)> {
    let (_uncompressed_len, _body, consumed) = parse_segment_frame(buf)?;
    Ok((buf[..consumed].to_vec(), consumed))
}

/// Parse, CRC-check, decrypt, and decompress one segment starting at
/// `buf[0]`. CRC is checked before any decryption is attempted.
pub fn read_segment(
    buf: &[u8],
    segment_index: u64,
    outer_codec: OuterCodec,
    crypto_ctx: Option<SegmentCrypto>,
) -> Result<ReadSegment> {
    let (uncompressed_len, body, consumed) = parse_segment_frame(buf)?;

    let compressed = match crypto_ctx {
        Some(ctx) => {
            let iv = crypto::derive_iv(ctx.file_salt, crypto::SEGMENT_DOMAIN_ID, segment_index);
            let aad = build_aad(segment_index, uncompressed_len as u64);
            crypto::decrypt(ctx.key, &iv, &aad, &body)?
        }
        None => body.clone(),
    };

    let plaintext = crate::outer::decompress(outer_codec, &compressed, uncompressed_len as u64)?;

    Ok(ReadSegment {
        plaintext,
        chained_bytes: buf[..consumed].to_vec(),
        consumed,
    })
}

/// `stream_domain_id(u32 LE, fixed at [`crypto::SEGMENT_DOMAIN_ID`]) ‖
/// segment_index(u64 LE) ‖ uncompressed_len(u64 LE)` — see `DESIGN.md`,
/// "stream_domain_id", for why a single segment-wide AAD replaces a
/// per-stream field.
fn build_aad(segment_index: u64, uncompressed_len: u64) -> Vec<u8> {
    let mut aad = Vec::with_capacity(4 + 8 + 8);
    aad.extend_from_slice(&crypto::SEGMENT_DOMAIN_ID.to_le_bytes());
    aad.extend_from_slice(&segment_index.to_le_bytes());
    aad.extend_from_slice(&uncompressed_len.to_le_bytes());
    aad
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_segment_roundtrips() {
        let plaintext = b"some block bytes go here, several of them".to_vec();
        let sealed = write_segment(&plaintext, 0, OuterCodec::None, 3, None).unwrap();
        let read = read_segment(&sealed, 0, OuterCodec::None, None).unwrap();
        assert_eq!(read.plaintext, plaintext);
        assert_eq!(read.consumed, sealed.len());
    }

    #[test]
    fn zstd_segment_roundtrips() {
        let plaintext: Vec<u8> = (0..5000u32).flat_map(|v| v.to_le_bytes()).collect();
        let sealed = write_segment(&plaintext, 3, OuterCodec::Zstd, 3, None).unwrap();
        let read = read_segment(&sealed, 3, OuterCodec::Zstd, None).unwrap();
        assert_eq!(read.plaintext, plaintext);
    }

    #[test]
    fn encrypted_segment_roundtrips_and_rejects_wrong_key() {
        let salt = [1u8; crypto::SALT_LEN];
        let key = crypto::derive_key("correct-horse-battery-staple", &salt);
        let wrong_key = crypto::derive_key("wrong-password", &salt);
        let plaintext = b"secret columnar bytes".to_vec();

        let sealed = write_segment(
            &plaintext,
            2,
            OuterCodec::None,
            3,
            Some(SegmentCrypto {
                key: &key,
                file_salt: &salt,
            }),
        )
        .unwrap();

        let ok = read_segment(
            &sealed,
            2,
            OuterCodec::None,
            Some(SegmentCrypto {
                key: &key,
                file_salt: &salt,
            }),
        )
        .unwrap();
        assert_eq!(ok.plaintext, plaintext);

        let err = read_segment(
            &sealed,
            2,
            OuterCodec::None,
            Some(SegmentCrypto {
                key: &wrong_key,
                file_salt: &salt,
            }),
        )
        .unwrap_err();
        assert!(matches!(err, GicsError::Integrity(_)));
    }

    #[test]
    fn tampered_body_fails_crc_before_decrypt_is_attempted() {
        let salt = [1u8; crypto::SALT_LEN];
        let key = crypto::derive_key("pw", &salt);
        let plaintext = b"tamper me".to_vec();
        let mut sealed = write_segment(
            &plaintext,
            0,
            OuterCodec::None,
            3,
            Some(SegmentCrypto {
                key: &key,
                file_salt: &salt,
            }),
        )
        .unwrap();
        let last = sealed.len() - 1;
        sealed[last - 5] ^= 0xFF;

        let err = read_segment(
            &sealed,
            0,
            OuterCodec::None,
            Some(SegmentCrypto {
                key: &key,
                file_salt: &salt,
            }),
        )
        .unwrap_err();
        assert!(matches!(err, GicsError::Integrity(_)));
    }

    #[test]
    fn truncated_segment_is_incomplete_data() {
        let plaintext = b"abc".to_vec();
        let sealed = write_segment(&plaintext, 0, OuterCodec::None, 3, None).unwrap();
        let truncated = &sealed[..sealed.len() - 2];
        let err = read_segment(truncated, 0, OuterCodec::None, None).unwrap_err();
        assert!(matches!(err, GicsError::IncompleteData(_)));
    }

    /// A bit flip confined to the `uncompressed_len` length prefix doesn't
    /// touch `body` or `stored_crc`, so CRC32 alone can't see it — the hash
    /// chain must cover the whole record or this kind of tamper would be
    /// invisible to `verify()`.
    #[test]
    fn length_prefix_tamper_changes_chained_bytes_but_not_crc() {
        let plaintext = b"abc".to_vec();
        let sealed = write_segment(&plaintext, 0, OuterCodec::None, 3, None).unwrap();
        let mut tampered = sealed.clone();
        tampered[0] ^= 0x01; // flip a bit inside uncompressed_len

        let (original_chained, _) = scan_segment(&sealed).unwrap();
        let (tampered_chained, _) = scan_segment(&tampered).unwrap();
        assert_ne!(original_chained, tampered_chained);

        // `body` and its CRC32 are unaffected — the flip lands before `body`.
        assert_eq!(&sealed[8..], &tampered[8..]);
    }
}
