//! The decoder driver: verification, full unpack, and a
//! time-range query built on top of full unpack.
//!
//! `verify()` never decrypts or decompresses anything — CRC32 covers each
//! segment's raw (possibly encrypted) body, and the hash chain covers the
//! full on-wire segment record including its length prefixes, so a
//! corrupted or wrong-password file is rejected by byte-level checks alone.
//! `unpack_all` is the only path that ever produces plaintext, and it
//! checks the auth-verify token before decrypting a single segment.

use crate::config::DecoderConfig;
use crate::context::DictContext;
use crate::crypto;
use crate::error::{GicsError, Result};
use crate::header::FileHeader;
use crate::integrity::{self, HashChain};
use crate::segment::{self, SegmentCrypto};
use crate::stream::{Item, Snapshot, StreamId};

/// Single-use, non-poisoning decoder over an in-memory byte buffer.
pub struct Decoder {
    bytes: Vec<u8>,
    config: DecoderConfig,
    dict: DictContext,
}

impl Decoder {
    pub fn new(bytes: Vec<u8>, config: DecoderConfig) -> Self {
        Self::with_dict_context(bytes, config, DictContext::new())
    }

    pub fn with_dict_context(bytes: Vec<u8>, config: DecoderConfig, dict: DictContext) -> Self {
        Decoder {
            bytes,
            config,
            dict,
        }
    }

    /// CRC + hash-chain (+ auth-verify, if a password is configured)
    /// verification. Pure, side-effect-free, fails closed: any problem at
    /// all, including a malformed header, yields `false` rather than
    /// propagating an error.
    pub fn verify(&self) -> bool {
        self.try_verify().unwrap_or(false)
    }

    fn try_verify(&self) -> Result<bool> {
        let (header, mut pos) = FileHeader::read_from(&self.bytes)?;

        if let Some(ext) = &header.encryption {
            if let Some(password) = &self.config.password {
                let key = crypto::derive_key(password, &ext.file_salt);
                if integrity::verify_auth_verify(&key, &ext.auth_verify).is_err() {
                    return Ok(false);
                }
            }
        }

        let mut chain = HashChain::new();
        let mut segment_count = 0u32;
        loop {
            if is_eos(&self.bytes, pos) {
                let (stored_count, stored_root) = read_eos(&self.bytes, pos);
                pos += segment::EOS_LEN;
                if pos != self.bytes.len() {
                    return Ok(false);
                }
                return Ok(stored_count == segment_count && stored_root == chain.root());
            }
            let (chained_bytes, consumed) = segment::scan_segment(&self.bytes[pos..])?;
            chain.update(&chained_bytes);
            pos += consumed;
            segment_count += 1;
            if pos > self.bytes.len() {
                return Ok(false);
            }
        }
    }

    /// Decode every segment down to its raw blocks, without reassembling
    /// column values into snapshots. `unpack_all` is built on top of this;
    /// exposed directly for callers that need a block's codec choice or
    /// [`crate::HealthFlags`] rather than its decoded values (tooling,
    /// tests that assert on routing behavior at the wire level).
    pub fn unpack_blocks(&mut self) -> Result<Vec<crate::block::Block>> {
        let (header, mut pos) = FileHeader::read_from(&self.bytes)?;
        let outer_codec = header.flags.outer_codec();

        let key = match &header.encryption {
            Some(ext) => {
                let password = self.config.password.as_ref().ok_or_else(|| {
                    GicsError::integrity("file is encrypted but no password was configured")
                })?;
                let key = crypto::derive_key(password, &ext.file_salt);
                integrity::verify_auth_verify(&key, &ext.auth_verify)?;
                Some((key, ext.file_salt))
            }
            None => None,
        };

        let mut chain = HashChain::new();
        let mut segment_index = 0u64;
        let mut segment_count = 0u32;
        let max_decode = self.config.max_file_decode();
        let mut decoded_bytes = 0u64;
        let mut blocks = Vec::new();

        loop {
            if is_eos(&self.bytes, pos) {
                let (stored_count, stored_root) = read_eos(&self.bytes, pos);
                pos += segment::EOS_LEN;
                if pos != self.bytes.len() {
                    return Err(GicsError::incomplete("trailing bytes after EOS"));
                }
                if stored_count != segment_count {
                    return Err(GicsError::integrity("EOS segment_count does not match"));
                }
                if stored_root != chain.root() {
                    return Err(GicsError::integrity("hash-chain root mismatch at EOS"));
                }
                break;
            }

            let crypto_ctx = key.as_ref().map(|(k, salt)| SegmentCrypto {
                key: k,
                file_salt: salt,
            });
            let remaining = self
                .bytes
                .get(pos..)
                .ok_or_else(|| GicsError::incomplete("missing EOS marker"))?;
            let read = segment::read_segment(remaining, segment_index, outer_codec, crypto_ctx)?;
            chain.update(&read.chained_bytes);
            pos += read.consumed;
            segment_index += 1;
            segment_count += 1;

            decoded_bytes = decoded_bytes.saturating_add(read.plaintext.len() as u64);
            if decoded_bytes > max_decode {
                return Err(GicsError::limit(format!(
                    "decoded size {decoded_bytes} exceeds configured MAX_FILE_DECODE {max_decode}"
                )));
            }

            parse_segment_blocks(&read.plaintext, &mut blocks)?;
        }

        Ok(blocks)
    }

    /// Fully decode every segment and reconstruct the snapshot sequence.
    pub fn unpack_all(&mut self) -> Result<Vec<Snapshot>> {
        let blocks = self.unpack_blocks()?;

        let mut time_all: Vec<i64> = Vec::new();
        let mut snapshot_len_all: Vec<i64> = Vec::new();
        let mut item_id_all: Vec<i64> = Vec::new();
        let mut value_all: Vec<i64> = Vec::new();
        let mut quantity_all: Vec<i64> = Vec::new();

        for block in &blocks {
            let values =
                crate::codec::decode(block.codec_id, &block.payload, block.n_items, &mut self.dict)?;
            match block.stream_id {
                StreamId::Time => time_all.extend(values),
                StreamId::SnapshotLen => snapshot_len_all.extend(values),
                StreamId::ItemId => item_id_all.extend(values),
                StreamId::Value => value_all.extend(values),
                StreamId::Quantity => quantity_all.extend(values),
                StreamId::Meta => {}
            }
        }

        if time_all.len() != snapshot_len_all.len() {
            return Err(GicsError::integrity("TIME/SNAPSHOT_LEN length mismatch"));
        }
        let total_items: i64 = snapshot_len_all.iter().sum();
        if total_items < 0
            || total_items as usize != item_id_all.len()
            || item_id_all.len() != value_all.len()
            || value_all.len() != quantity_all.len()
        {
            return Err(GicsError::integrity(
                "SNAPSHOT_LEN does not match ITEM_ID/VALUE/QUANTITY lengths",
            ));
        }

        let mut snapshots = Vec::with_capacity(time_all.len());
        let mut cursor = 0usize;
        for i in 0..time_all.len() {
            let len = snapshot_len_all[i] as usize;
            let mut snapshot = Snapshot::new(time_all[i]);
            for j in cursor..cursor + len {
                let item_id = u32::try_from(item_id_all[j])
                    .map_err(|_| GicsError::integrity("ITEM_ID out of u32 range"))?;
                snapshot.items.push((
                    item_id,
                    Item {
                        price: value_all[j],
                        quantity: quantity_all[j],
                    },
                ));
            }
            cursor += len;
            snapshots.push(snapshot);
        }

        Ok(snapshots)
    }

    /// `unpack_all` filtered to `[time_lo, time_hi]` inclusive. This format
    /// has no per-segment time index, so the full file is decoded; the
    /// segment-scan cost is identical to `unpack_all`.
    pub fn query_range(&mut self, time_lo: i64, time_hi: i64) -> Result<Vec<Snapshot>> {
        let all = self.unpack_all()?;
        Ok(all
            .into_iter()
            .filter(|s| s.timestamp >= time_lo && s.timestamp <= time_hi)
            .collect())
    }
}

fn is_eos(bytes: &[u8], pos: usize) -> bool {
    pos + segment::EOS_LEN == bytes.len() && bytes.get(pos) == Some(&segment::EOS_TAG)
}

fn read_eos(bytes: &[u8], pos: usize) -> (u32, [u8; 32]) {
    let count = u32::from_le_bytes(bytes[pos + 1..pos + 5].try_into().unwrap());
    let mut root = [0u8; 32];
    root.copy_from_slice(&bytes[pos + 5..pos + 5 + 32]);
    (count, root)
}

fn parse_segment_blocks(plaintext: &[u8], blocks: &mut Vec<crate::block::Block>) -> Result<()> {
    let mut pos = 0usize;
    while pos < plaintext.len() {
        let (block, consumed) = crate::block::Block::read_from(&plaintext[pos..])?;
        pos += consumed;
        blocks.push(block);
    }
    if pos != plaintext.len() {
        return Err(GicsError::incomplete("segment plaintext has trailing bytes"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncoderConfig;
    use crate::encoder::Encoder;

    fn sample_bytes(n: i64) -> Vec<u8> {
        let mut enc = Encoder::new(EncoderConfig::balanced()).unwrap();
        for i in 0..n {
            let mut s = Snapshot::new(1_700_000_000 + i * 60);
            s.push(1, 100 + i, 1);
            enc.add_snapshot(&s).unwrap();
        }
        enc.finish().unwrap()
    }

    #[test]
    fn max_file_decode_cap_rejects_oversized_decode() {
        let bytes = sample_bytes(500);
        let config = DecoderConfig {
            max_file_decode: Some(8),
            ..DecoderConfig::default()
        };
        let mut decoder = Decoder::new(bytes, config);
        let err = decoder.unpack_all().unwrap_err();
        assert!(matches!(err, GicsError::LimitExceeded(_)));
    }

    #[test]
    fn max_file_decode_default_allows_normal_sized_file() {
        let bytes = sample_bytes(500);
        let mut decoder = Decoder::new(bytes, DecoderConfig::default());
        assert!(decoder.unpack_all().is_ok());
    }

    #[test]
    fn unpack_blocks_covers_every_stream_and_matches_unpack_all() {
        let bytes = sample_bytes(40);
        let mut decoder = Decoder::new(bytes.clone(), DecoderConfig::default());
        let blocks = decoder.unpack_blocks().unwrap();
        assert!(!blocks.is_empty());
        assert!(blocks.iter().any(|b| b.stream_id == StreamId::Time));
        assert!(blocks.iter().any(|b| b.stream_id == StreamId::Value));

        let mut decoder = Decoder::new(bytes, DecoderConfig::default());
        let snapshots = decoder.unpack_all().unwrap();
        assert_eq!(snapshots.len(), 40);
    }
}
