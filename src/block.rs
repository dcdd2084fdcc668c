//! The block header and the `Block` container it frames.
//!
//! A block is one stream's encoded slice: an 11-byte header followed by the
//! codec's payload bytes. Blocks are the unit the builder produces and
//! segments accumulate; they never cross segment boundaries.

use crate::error::{GicsError, Result};
use crate::routing::HealthFlags;
use crate::stream::StreamId;

pub const BLOCK_HEADER_LEN: usize = 11;

/// One encoded stream-block: header fields plus the codec's raw payload.
#[derive(Debug, Clone)]
pub struct Block {
    pub stream_id: StreamId,
    pub codec_id: crate::codec::CodecId,
    pub n_items: u32,
    pub flags: HealthFlags,
    pub payload: Vec<u8>,
}

impl Block {
    /// Total on-wire size: 11-byte header plus payload.
    pub fn total_len(&self) -> usize {
        BLOCK_HEADER_LEN + self.payload.len()
    }

    /// Serialize header + payload, appending to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.stream_id as u8);
        out.push(self.codec_id as u8);
        out.extend_from_slice(&self.n_items.to_le_bytes());
        out.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        out.push(self.flags.to_bits());
        out.extend_from_slice(&self.payload);
    }

    /// Parse one block starting at `buf[0]`. Returns the block and the
    /// number of bytes consumed from `buf`.
    pub fn read_from(buf: &[u8]) -> Result<(Block, usize)> {
        if buf.len() < BLOCK_HEADER_LEN {
            return Err(GicsError::incomplete("block header past buffer end"));
        }
        let stream_id = StreamId::from_u8(buf[0])?;
        let codec_id = crate::codec::CodecId::from_u8(buf[1])?;
        let n_items = u32::from_le_bytes(buf[2..6].try_into().unwrap());
        let payload_len = u32::from_le_bytes(buf[6..10].try_into().unwrap()) as usize;
        let flags = HealthFlags::from_bits(buf[10]);

        let total = BLOCK_HEADER_LEN + payload_len;
        if buf.len() < total {
            return Err(GicsError::incomplete("block payload past buffer end"));
        }
        let payload = buf[BLOCK_HEADER_LEN..total].to_vec();

        Ok((
            Block {
                stream_id,
                codec_id,
                n_items,
                flags,
                payload,
            },
            total,
        ))
    }
}
