//! `BITPACK_DELTA` — first differences, zigzag-mapped, then packed to the
//! minimum bit width that fits the largest magnitude in the block.
//!
//! Payload layout: `[bits: u8][v0: 8 bytes LE, signed][bitpacked deltas...]`.
//! `bits` is the width used for every delta after the first (the first
//! value is stored verbatim since it has no predecessor).

use crate::error::{GicsError, Result};
use crate::varint::{bitpack_decode, bitpack_encode, bits_needed, zigzag_decode, zigzag_encode};

pub fn encode(values: &[i64]) -> Vec<u8> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut deltas = Vec::with_capacity(values.len() - 1);
    for w in values.windows(2) {
        deltas.push(w[1].wrapping_sub(w[0]));
    }
    let zz: Vec<u64> = deltas.iter().map(|&d| zigzag_encode(d)).collect();
    let max = zz.iter().copied().max().unwrap_or(0);
    let bits = bits_needed(max).max(1);

    let mut out = Vec::with_capacity(1 + 8 + zz.len() * bits as usize / 8 + 1);
    out.push(bits as u8);
    out.extend_from_slice(&values[0].to_le_bytes());
    out.extend_from_slice(&bitpack_encode(&zz, bits));
    out
}

pub fn decode(payload: &[u8], n_items: u32) -> Result<Vec<i64>> {
    if n_items == 0 {
        return Ok(Vec::new());
    }
    if payload.len() < 9 {
        return Err(GicsError::incomplete("bitpack_delta payload shorter than header"));
    }
    let bits = payload[0] as u32;
    if bits == 0 || bits > 64 {
        return Err(GicsError::incomplete("bitpack_delta declares an invalid bit width"));
    }
    let v0 = i64::from_le_bytes(payload[1..9].try_into().unwrap());
    let zz = bitpack_decode(&payload[9..], n_items - 1, bits)?;

    let mut values = Vec::with_capacity(n_items as usize);
    values.push(v0);
    for z in zz {
        let delta = zigzag_decode(z);
        let prev = *values.last().unwrap();
        values.push(prev.wrapping_add(delta));
    }
    Ok(values)
}
