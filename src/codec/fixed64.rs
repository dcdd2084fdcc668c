//! `FIXED64_LE` — the safe fallback. Eight little-endian bytes per value,
//! no transform whatsoever.
//!
//! This is what the codec selector falls back to whenever it "refuses to
//! compress": a pathological block (or one a QUARANTINE-state encoder
//! doesn't trust) still gets a bounded, deterministic, zero-surprise
//! encoding rather than a best-effort transform that might blow up.

use crate::error::{GicsError, Result};

pub fn encode(values: &[i64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn decode(payload: &[u8], n_items: u32) -> Result<Vec<i64>> {
    let n_items = n_items as usize;
    if payload.len() < n_items * 8 {
        return Err(GicsError::incomplete("fixed64_le payload shorter than n_items * 8"));
    }
    let mut values = Vec::with_capacity(n_items);
    for chunk in payload[..n_items * 8].chunks_exact(8) {
        values.push(i64::from_le_bytes(chunk.try_into().unwrap()));
    }
    Ok(values)
}
