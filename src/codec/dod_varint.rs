//! `DOD_VARINT` — delta-of-delta, varint-encoded.
//!
//! `dod_0 = v_0`, `dod_1 = v_1 - v_0`, and for `i >= 2`,
//! `dod_i = (v_i - v_{i-1}) - (v_{i-1} - v_{i-2})`. This is the classic
//! Gorilla/Facebook-style second-difference transform: on a perfectly
//! regular time axis every `dod_i` for `i >= 2` is zero.

use crate::error::Result;
use crate::varint::{varint_decode, varint_encode};

/// Compute the delta-of-delta sequence for `values`.
pub(super) fn forward(values: &[i64]) -> Vec<i64> {
    let mut dod = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let d = match i {
            0 => values[0],
            1 => values[1].wrapping_sub(values[0]),
            _ => {
                let delta_cur = values[i].wrapping_sub(values[i - 1]);
                let delta_prev = values[i - 1].wrapping_sub(values[i - 2]);
                delta_cur.wrapping_sub(delta_prev)
            }
        };
        dod.push(d);
    }
    dod
}

/// Invert [`forward`]: reconstruct `values` from a delta-of-delta sequence.
pub(super) fn inverse(dod: &[i64]) -> Vec<i64> {
    let mut values = Vec::with_capacity(dod.len());
    for (i, &d) in dod.iter().enumerate() {
        let v = match i {
            0 => d,
            1 => values[0].wrapping_add(d),
            _ => {
                let delta_prev = values[i - 1].wrapping_sub(values[i - 2]);
                let delta_cur = delta_prev.wrapping_add(d);
                values[i - 1].wrapping_add(delta_cur)
            }
        };
        values.push(v);
    }
    values
}

pub fn encode(values: &[i64]) -> Vec<u8> {
    varint_encode(&forward(values))
}

pub fn decode(payload: &[u8], n_items: u32) -> Result<Vec<i64>> {
    let dod = varint_decode(payload, n_items)?;
    Ok(inverse(&dod))
}
