//! `VARINT_DELTA` — first differences, varint-encoded. `v_0` is stored
//! verbatim; every later value is `v_i - v_{i-1}`.

use crate::error::Result;
use crate::varint::{varint_decode, varint_encode};

pub fn encode(values: &[i64]) -> Vec<u8> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut deltas = Vec::with_capacity(values.len());
    deltas.push(values[0]);
    for w in values.windows(2) {
        deltas.push(w[1].wrapping_sub(w[0]));
    }
    varint_encode(&deltas)
}

pub fn decode(payload: &[u8], n_items: u32) -> Result<Vec<i64>> {
    let deltas = varint_decode(payload, n_items)?;
    if deltas.is_empty() {
        return Ok(deltas);
    }
    let mut values = Vec::with_capacity(deltas.len());
    values.push(deltas[0]);
    for &d in &deltas[1..] {
        let prev = *values.last().unwrap();
        values.push(prev.wrapping_add(d));
    }
    Ok(values)
}
