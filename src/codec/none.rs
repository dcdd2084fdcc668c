//! `NONE` — raw varint, no transform.
//!
//! The baseline codec: every other inner codec is a transform applied
//! before falling back to this encoding.

use crate::error::Result;
use crate::varint::{varint_decode, varint_encode};

pub fn encode(values: &[i64]) -> Vec<u8> {
    varint_encode(values)
}

pub fn decode(payload: &[u8], n_items: u32) -> Result<Vec<i64>> {
    varint_decode(payload, n_items)
}
