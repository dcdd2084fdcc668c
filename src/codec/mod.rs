//! Inner codecs: the eight encodings a block's payload can be compressed
//! with. See [`types::CodecId`] for the dispatch tag and [`types::encode`]/
//! [`types::decode`] for the uniform entry points the selector and block
//! builder call through.

mod bitpack_delta;
mod dict_varint;
mod dod_varint;
mod fixed64;
mod none;
mod rle_dod;
mod rle_zigzag;
mod varint_delta;

pub mod types;

pub use types::{decode, encode, CodecId};

/// Exposes the delta-of-delta transform to [`crate::metrics`], which needs
/// it to compute DoD-based statistics without duplicating the transform.
pub(crate) fn dod_forward(values: &[i64]) -> Vec<i64> {
    dod_varint::forward(values)
}
