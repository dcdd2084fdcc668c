//! `RLE_DoD` — run-length encoding over the delta-of-delta transform,
//! reusing [`super::dod_varint`]'s forward/inverse transform and
//! [`super::rle_zigzag`]'s pair framing.

use crate::error::Result;

pub fn encode(values: &[i64]) -> Vec<u8> {
    super::rle_zigzag::encode(&super::dod_varint::forward(values))
}

pub fn decode(payload: &[u8], n_items: u32) -> Result<Vec<i64>> {
    let dod = super::rle_zigzag::decode(payload, n_items)?;
    Ok(super::dod_varint::inverse(&dod))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_regular_spacing_compresses_to_one_run() {
        let values: Vec<i64> = (0..2000).map(|i| 1_700_000_000 + i * 60).collect();
        let encoded = encode(&values);
        assert_eq!(decode(&encoded, values.len() as u32).unwrap(), values);
    }

    #[test]
    fn roundtrip_irregular_spacing() {
        let values: Vec<i64> = vec![0, 60, 200, 260, 260, 1000];
        let encoded = encode(&values);
        assert_eq!(decode(&encoded, values.len() as u32).unwrap(), values);
    }
}
