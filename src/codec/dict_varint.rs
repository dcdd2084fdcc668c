//! `DICT_VARINT` — dictionary-indexed values over a shared
//! [`DictContext`].
//!
//! Each value is looked up in the dictionary; a hit emits the symbol index
//! as a varint. A miss emits `0` (the reserved "no symbol" marker) followed
//! by the raw zigzag+LEB128 value, then inserts the value into the
//! dictionary so later occurrences hit. Encoder and decoder dictionaries
//! stay in lockstep because both insert new values in the exact order they
//! are observed — see [`crate::context::DictContext`].

use crate::context::DictContext;
use crate::error::{GicsError, Result};
use crate::varint::{leb128_decode, leb128_encode, zigzag_decode, zigzag_encode};

pub fn encode(values: &[i64], dict: &mut DictContext) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 2);
    for &v in values {
        match dict.lookup(v) {
            Some(symbol) => leb128_encode(symbol as u64, &mut out),
            None => {
                leb128_encode(0, &mut out);
                leb128_encode(zigzag_encode(v), &mut out);
                dict.insert(v);
            }
        }
    }
    out
}

pub fn decode(payload: &[u8], n_items: u32, dict: &mut DictContext) -> Result<Vec<i64>> {
    let mut values = Vec::with_capacity(n_items as usize);
    let mut pos = 0usize;
    for _ in 0..n_items {
        let symbol = leb128_decode(payload, &mut pos)?;
        if symbol == 0 {
            let z = leb128_decode(payload, &mut pos)?;
            let v = zigzag_decode(z);
            dict.insert(v);
            values.push(v);
        } else {
            let symbol = u32::try_from(symbol)
                .map_err(|_| GicsError::incomplete("dict_varint symbol index out of range"))?;
            let v = dict
                .resolve(symbol)
                .ok_or_else(|| GicsError::integrity("dict_varint symbol not found in dictionary"))?;
            values.push(v);
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_repetition() {
        let values: Vec<i64> = vec![10, 20, 10, 30, 20, 10, 40];
        let mut enc_dict = DictContext::new();
        let mut dec_dict = DictContext::new();
        let encoded = encode(&values, &mut enc_dict);
        let decoded = decode(&encoded, values.len() as u32, &mut dec_dict).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn dictionary_persists_across_blocks() {
        let mut enc_dict = DictContext::new();
        let mut dec_dict = DictContext::new();

        let block1 = vec![1i64, 2, 3];
        let e1 = encode(&block1, &mut enc_dict);
        assert_eq!(decode(&e1, 3, &mut dec_dict).unwrap(), block1);

        // Second block reuses symbols learned in the first.
        let block2 = vec![1i64, 1, 2];
        let e2 = encode(&block2, &mut enc_dict);
        // Every value already known: no raw-varint misses, so the
        // second block's payload is much shorter than block1's.
        assert!(e2.len() < e1.len());
        assert_eq!(decode(&e2, 3, &mut dec_dict).unwrap(), block2);
    }

    #[test]
    fn unknown_symbol_is_integrity_error() {
        let mut dict = DictContext::new();
        let mut payload = Vec::new();
        leb128_encode(5, &mut payload); // symbol 5, never inserted
        let err = decode(&payload, 1, &mut dict).unwrap_err();
        assert!(matches!(err, GicsError::Integrity(_)));
    }
}
