//! The `CodecId` tag and the uniform codec interface it dispatches to.
//!
//! Each inner codec is a variant of one tagged enum rather than a trait
//! object — selection is a pure table lookup (see [`crate::selector`]), so
//! there is never a need for dynamic dispatch or a vtable. This mirrors the
//! "Polymorphic codecs" design note: one matching `(encode, decode)` pair
//! per variant.

use crate::context::DictContext;
use crate::error::Result;

/// Identifies which inner codec encoded a block's payload. Discriminants
/// are stored on the wire as the block header's `codec_id` byte and must
/// never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CodecId {
    None = 0,
    VarintDelta = 1,
    BitpackDelta = 2,
    RleZigzag = 3,
    RleDod = 4,
    DodVarint = 5,
    DictVarint = 6,
    Fixed64Le = 7,
}

impl CodecId {
    pub fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(CodecId::None),
            1 => Ok(CodecId::VarintDelta),
            2 => Ok(CodecId::BitpackDelta),
            3 => Ok(CodecId::RleZigzag),
            4 => Ok(CodecId::RleDod),
            5 => Ok(CodecId::DodVarint),
            6 => Ok(CodecId::DictVarint),
            7 => Ok(CodecId::Fixed64Le),
            other => Err(crate::error::GicsError::incomplete(format!(
                "unknown codec id {other}"
            ))),
        }
    }
}

/// Encode `values` with the given codec, using (and possibly updating)
/// `dict` when the codec is [`CodecId::DictVarint`].
pub fn encode(codec: CodecId, values: &[i64], dict: &mut DictContext) -> Vec<u8> {
    match codec {
        CodecId::None => super::none::encode(values),
        CodecId::VarintDelta => super::varint_delta::encode(values),
        CodecId::BitpackDelta => super::bitpack_delta::encode(values),
        CodecId::RleZigzag => super::rle_zigzag::encode(values),
        CodecId::RleDod => super::rle_dod::encode(values),
        CodecId::DodVarint => super::dod_varint::encode(values),
        CodecId::DictVarint => super::dict_varint::encode(values, dict),
        CodecId::Fixed64Le => super::fixed64::encode(values),
    }
}

/// Decode `n_items` values from `payload` using the given codec.
pub fn decode(
    codec: CodecId,
    payload: &[u8],
    n_items: u32,
    dict: &mut DictContext,
) -> Result<Vec<i64>> {
    match codec {
        CodecId::None => super::none::decode(payload, n_items),
        CodecId::VarintDelta => super::varint_delta::decode(payload, n_items),
        CodecId::BitpackDelta => super::bitpack_delta::decode(payload, n_items),
        CodecId::RleZigzag => super::rle_zigzag::decode(payload, n_items),
        CodecId::RleDod => super::rle_dod::decode(payload, n_items),
        CodecId::DodVarint => super::dod_varint::decode(payload, n_items),
        CodecId::DictVarint => super::dict_varint::decode(payload, n_items, dict),
        CodecId::Fixed64Le => super::fixed64::decode(payload, n_items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_id_roundtrips_through_byte() {
        let all = [
            CodecId::None,
            CodecId::VarintDelta,
            CodecId::BitpackDelta,
            CodecId::RleZigzag,
            CodecId::RleDod,
            CodecId::DodVarint,
            CodecId::DictVarint,
            CodecId::Fixed64Le,
        ];
        for c in all {
            assert_eq!(CodecId::from_u8(c as u8).unwrap(), c);
        }
    }

    #[test]
    fn unknown_codec_id_is_incomplete_data() {
        assert!(CodecId::from_u8(200).is_err());
    }
}
