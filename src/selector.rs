//! The Compression Heuristic Module (CHM): a pure `(stream, regime) -> codec`
//! table lookup, plus the QUARANTINE override and probe side-channel that
//! let the routing state machine (see [`crate::routing`]) decide when it is
//! safe to return to OK.
//!
//! CHM never reaches into the routing state machine and the state machine
//! never reaches into CHM — both are pure value-in/value-out components the
//! encoder driver wires together, avoiding any cyclic reference between the
//! encoder, CHM, and state machine (see `DESIGN.md`, "Cyclic references").

use crate::codec::{self, CodecId};
use crate::config::ContextMode;
use crate::context::DictContext;
use crate::metrics::Regime;
use crate::stream::StreamId;

/// Streams for which QUARANTINE forces the safe fallback. TIME, SNAPSHOT_LEN
/// and ITEM_ID carry no lossy risk and keep using the table even while
/// quarantined.
fn is_lossy_risk(stream: StreamId) -> bool {
    matches!(stream, StreamId::Value | StreamId::Quantity)
}

/// Pure table lookup: `(stream, regime)` plus whether `DICT_VARINT` context
/// is enabled determines the codec. Ignores routing state entirely — see
/// [`select`] for the QUARANTINE-aware entry point actually used by the
/// block builder.
pub fn table_lookup(stream: StreamId, regime: Regime, ctx_mode: ContextMode) -> CodecId {
    use Regime::*;
    use StreamId::*;

    match (stream, regime) {
        (Time, Ordered) => CodecId::DodVarint,
        (Time, Mixed) => CodecId::RleDod,
        (Time, Chaotic) => CodecId::VarintDelta,

        (SnapshotLen, Ordered) => CodecId::RleZigzag,
        (SnapshotLen, Mixed) => CodecId::RleZigzag,
        (SnapshotLen, Chaotic) => CodecId::VarintDelta,

        (ItemId, Ordered) => CodecId::VarintDelta,
        (ItemId, Mixed) => CodecId::VarintDelta,
        (ItemId, Chaotic) => {
            if ctx_mode == ContextMode::On {
                CodecId::DictVarint
            } else {
                CodecId::None
            }
        }

        (Value, Ordered) => {
            if ctx_mode == ContextMode::On {
                CodecId::DictVarint
            } else {
                CodecId::BitpackDelta
            }
        }
        (Value, Mixed) => CodecId::BitpackDelta,
        (Value, Chaotic) => CodecId::None,

        (Quantity, Ordered) => CodecId::RleZigzag,
        (Quantity, Mixed) => CodecId::VarintDelta,
        (Quantity, Chaotic) => CodecId::None,

        (Meta, _) => CodecId::None,
    }
}

/// Codec-selection entry point used by the block builder: applies the
/// QUARANTINE override on top of the pure table.
pub fn select(
    stream: StreamId,
    regime: Regime,
    ctx_mode: ContextMode,
    quarantined: bool,
) -> CodecId {
    if quarantined && is_lossy_risk(stream) {
        CodecId::Fixed64Le
    } else {
        table_lookup(stream, regime, ctx_mode)
    }
}

/// Result of one side-channel probe run while QUARANTINE is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub candidate: CodecId,
    pub candidate_len: usize,
    pub fallback_len: usize,
}

impl ProbeOutcome {
    /// A probe succeeds when the table's normal codec is at least 25%
    /// smaller than the FIXED64_LE fallback it is being compared against.
    pub fn succeeded(&self) -> bool {
        (self.candidate_len as f64) <= (self.fallback_len as f64) * 0.75
    }
}

/// Run one probe: encode `values` with both the table's normal codec for
/// `(stream, regime)` and with FIXED64_LE, on independent dictionary
/// snapshots so the probe never mutates the live encoder's dictionary.
pub fn run_probe(
    stream: StreamId,
    regime: Regime,
    ctx_mode: ContextMode,
    values: &[i64],
    dict: &DictContext,
) -> ProbeOutcome {
    let candidate = table_lookup(stream, regime, ctx_mode);
    let mut probe_dict = dict.clone();
    let candidate_len = codec::encode(candidate, values, &mut probe_dict).len();
    let mut fallback_dict = dict.clone();
    let fallback_len = codec::encode(CodecId::Fixed64Le, values, &mut fallback_dict).len();
    ProbeOutcome {
        candidate,
        candidate_len,
        fallback_len,
    }
}
