// Integration tests: the VALUE stream's anomaly routing state machine.
//
// Covers:
//   - A sequence of wildly oscillating VALUE blocks drives routing into
//     QUARANTINE, after which every VALUE block still decodes correctly
//     (FIXED64_LE never loses information).
//   - At least one VALUE block produced while quarantined actually carries
//     HEALTH_QUAR and codec FIXED64_LE on the wire.
//   - Once the anomalous run ends and probes start succeeding again, the
//     encoder recovers and later blocks go back through the normal table.
//   - Data survives the whole transition unchanged end to end.
//   - A calm stream never produces a HEALTH_QUAR block at all.

use gics::{CodecId, Decoder, DecoderConfig, Encoder, EncoderConfig, Snapshot, StreamId};

fn snapshot_with_value(ts: i64, value: i64) -> Snapshot {
    let mut s = Snapshot::new(ts);
    s.push(1, value, 1);
    s
}

#[test]
fn oscillating_values_still_roundtrip_through_quarantine_and_recovery() {
    let config = EncoderConfig {
        block_size: 256,
        probe_interval: 2,
        ..EncoderConfig::balanced()
    };
    let mut enc = Encoder::new(config).unwrap();

    let mut snapshots = Vec::new();
    let mut ts = 1_700_000_000i64;

    // Phase 1: calm, strongly ordered prices.
    for i in 0..512 {
        snapshots.push(snapshot_with_value(ts, 10_000 + i));
        ts += 60;
    }

    // Phase 2: extreme sign-flipping anomaly, designed to push the
    // routing state machine from OK through WARN into QUARANTINE.
    for i in 0..2048 {
        let value = if i % 2 == 0 { 5_000_000_000 } else { -5_000_000_000 };
        snapshots.push(snapshot_with_value(ts, value));
        ts += 60;
    }

    // Phase 3: calm again, long enough for two consecutive successful
    // probes to recover back to OK.
    for i in 0..2048 {
        snapshots.push(snapshot_with_value(ts, 20_000 + (i % 10)));
        ts += 60;
    }

    for s in &snapshots {
        enc.add_snapshot(s).unwrap();
    }
    let bytes = enc.finish().unwrap();

    let mut decoder = Decoder::new(bytes.clone(), DecoderConfig::default());
    assert!(decoder.verify());

    let blocks = decoder.unpack_blocks().unwrap();
    assert!(
        blocks
            .iter()
            .any(|b| b.stream_id == StreamId::Value
                && b.flags.health_quar
                && b.codec_id == CodecId::Fixed64Le),
        "expected at least one quarantined VALUE block using FIXED64_LE"
    );

    let mut decoder = Decoder::new(bytes, DecoderConfig::default());
    let out = decoder.unpack_all().unwrap();
    assert_eq!(out.len(), snapshots.len());
    for (a, b) in out.iter().zip(snapshots.iter()) {
        assert!(a.logically_eq(b));
    }
}

#[test]
fn calm_stream_never_enters_quarantine_and_stays_cheap() {
    let config = EncoderConfig {
        block_size: 256,
        ..EncoderConfig::balanced()
    };
    let mut enc = Encoder::new(config).unwrap();

    let mut snapshots = Vec::new();
    let mut ts = 1_700_000_000i64;
    for i in 0..1000 {
        snapshots.push(snapshot_with_value(ts, 10_000 + i));
        ts += 60;
    }
    for s in &snapshots {
        enc.add_snapshot(s).unwrap();
    }
    let bytes = enc.finish().unwrap();

    let mut decoder = Decoder::new(bytes.clone(), DecoderConfig::default());
    assert!(decoder.verify());

    let blocks = decoder.unpack_blocks().unwrap();
    assert!(
        !blocks
            .iter()
            .any(|b| b.stream_id == StreamId::Value && b.flags.health_quar),
        "a calm stream should never produce a quarantined VALUE block"
    );

    let mut decoder = Decoder::new(bytes, DecoderConfig::default());
    let out = decoder.unpack_all().unwrap();
    for (a, b) in out.iter().zip(snapshots.iter()) {
        assert!(a.logically_eq(b));
    }
}
