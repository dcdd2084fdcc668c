// Integration tests: basic encode/decode roundtrip and encode determinism.
//
// Covers:
//   - A handful of hand-built snapshots survive encode -> decode unchanged
//     up to item insertion order.
//   - verify() passes on freshly encoded output.
//   - Two independent encodes of the same input, same config, produce
//     byte-identical output.
//   - A larger pseudo-random dataset (deterministic LCG, no external
//     randomness source) roundtrips across several segments and multiple
//     stream regimes.

use gics::{Decoder, DecoderConfig, Encoder, EncoderConfig, Snapshot};

fn snapshot(ts: i64, items: &[(u32, i64, i64)]) -> Snapshot {
    let mut s = Snapshot::new(ts);
    for &(id, price, qty) in items {
        s.push(id, price, qty);
    }
    s
}

fn encode_all(snapshots: &[Snapshot], config: EncoderConfig) -> Vec<u8> {
    let mut enc = Encoder::new(config).unwrap();
    for s in snapshots {
        enc.add_snapshot(s).unwrap();
    }
    enc.finish().unwrap()
}

#[test]
fn small_handwritten_set_roundtrips() {
    let snapshots = vec![
        snapshot(1_700_000_000, &[(1, 4200, 10), (2, 100, 1)]),
        snapshot(1_700_000_060, &[(1, 4205, 9)]),
        snapshot(1_700_000_120, &[]),
        snapshot(1_700_000_180, &[(3, -500, 0), (1, 4180, 12)]),
    ];
    let bytes = encode_all(&snapshots, EncoderConfig::balanced());

    let mut decoder = Decoder::new(bytes, DecoderConfig::default());
    assert!(decoder.verify());
    let out = decoder.unpack_all().unwrap();
    assert_eq!(out.len(), snapshots.len());
    for (a, b) in out.iter().zip(snapshots.iter()) {
        assert!(a.logically_eq(b), "{a:?} != {b:?}");
    }
}

#[test]
fn empty_stream_roundtrips() {
    let bytes = encode_all(&[], EncoderConfig::balanced());
    let mut decoder = Decoder::new(bytes, DecoderConfig::default());
    assert!(decoder.verify());
    assert_eq!(decoder.unpack_all().unwrap(), vec![]);
}

#[test]
fn encode_is_deterministic_across_independent_runs() {
    let snapshots = lcg_dataset(500);
    let a = encode_all(&snapshots, EncoderConfig::balanced());
    let b = encode_all(&snapshots, EncoderConfig::balanced());
    assert_eq!(a, b);
}

#[test]
fn large_pseudo_random_dataset_roundtrips_across_segments() {
    let snapshots = lcg_dataset(4000);
    let config = EncoderConfig {
        segment_size_limit: 64 * 1024,
        ..EncoderConfig::balanced()
    };
    let bytes = encode_all(&snapshots, config);

    let mut decoder = Decoder::new(bytes, DecoderConfig::default());
    assert!(decoder.verify());
    let out = decoder.unpack_all().unwrap();
    assert_eq!(out.len(), snapshots.len());
    for (a, b) in out.iter().zip(snapshots.iter()) {
        assert!(a.logically_eq(b));
    }
}

#[test]
fn context_mode_on_roundtrips_with_dict_varint_in_play() {
    let snapshots: Vec<Snapshot> = (0..300)
        .map(|i| snapshot(1_700_000_000 + i * 60, &[(1 + (i % 5) as u32, 100 + (i % 5), 1)]))
        .collect();
    let config = EncoderConfig {
        context_mode: gics::ContextMode::On,
        context_id: Some("price-book-v1".to_string()),
        ..EncoderConfig::balanced()
    };
    let bytes = encode_all(&snapshots, config);

    let mut decoder = Decoder::new(bytes, DecoderConfig::default());
    assert!(decoder.verify());
    let out = decoder.unpack_all().unwrap();
    for (a, b) in out.iter().zip(snapshots.iter()) {
        assert!(a.logically_eq(b));
    }
}

/// Minimal linear congruential generator so test datasets are reproducible
/// without pulling in a dependency on `rand`.
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes constants.
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223)
            & 0xFFFF_FFFF;
        self.state as u32
    }

    fn range(&mut self, lo: u32, hi: u32) -> u32 {
        lo + self.next_u32() % (hi - lo)
    }
}

/// Deterministic dataset: seed 123456789, base time 1700000000, 60s spacing,
/// 1-20 items per snapshot with item ids in [1,100], prices in [1000,50000),
/// quantities in [1,1000).
fn lcg_dataset(n_snapshots: usize) -> Vec<Snapshot> {
    let mut rng = Lcg::new(123_456_789);
    let base_time = 1_700_000_000i64;
    let mut out = Vec::with_capacity(n_snapshots);
    for i in 0..n_snapshots {
        let ts = base_time + (i as i64) * 60;
        let mut s = Snapshot::new(ts);
        let n_items = rng.range(1, 21);
        for _ in 0..n_items {
            let item_id = rng.range(1, 101);
            let price = rng.range(1000, 50_000) as i64;
            let qty = rng.range(1, 1000) as i64;
            s.push(item_id, price, qty);
        }
        out.push(s);
    }
    out
}
