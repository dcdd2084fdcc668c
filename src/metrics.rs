//! Per-block statistics and the regime classifier built on top of them.
//!
//! [`BlockMetrics::compute`] derives a fixed set of deterministic
//! statistics from a stream-block's raw `i64` values; [`classify`] reduces
//! those statistics to one of three [`Regime`]s. Both are pure functions —
//! the selector and routing state machine consume their output but never
//! reach back into them, avoiding any cyclic reference between the encoder,
//! CHM, and state machine (see `DESIGN.md`, "Cyclic references").

use crate::codec::dod_forward;

/// Coarse classification of a block's data shape, used to pick an inner
/// codec and to drive anomaly routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Strongly monotonic or low-cardinality deltas: favors DoD/RLE-style
    /// codecs.
    Ordered,
    /// Neither strongly ordered nor chaotic.
    Mixed,
    /// High sign-flip rate or extreme delta magnitude: favors safe,
    /// transform-free codecs.
    Chaotic,
}

/// Deterministic, single-pass-computable statistics for one stream-block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockMetrics {
    pub unique_ratio: f64,
    pub zero_ratio: f64,
    pub mean_abs_delta: f64,
    pub p90_abs_delta: f64,
    pub sign_flip_rate: f64,
    pub monotonicity_score: f64,
    pub outlier_score: f64,
    pub unique_delta_ratio: f64,
    pub unique_dod_ratio: f64,
    pub dod_zero_ratio: f64,
    pub mean_abs_dod: f64,
    pub p90_abs_dod: f64,
}

fn percentile90(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = (((values.len() - 1) as f64) * 0.9).round() as usize;
    values[idx.min(values.len() - 1)]
}

fn unique_ratio_of(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len() as f64 / values.len() as f64
}

impl BlockMetrics {
    /// Compute the full statistic set for `values` (one stream-block's raw
    /// decoded-domain values).
    pub fn compute(values: &[i64]) -> BlockMetrics {
        let n = values.len();
        if n == 0 {
            return BlockMetrics {
                unique_ratio: 0.0,
                zero_ratio: 0.0,
                mean_abs_delta: 0.0,
                p90_abs_delta: 0.0,
                sign_flip_rate: 0.0,
                monotonicity_score: 1.0,
                outlier_score: 0.0,
                unique_delta_ratio: 0.0,
                unique_dod_ratio: 0.0,
                dod_zero_ratio: 0.0,
                mean_abs_dod: 0.0,
                p90_abs_dod: 0.0,
            };
        }

        let zero_ratio = values.iter().filter(|&&v| v == 0).count() as f64 / n as f64;
        let unique_ratio = unique_ratio_of(values);

        let deltas: Vec<i64> = values.windows(2).map(|w| w[1].wrapping_sub(w[0])).collect();
        let abs_deltas: Vec<f64> = deltas.iter().map(|&d| (d as f64).abs()).collect();
        let mean_abs_delta = if abs_deltas.is_empty() {
            0.0
        } else {
            abs_deltas.iter().sum::<f64>() / abs_deltas.len() as f64
        };
        let p90_abs_delta = percentile90(abs_deltas.clone());

        let nonzero_deltas: Vec<i64> = deltas.iter().copied().filter(|&d| d != 0).collect();
        let sign_flip_rate = if nonzero_deltas.len() < 2 {
            0.0
        } else {
            let flips = nonzero_deltas
                .windows(2)
                .filter(|w| (w[0] > 0) != (w[1] > 0))
                .count();
            flips as f64 / (nonzero_deltas.len() - 1) as f64
        };

        let monotonicity_score = if deltas.is_empty() {
            1.0
        } else {
            let nonneg = deltas.iter().filter(|&&d| d >= 0).count();
            let nonpos = deltas.iter().filter(|&&d| d <= 0).count();
            nonneg.max(nonpos) as f64 / deltas.len() as f64
        };

        let unique_delta_ratio = unique_ratio_of(&deltas);

        // Outlier score: fraction of deltas whose magnitude exceeds 5x the
        // mean absolute delta (a simple, deterministic robustness proxy).
        let outlier_score = if abs_deltas.is_empty() || mean_abs_delta == 0.0 {
            0.0
        } else {
            let threshold = mean_abs_delta * 5.0;
            let outliers = abs_deltas.iter().filter(|&&d| d > threshold).count();
            outliers as f64 / abs_deltas.len() as f64
        };

        let dod = dod_forward(values);
        let second_diffs: &[i64] = if dod.len() > 2 { &dod[2..] } else { &[] };
        let abs_dod: Vec<f64> = second_diffs.iter().map(|&d| (d as f64).abs()).collect();
        let mean_abs_dod = if abs_dod.is_empty() {
            0.0
        } else {
            abs_dod.iter().sum::<f64>() / abs_dod.len() as f64
        };
        let p90_abs_dod = percentile90(abs_dod.clone());
        let dod_zero_ratio = if second_diffs.is_empty() {
            1.0
        } else {
            second_diffs.iter().filter(|&&d| d == 0).count() as f64 / second_diffs.len() as f64
        };
        let unique_dod_ratio = unique_ratio_of(second_diffs);

        BlockMetrics {
            unique_ratio,
            zero_ratio,
            mean_abs_delta,
            p90_abs_delta,
            sign_flip_rate,
            monotonicity_score,
            outlier_score,
            unique_delta_ratio,
            unique_dod_ratio,
            dod_zero_ratio,
            mean_abs_dod,
            p90_abs_dod,
        }
    }
}

/// Classify a block's regime from its metrics. Tie-breaks resolve in
/// declaration order: ORDERED is checked first, then CHAOTIC, else MIXED.
pub fn classify(metrics: &BlockMetrics) -> Regime {
    if metrics.monotonicity_score > 0.9 || metrics.unique_delta_ratio < 0.05 {
        return Regime::Ordered;
    }
    if metrics.sign_flip_rate > 0.45 || metrics.p90_abs_delta > (1u64 << 32) as f64 {
        return Regime::Chaotic;
    }
    Regime::Mixed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing_is_ordered() {
        let values: Vec<i64> = (0..200).map(|i| i * 60).collect();
        let m = BlockMetrics::compute(&values);
        assert_eq!(classify(&m), Regime::Ordered);
    }

    #[test]
    fn constant_value_is_ordered_via_low_unique_delta_ratio() {
        let values = vec![7i64; 100];
        let m = BlockMetrics::compute(&values);
        assert_eq!(classify(&m), Regime::Ordered);
    }

    #[test]
    fn alternating_sign_is_chaotic() {
        let values: Vec<i64> = (0..200)
            .map(|i| if i % 2 == 0 { 1_000_000 } else { -1_000_000 })
            .collect();
        let m = BlockMetrics::compute(&values);
        assert_eq!(classify(&m), Regime::Chaotic);
    }

    #[test]
    fn huge_jump_is_chaotic_via_p90_threshold() {
        let mut values = vec![0i64; 50];
        values.push(1i64 << 40);
        values.extend(vec![0i64; 50]);
        let m = BlockMetrics::compute(&values);
        assert_eq!(classify(&m), Regime::Chaotic);
    }

    #[test]
    fn empty_block_metrics_do_not_panic() {
        let m = BlockMetrics::compute(&[]);
        assert_eq!(classify(&m), Regime::Ordered);
    }
}
