//! Anomaly routing state machine: OK → WARN → QUARANTINE → OK.
//!
//! Owned and driven by the encoder; it never reaches back into
//! [`crate::selector`] or [`crate::metrics`] — it only consumes the
//! `anomaly_score` and [`crate::selector::ProbeOutcome`] values those pure
//! components hand it. This keeps all WARN/QUARANTINE bookkeeping in one
//! place instead of scattering it across the codec selector and block
//! builder.

use crate::metrics::BlockMetrics;
use crate::selector::ProbeOutcome;

/// Current health of one routed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingState {
    Ok,
    Warn,
    Quarantine,
}

/// Per-block flags emitted alongside a block header. `ANOMALY_*` and
/// `HEALTH_*` are mutually exclusive within their own group, and
/// `HEALTH_WARN`/`HEALTH_QUAR` are never simultaneously set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthFlags {
    pub anomaly_start: bool,
    pub anomaly_mid: bool,
    pub anomaly_end: bool,
    pub health_warn: bool,
    pub health_quar: bool,
}

impl HealthFlags {
    pub fn to_bits(self) -> u8 {
        let mut bits = 0u8;
        if self.anomaly_start {
            bits |= 1 << 0;
        }
        if self.anomaly_mid {
            bits |= 1 << 1;
        }
        if self.anomaly_end {
            bits |= 1 << 2;
        }
        if self.health_warn {
            bits |= 1 << 3;
        }
        if self.health_quar {
            bits |= 1 << 4;
        }
        bits
    }

    pub fn from_bits(bits: u8) -> Self {
        HealthFlags {
            anomaly_start: bits & (1 << 0) != 0,
            anomaly_mid: bits & (1 << 1) != 0,
            anomaly_end: bits & (1 << 2) != 0,
            health_warn: bits & (1 << 3) != 0,
            health_quar: bits & (1 << 4) != 0,
        }
    }
}

/// `anomaly_score = max(sign_flip_rate, outlier_score, clamp(p90_abs_delta / 2^24, 0, 1))`.
pub fn anomaly_score(metrics: &BlockMetrics) -> f64 {
    let scaled_p90 = (metrics.p90_abs_delta / (1u64 << 24) as f64).clamp(0.0, 1.0);
    metrics
        .sign_flip_rate
        .max(metrics.outlier_score)
        .max(scaled_p90)
}

/// Drives one routed stream's OK/WARN/QUARANTINE lifecycle one block at a
/// time.
#[derive(Debug, Clone)]
pub struct RoutingMachine {
    state: RoutingState,
    consecutive_warn: u32,
    consecutive_successful_probes: u32,
}

impl RoutingMachine {
    pub fn new() -> Self {
        RoutingMachine {
            state: RoutingState::Ok,
            consecutive_warn: 0,
            consecutive_successful_probes: 0,
        }
    }

    pub fn state(&self) -> RoutingState {
        self.state
    }

    /// Feed one block's anomaly score through the state machine. Returns the
    /// flags to attach to that block's header.
    ///
    /// Must not be called for a block while QUARANTINE probing is in
    /// progress — see [`Self::observe_probe`] for that path.
    pub fn observe_block(&mut self, score: f64) -> HealthFlags {
        let mut flags = HealthFlags::default();
        match self.state {
            RoutingState::Ok => {
                if score > 0.5 {
                    self.state = RoutingState::Warn;
                    self.consecutive_warn = 1;
                    flags.anomaly_start = true;
                    flags.health_warn = true;
                } else {
                    self.consecutive_warn = 0;
                }
            }
            RoutingState::Warn => {
                if score > 0.5 {
                    self.consecutive_warn += 1;
                } else {
                    self.consecutive_warn = 0;
                }
                if self.consecutive_warn >= 2 || score > 0.85 {
                    self.state = RoutingState::Quarantine;
                    self.consecutive_successful_probes = 0;
                    flags.anomaly_mid = true;
                    flags.health_quar = true;
                } else {
                    flags.health_warn = true;
                }
            }
            RoutingState::Quarantine => {
                flags.anomaly_mid = true;
                flags.health_quar = true;
            }
        }
        flags
    }

    /// Feed one QUARANTINE-interval probe result through the state machine.
    /// Only meaningful while [`Self::state`] is [`RoutingState::Quarantine`].
    /// Returns the flags for the probed block; `anomaly_end` fires exactly
    /// on the block where the second consecutive successful probe lands.
    pub fn observe_probe(&mut self, probe: &ProbeOutcome) -> HealthFlags {
        debug_assert_eq!(self.state, RoutingState::Quarantine);
        let mut flags = HealthFlags {
            anomaly_mid: true,
            health_quar: true,
            ..HealthFlags::default()
        };
        if probe.succeeded() {
            self.consecutive_successful_probes += 1;
            if self.consecutive_successful_probes >= 2 {
                self.state = RoutingState::Ok;
                self.consecutive_warn = 0;
                self.consecutive_successful_probes = 0;
                flags = HealthFlags {
                    anomaly_end: true,
                    ..HealthFlags::default()
                };
            }
        } else {
            self.consecutive_successful_probes = 0;
        }
        flags
    }
}

impl Default for RoutingMachine {
    fn default() -> Self {
        Self::new()
    }
}
