//! Compile-time resource caps and runtime encoder/decoder configuration.
//!
//! The caps in this module are hard limits enforced throughout the crate;
//! exceeding any of them is a [`crate::error::GicsError::LimitExceeded`].

/// Maximum number of items in a single block.
pub const MAX_BLOCK_ITEMS: u32 = 10_000;

/// Maximum run length representable by a single RLE pair.
pub const MAX_RLE_RUN: u32 = 2_000;

/// Hard cap on a segment's uncompressed payload size. The *target* size at
/// which the encoder proactively closes a segment is configurable and much
/// smaller by default — see [`EncoderConfig::segment_size_limit`].
pub const MAX_SEGMENT_UNCOMPRESSED: u64 = 16 * 1024 * 1024;

/// Soft cap on the total decoded size of a file; configurable per decoder.
pub const MAX_FILE_DECODE_DEFAULT: u64 = 2 * 1024 * 1024 * 1024;

/// Default segment size target (bytes of uncompressed payload) at which the
/// encoder closes the current segment.
pub const DEFAULT_SEGMENT_SIZE_LIMIT: u64 = 1024 * 1024;

/// Whether the VALUE stream's `DICT_VARINT` path learns from a shared
/// [`crate::context::DictContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMode {
    On,
    Off,
}

impl Default for ContextMode {
    fn default() -> Self {
        ContextMode::Off
    }
}

/// Outer (segment-level) compression codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OuterCodec {
    None,
    Zstd,
}

impl Default for OuterCodec {
    fn default() -> Self {
        OuterCodec::Zstd
    }
}

/// Encoder-side configuration. Construct via a preset
/// ([`EncoderConfig::balanced`], [`EncoderConfig::max_ratio`],
/// [`EncoderConfig::low_latency`]) and override individual fields — matches
/// the struct-of-knobs shape the codec's preferences use throughout this
/// crate rather than a string-keyed options map.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub context_mode: ContextMode,
    /// How many blocks elapse, while quarantined, between recovery probes.
    pub probe_interval: u32,
    /// Target uncompressed payload size (bytes) at which a segment closes.
    pub segment_size_limit: u64,
    /// Outer codec applied per segment.
    pub outer_codec: OuterCodec,
    /// Zstd compression level (only meaningful when `outer_codec == Zstd`).
    pub compression_level: i32,
    /// Maximum items accumulated per stream before a block is cut.
    pub block_size: u32,
    /// Optional password; when set, segments are AES-256-GCM encrypted.
    pub password: Option<String>,
    /// Caller-supplied identifier for the shared dictionary in use, written
    /// into the header when `context_mode == On`.
    pub context_id: Option<String>,
}

impl EncoderConfig {
    /// Balanced preset: level 3, 1000-item blocks.
    pub fn balanced() -> Self {
        EncoderConfig {
            context_mode: ContextMode::Off,
            probe_interval: 4,
            segment_size_limit: DEFAULT_SEGMENT_SIZE_LIMIT,
            outer_codec: OuterCodec::Zstd,
            compression_level: 3,
            block_size: 1000,
            password: None,
            context_id: None,
        }
    }

    /// Max-ratio preset: level 9, 4000-item blocks.
    pub fn max_ratio() -> Self {
        EncoderConfig {
            compression_level: 9,
            block_size: 4000,
            ..Self::balanced()
        }
    }

    /// Low-latency preset: level 1, 512-item blocks.
    pub fn low_latency() -> Self {
        EncoderConfig {
            compression_level: 1,
            block_size: 512,
            ..Self::balanced()
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Decoder integrity-check strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityMode {
    /// Fail on any CRC/chain/auth mismatch.
    Strict,
    /// Surface a warning and continue. Never used by the `verify()` path,
    /// which always fails closed.
    Warn,
}

impl Default for IntegrityMode {
    fn default() -> Self {
        IntegrityMode::Strict
    }
}

/// Decoder-side configuration.
#[derive(Debug, Clone, Default)]
pub struct DecoderConfig {
    pub integrity_mode: IntegrityMode,
    pub password: Option<String>,
    /// Soft cap on total decoded bytes; `None` uses [`MAX_FILE_DECODE_DEFAULT`].
    pub max_file_decode: Option<u64>,
}

impl DecoderConfig {
    pub fn max_file_decode(&self) -> u64 {
        self.max_file_decode.unwrap_or(MAX_FILE_DECODE_DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_override_only_their_documented_fields() {
        let balanced = EncoderConfig::balanced();
        let max_ratio = EncoderConfig::max_ratio();
        let low_latency = EncoderConfig::low_latency();

        assert_eq!(balanced.compression_level, 3);
        assert_eq!(balanced.block_size, 1000);
        assert_eq!(max_ratio.compression_level, 9);
        assert_eq!(max_ratio.block_size, 4000);
        assert_eq!(low_latency.compression_level, 1);
        assert_eq!(low_latency.block_size, 512);

        // Shared fields stay identical across presets.
        assert_eq!(balanced.segment_size_limit, max_ratio.segment_size_limit);
        assert_eq!(balanced.probe_interval, low_latency.probe_interval);
    }

    #[test]
    fn explicit_fields_override_preset_values() {
        let cfg = EncoderConfig {
            block_size: 256,
            ..EncoderConfig::max_ratio()
        };
        assert_eq!(cfg.block_size, 256);
        assert_eq!(cfg.compression_level, 9);
    }
}
