//! The encoder driver: owns the stream buffers, drives the block builder,
//! CHM, and routing state machine, and assembles segments into the final
//! file.
//!
//! Single-threaded and non-suspending: `add_snapshot` only ever touches
//! in-memory buffers. An error poisons the instance — every later call
//! (including `finish`) returns the same error, mirroring how a C API
//! would latch a fatal errno rather than leave the caller to guess whether
//! partial output is usable.

use crate::codec;
use crate::config::{ContextMode, EncoderConfig};
use crate::context::DictContext;
use crate::crypto;
use crate::error::{GicsError, Result};
use crate::header::{EncryptionExtension, FileFlags, FileHeader};
use crate::integrity::{self, HashChain};
use crate::metrics::{self, BlockMetrics};
use crate::routing::{HealthFlags, RoutingMachine, RoutingState};
use crate::segment::{self, SegmentCrypto};
use crate::selector;
use crate::stream::{Snapshot, StreamBuffers, StreamId};

use crate::block::Block;
use crate::config::MAX_SEGMENT_UNCOMPRESSED;

/// Streaming, single-threaded encoder. See the module docs above.
pub struct Encoder {
    config: EncoderConfig,
    buffers: StreamBuffers,
    dict: DictContext,
    value_routing: RoutingMachine,
    blocks_since_quarantine: u32,
    segments: Vec<Vec<u8>>,
    hash_chain: HashChain,
    current_segment: Vec<u8>,
    segment_index: u64,
    file_salt: Option<[u8; crypto::SALT_LEN]>,
    key: Option<[u8; crypto::KEY_LEN]>,
    poisoned: Option<GicsError>,
}

impl Encoder {
    /// Construct a new encoder with a fresh, private `DICT_VARINT`
    /// dictionary.
    pub fn new(config: EncoderConfig) -> Result<Self> {
        Self::with_dict_context(config, DictContext::new())
    }

    /// Construct a new encoder that threads an existing [`DictContext`] —
    /// the way callers realize "shared dictionary across encoders" without
    /// any global state (see `DESIGN.md`, "Shared mutable dictionary").
    pub fn with_dict_context(config: EncoderConfig, dict: DictContext) -> Result<Self> {
        if !(256..=16_384).contains(&config.block_size) {
            return Err(GicsError::other(format!(
                "block_size {} out of range [256, 16384]",
                config.block_size
            )));
        }
        if config.segment_size_limit > MAX_SEGMENT_UNCOMPRESSED {
            return Err(GicsError::limit(format!(
                "segment_size_limit {} exceeds MAX_SEGMENT_UNCOMPRESSED {}",
                config.segment_size_limit, MAX_SEGMENT_UNCOMPRESSED
            )));
        }

        let (file_salt, key) = if let Some(password) = &config.password {
            let salt = crypto::random_salt();
            let key = crypto::derive_key(password, &salt);
            (Some(salt), Some(key))
        } else {
            (None, None)
        };

        Ok(Encoder {
            config,
            buffers: StreamBuffers::new(),
            dict,
            value_routing: RoutingMachine::new(),
            blocks_since_quarantine: 0,
            segments: Vec::new(),
            hash_chain: HashChain::new(),
            current_segment: Vec::new(),
            segment_index: 0,
            file_salt,
            key,
            poisoned: None,
        })
    }

    /// Read-only access to the dictionary context, for callers that want to
    /// thread it into a later encoder or decoder.
    pub fn dict_context(&self) -> &DictContext {
        &self.dict
    }

    fn effective_block_size(&self) -> usize {
        (self.config.block_size as usize).min(crate::config::MAX_BLOCK_ITEMS as usize)
    }

    fn check_poisoned(&self) -> Result<()> {
        match &self.poisoned {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Project `snapshot` onto the six stream buffers and emit any blocks
    /// that are now full. Never touches I/O.
    pub fn add_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.check_poisoned()?;
        let result = self.try_add_snapshot(snapshot);
        if let Err(e) = &result {
            self.poisoned = Some(e.clone());
        }
        result
    }

    fn try_add_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.buffers.push_snapshot(snapshot);
        self.drain_blocks(false)?;
        if self.current_segment.len() as u64 >= self.config.segment_size_limit {
            self.seal_current_segment()?;
        }
        Ok(())
    }

    /// Closes the current segment early. Useful for streaming: everything
    /// buffered so far becomes durable, recoverable output.
    pub fn flush(&mut self) -> Result<()> {
        self.check_poisoned()?;
        let result = self.try_flush();
        if let Err(e) = &result {
            self.poisoned = Some(e.clone());
        }
        result
    }

    fn try_flush(&mut self) -> Result<()> {
        self.drain_blocks(true)?;
        self.seal_current_segment()?;
        Ok(())
    }

    /// Drain every stream's buffer in fixed flush order. With
    /// `allow_partial = false`, only emits blocks once a stream has
    /// accumulated a full `block_size` slice; with `true`, also emits a
    /// final short block for whatever remains.
    fn drain_blocks(&mut self, allow_partial: bool) -> Result<()> {
        let block_size = self.effective_block_size();
        for stream in StreamId::FLUSH_ORDER {
            loop {
                let buffered = self.buffers.buffered(stream);
                if buffered == 0 {
                    break;
                }
                if buffered < block_size && !allow_partial {
                    break;
                }
                let n = buffered.min(block_size);
                let slice = self.buffers.drain_up_to(stream, n);
                self.emit_block(stream, &slice)?;
            }
        }
        Ok(())
    }

    fn is_quarantined_for(&self, stream: StreamId) -> bool {
        matches!(stream, StreamId::Value | StreamId::Quantity)
            && self.value_routing.state() == RoutingState::Quarantine
    }

    fn emit_block(&mut self, stream: StreamId, values: &[i64]) -> Result<()> {
        let metrics = BlockMetrics::compute(values);
        let regime = metrics::classify(&metrics);
        let quarantined = self.is_quarantined_for(stream);
        let codec = selector::select(stream, regime, self.config.context_mode, quarantined);

        let flags = if stream == StreamId::Value {
            self.route_value_block(&metrics, regime, values)
        } else {
            HealthFlags::default()
        };

        let payload = codec::encode(codec, values, &mut self.dict);
        if payload.len() > (crate::config::MAX_BLOCK_ITEMS as usize) * 8 {
            return Err(GicsError::limit("block payload exceeds MAX_BLOCK_ITEMS * 8 bytes"));
        }

        let block = Block {
            stream_id: stream,
            codec_id: codec,
            n_items: values.len() as u32,
            flags,
            payload,
        };
        block.write_to(&mut self.current_segment);
        Ok(())
    }

    /// Drives the VALUE stream's anomaly routing: either scores a normal
    /// block (OK/WARN states) or, while QUARANTINE is active, runs a probe
    /// every `probe_interval` blocks.
    fn route_value_block(
        &mut self,
        metrics: &BlockMetrics,
        regime: crate::metrics::Regime,
        values: &[i64],
    ) -> HealthFlags {
        if self.value_routing.state() == RoutingState::Quarantine {
            self.blocks_since_quarantine += 1;
            if self.blocks_since_quarantine % self.config.probe_interval == 0 {
                let probe = selector::run_probe(
                    StreamId::Value,
                    regime,
                    self.config.context_mode,
                    values,
                    &self.dict,
                );
                let flags = self.value_routing.observe_probe(&probe);
                if self.value_routing.state() == RoutingState::Ok {
                    self.blocks_since_quarantine = 0;
                }
                flags
            } else {
                HealthFlags {
                    anomaly_mid: true,
                    health_quar: true,
                    ..HealthFlags::default()
                }
            }
        } else {
            let score = crate::routing::anomaly_score(metrics);
            let flags = self.value_routing.observe_block(score);
            if self.value_routing.state() == RoutingState::Quarantine {
                self.blocks_since_quarantine = 0;
            }
            flags
        }
    }

    fn seal_current_segment(&mut self) -> Result<()> {
        if self.current_segment.is_empty() {
            return Ok(());
        }
        if self.current_segment.len() as u64 > MAX_SEGMENT_UNCOMPRESSED {
            return Err(GicsError::limit(format!(
                "segment uncompressed size {} exceeds MAX_SEGMENT_UNCOMPRESSED {}",
                self.current_segment.len(),
                MAX_SEGMENT_UNCOMPRESSED
            )));
        }

        let crypto_ctx = match (&self.key, &self.file_salt) {
            (Some(key), Some(salt)) => Some(SegmentCrypto {
                key,
                file_salt: salt,
            }),
            _ => None,
        };

        let sealed = segment::write_segment(
            &self.current_segment,
            self.segment_index,
            self.config.outer_codec,
            self.config.compression_level,
            crypto_ctx,
        )?;
        // The chain covers the whole on-wire segment record, the same bytes
        // `write_segment` just produced — chain `sealed` directly rather
        // than re-deriving a narrower slice of it.
        self.hash_chain.update(&sealed);

        self.segments.push(sealed);
        self.segment_index += 1;
        self.current_segment.clear();
        Ok(())
    }

    /// Flushes any buffered data, closes the final segment, and returns the
    /// complete encoded file.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if let Some(e) = &self.poisoned {
            return Err(e.clone());
        }
        self.try_flush()?;

        let mut flags = FileFlags {
            context_enabled: self.config.context_mode == ContextMode::On,
            outer_zstd: self.config.outer_codec == crate::config::OuterCodec::Zstd,
            ..FileFlags::default()
        };
        let encryption = match (&self.file_salt, &self.key) {
            (Some(salt), Some(key)) => {
                flags.encrypted = true;
                Some(EncryptionExtension {
                    file_salt: *salt,
                    auth_verify: integrity::compute_auth_verify(key),
                })
            }
            _ => None,
        };
        let context_id = if flags.context_enabled {
            self.config.context_id.clone()
        } else {
            None
        };

        let header = FileHeader {
            flags,
            context_id,
            encryption,
            schema: None,
        };

        let mut out = Vec::new();
        header.write_to(&mut out);
        for segment in &self.segments {
            out.extend_from_slice(segment);
        }
        out.push(segment::EOS_TAG);
        out.extend_from_slice(&(self.segments.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.hash_chain.root());
        Ok(out)
    }
}
