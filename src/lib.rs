//! GICS — columnar, adaptive compression for time-series snapshots.
//!
//! A [`Snapshot`] is a timestamp plus a set of `(item_id, price, quantity)`
//! tuples. [`Encoder`] projects a sequence of snapshots onto six columnar
//! streams, picks an inner codec per stream-block from a deterministic
//! regime classifier, and assembles the result into CRC32- and
//! SHA-256-chained segments, optionally AES-256-GCM encrypted.
//! [`Decoder`] verifies and reconstructs the original sequence.
//!
//! ```no_run
//! use gics::{Encoder, EncoderConfig, Snapshot, Decoder, DecoderConfig};
//!
//! let mut encoder = Encoder::new(EncoderConfig::balanced()).unwrap();
//! let mut snapshot = Snapshot::new(1_700_000_000);
//! snapshot.push(1, 42_00, 10);
//! encoder.add_snapshot(&snapshot).unwrap();
//! let bytes = encoder.finish().unwrap();
//!
//! let mut decoder = Decoder::new(bytes, DecoderConfig::default());
//! assert!(decoder.verify());
//! let roundtripped = decoder.unpack_all().unwrap();
//! assert_eq!(roundtripped.len(), 1);
//! ```

mod block;
mod codec;
mod config;
mod context;
mod crypto;
mod decoder;
mod encoder;
mod error;
mod header;
mod integrity;
mod metrics;
mod outer;
mod routing;
mod segment;
mod selector;
mod stream;
mod varint;

pub use block::Block;
pub use config::{
    ContextMode, DecoderConfig, EncoderConfig, IntegrityMode, OuterCodec, MAX_BLOCK_ITEMS,
    MAX_FILE_DECODE_DEFAULT, MAX_RLE_RUN, MAX_SEGMENT_UNCOMPRESSED,
};
pub use context::DictContext;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{GicsError, Result};
pub use metrics::{BlockMetrics, Regime};
pub use routing::{HealthFlags, RoutingState};
pub use stream::{Item, Snapshot, StreamId};

pub use codec::CodecId;
