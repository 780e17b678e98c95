//! Context-mixing compression engine.
//!
//! Bits are predicted by a set of context models whose outputs are
//! combined by a gated neural mixer, refined by adaptive probability maps,
//! and coded with a binary arithmetic coder. Every bit is handled in two
//! phases: predict, then, once the bit is known, update every component
//! that took part in the prediction.
//!
//! ```no_run
//! use ctxmix::Config;
//!
//! let cfg = Config::new().level(3)?.seed(7);
//! let packed = ctxmix::compress(b"hello hello hello", &cfg)?;
//! let unpacked = ctxmix::decompress(&packed, 17, &cfg)?;
//! assert_eq!(unpacked, b"hello hello hello");
//! # Ok::<(), ctxmix::Error>(())
//! ```

pub mod adaptive_map;
pub mod apm;
pub mod broadcaster;
pub mod bucket;
pub mod config;
pub mod context_map;
pub mod context_map2;
pub mod encoder;
pub mod error;
pub mod hash;
pub mod hash_table;
pub mod logistic;
pub mod mixer;
pub mod predictor;
pub mod random;
pub mod session;
pub mod shared;
pub mod state_map;
pub mod state_table;
pub mod stationary;
pub mod stream;
pub mod tables;

pub use crate::{
    config::Config,
    encoder::Mode,
    error::{ConfigError, Error, Result},
    session::Session,
    stream::{ByteRead, ByteSeek, ByteWrite},
};

/// Compress `data` into a new buffer.
pub fn compress(data: &[u8], cfg: &Config) -> Result<Vec<u8>> {
    let mut session = Session::compressor(cfg, Vec::new())?;
    session.compress(data)?;
    session.finish()
}

/// Decompress `len` bytes from `data`. `cfg` must equal the Config used
/// to compress.
pub fn decompress(data: &[u8], len: usize, cfg: &Config) -> Result<Vec<u8>> {
    let mut session = Session::decompressor(cfg, data)?;
    session.decompress(len)
}
