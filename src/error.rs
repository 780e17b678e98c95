use std::io;
use thiserror::Error;

/// Errors returned while configuring a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is outside the valid range of memory levels (0..9)")]
    InvalidLevel(u8),

    #[error("table size of {0} bytes is not a power of two multiple of a bucket")]
    InvalidTableSize(usize),
}

/// Errors that end a compression or decompression session.
#[derive(Debug, Error)]
pub enum Error {
    #[error("stream error: {0}")]
    Io(#[from] io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
