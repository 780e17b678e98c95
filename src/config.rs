use std::fmt;

use crate::error::ConfigError;

/// Highest memory level.
pub const MAX_LEVEL: u8 = 9;

/// Session parameters. A compressed stream can only be decoded by a
/// session built from an equal Config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub level: u8,  // Memory level, sizes every table (0..=9)
    pub seed:  u64, // Seed of the bit history random stream
}
impl Default for Config {
    fn default() -> Config {
        Config {
            level: 2,
            seed:  0x5EED,
        }
    }
}
impl Config {
    /// Create a new Config with default level and seed.
    pub fn new() -> Config {
        Config::default()
    }

    /// Choose memory level (0..=9).
    pub fn level(mut self, level: u8) -> Result<Config, ConfigError> {
        if level > MAX_LEVEL {
            return Err(ConfigError::InvalidLevel(level));
        }
        self.level = level;
        Ok(self)
    }

    /// Choose bit history random seed.
    pub fn seed(mut self, seed: u64) -> Config {
        self.seed = seed;
        self
    }

    /// Size in bytes of the order-n context map.
    pub fn table_bytes(&self) -> usize {
        1 << (18 + self.level as usize)
    }

    /// Size in bytes of the word context map.
    pub fn word_table_bytes(&self) -> usize {
        self.table_bytes() / 4
    }
}
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "
            \r=======================================================================
            \r Level:       {} ({} KiB order-n, {} KiB word)
            \r Seed:        {:#x}
            \r=======================================================================",
            self.level,
            self.table_bytes() >> 10,
            self.word_table_bytes() >> 10,
            self.seed,
        )
    }
}
