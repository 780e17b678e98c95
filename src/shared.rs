use crate::{
    config::Config,
    random::Random,
};

/// Bits coded so far, as seen by every component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitCursor {
    pub y:     u8,  // Last resolved bit
    pub c0:    u32, // Partial byte with a leading 1 (1..=255)
    pub bpos:  u8,  // Bits of the current byte seen so far (0..7)
    pub c1:    u8,  // Last whole byte
    pub c4:    u32, // Last 4 whole bytes, most recent in the low byte
}
impl Default for BitCursor {
    fn default() -> BitCursor {
        BitCursor {
            y:     0,
            c0:    1,
            bpos:  0,
            c1:    0,
            c4:    0,
        }
    }
}
impl BitCursor {
    /// Append a resolved bit.
    pub fn push(&mut self, y: u8) {
        debug_assert!(y <= 1);
        self.y = y;
        self.c0 = (self.c0 << 1) | y as u32;
        self.bpos = (self.bpos + 1) & 7;
        if self.bpos == 0 {
            self.c1 = self.c0 as u8;
            self.c4 = (self.c4 << 8) | self.c1 as u32;
            self.c0 = 1;
        }
    }
}

/// Per session state passed to every component. Replaces process wide
/// singletons: one Shared lives exactly as long as one session.
#[derive(Clone, Debug)]
pub struct Shared {
    pub cursor: BitCursor,
    pub rng:    Random,
}
impl Shared {
    pub fn new(cfg: &Config) -> Shared {
        Shared {
            cursor: BitCursor::default(),
            rng:    Random::new(cfg.seed),
        }
    }
}
