use crate::{
    apm::{Apm, Apm1},
    broadcaster::{Prediction, UpdateBroadcaster},
    config::Config,
    context_map::ContextMap,
    context_map2::ContextMap2,
    error::ConfigError,
    hash::{combine, hash2},
    mixer::Mixer,
    shared::{BitCursor, Shared},
    stationary::{SmallStationaryMap, StationaryMap},
};

/// Order 1, 2, 3, 4, 6 and word contexts.
const ORDERS: usize = 6;
/// Current word and previous word contexts.
const WORD_CXTS: usize = 2;

const MIXER_INPUTS: usize =
    ORDERS * ContextMap2::INPUTS +
    WORD_CXTS * ContextMap::INPUTS +
    SmallStationaryMap::INPUTS +
    StationaryMap::INPUTS;

/// Components updated per bit: cm2, cm, order0, order1, mixer, 2 apms.
const PARTICIPANTS: usize = 7;

// Predictor -------------------------------------------------------------------------------------------------------------------- Predictor
pub struct Predictor {
    h:          [u64; ORDERS],      // Order 1, 2, 3, 4, 6, and Unigram Word contexts
    word:       u64,                // Hash of the current word, 0 between words
    prev_word:  u64,                // Hash of the last completed word
    cm2:        ContextMap2,        // Order-n and word bit histories
    cm:         ContextMap,         // Word position bit histories
    order0:     SmallStationaryMap, // Partial byte
    order1:     StationaryMap,      // Last byte and partial byte
    mxr:        Mixer,              // For weighted averaging of independent predictions
    apm1:       Apm1,               // Adaptive Probability Maps for refining Mixer output
    apm2:       Apm,                //
}
impl Predictor {
    pub fn new(cfg: &Config) -> Result<Predictor, ConfigError> {
        Ok(Predictor {
            h:          [0; ORDERS],
            word:       0,
            prev_word:  0,
            cm2:        ContextMap2::new(cfg.table_bytes(), ORDERS)?,
            cm:         ContextMap::new(cfg.word_table_bytes(), WORD_CXTS)?,
            order0:     SmallStationaryMap::new(8, 5),
            order1:     StationaryMap::new(8, 6),
            mxr:        Mixer::new(MIXER_INPUTS, &[256, 8, 32], 7),
            apm1:       Apm1::new(256, 7),
            apm2:       Apm::new(65_536, 24, 255),
        })
    }

    // Update order 1, 2, 3, 4, 6, and unigram word contexts
    fn update_cxts(&mut self, cur: &BitCursor) {
        let c1 = cur.c1;
        self.h[0] = c1 as u64;                         // Order 1
        self.h[1] = (cur.c4 & 0xFFFF) as u64;          // Order 2
        self.h[2] = (cur.c4 & 0xFF_FFFF) as u64;       // Order 3
        self.h[3] = cur.c4 as u64;                     // Order 4
        self.h[4] = self.h[4].wrapping_mul(11 << 5)    // Order 6
                    .wrapping_add(c1 as u64 * 13) & 0x3FFF_FFFF;

        if c1.is_ascii_alphabetic() { // Unigram Word Order
            self.word = combine(self.word, c1.to_ascii_lowercase()); // Fold to lowercase
        }
        else {
            if self.word != 0 {
                self.prev_word = self.word;
            }
            self.word = 0;
        }
        self.h[5] = self.word;
    }

    /// Predict phase: the probability that the next bit is 1, and the
    /// components that must learn the bit.
    pub fn predict<'a>(&'a mut self, shared: &Shared) -> Prediction<'a> {
        let cur = shared.cursor;
        if cur.bpos == 0 {
            self.update_cxts(&cur);
            for i in 0..ORDERS {
                self.cm2.set(self.h[i]);
            }
            if self.word != 0 {
                self.cm.set(self.word);
                self.cm.set(hash2(self.prev_word, self.word));
            }
            else {
                self.cm.skip();
                self.cm.skip();
            }
            self.order1.set(cur.c1 as u32);
        }
        self.order0.set(cur.c0);

        let Predictor { cm2, cm, order0, order1, mxr, apm1, apm2, .. } = self;

        // Add independent predictions to mixer
        cm2.mix(mxr, shared);
        cm.mix(mxr, shared);
        order0.mix(mxr);
        order1.mix(mxr, shared);

        // Set weights to be used during mixing
        mxr.set(cur.c0 as usize, 256);
        mxr.set(cm2.order(), 8);
        mxr.set(cm2.state_group(1), 32);

        // Mix
        let mut pr = mxr.p();

        // 2 SSE stages
        pr = (pr + 3 * apm1.p(pr, cur.c0 as usize)) >> 2;
        pr = (pr + 3 * apm2.p(pr, (cur.c0 | (cur.c1 as u32) << 8) as usize)) >> 2;

        let mut participants = UpdateBroadcaster::with_capacity(PARTICIPANTS);
        participants.subscribe(cm2);
        participants.subscribe(cm);
        participants.subscribe(order0);
        participants.subscribe(order1);
        participants.subscribe(mxr);
        participants.subscribe(apm1);
        participants.subscribe(apm2);
        Prediction::new(pr, participants)
    }
}
// ----------------------------------------------------------------------------------------------------------------------------------------
