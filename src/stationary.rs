use crate::{
    broadcaster::Component,
    logistic::stretch,
    mixer::Mixer,
    shared::Shared,
};

// Stationary Maps ---------------------------------------------------------------------------------------------------------- Stationary Maps
//
// Running averages with a fixed adaptation rate, for contexts whose
// statistics are assumed not to drift. Unlike counter cells they carry no
// count: every bit moves the probability by the same fraction.

/// Maps a context and the partial byte c0 to a 22 bit probability.
pub struct StationaryMap {
    data:   Vec<u32>,      // 2^bits contexts * 256 partial bytes
    mask:   usize,         // Context mask
    rate:   u32,           // Update shift (higher = slower)
    base:   usize,         // First cell of the current context
    index:  Option<usize>, // Cell to update
}
impl StationaryMap {
    /// Number of inputs added by mix().
    pub const INPUTS: usize = 2;

    pub fn new(bits: u32, rate: u32) -> StationaryMap {
        assert!(bits <= 24 && rate > 0 && rate < 22);
        StationaryMap {
            data:   vec![1 << 21; 256 << bits],
            mask:   (1 << bits) - 1,
            rate,
            base:   0,
            index:  None,
        }
    }
    /// Select the context for the bits of the next byte.
    pub fn set(&mut self, cxt: u32) {
        self.base = (cxt as usize & self.mask) << 8;
    }
    pub fn mix(&mut self, m: &mut Mixer, shared: &Shared) {
        let i = self.base + shared.cursor.c0 as usize;
        self.index = Some(i);
        let p = (self.data[i] >> 10) as i32;
        m.add(stretch(p) >> 2);
        m.add((p - 2048) >> 3);
    }
}
impl Component for StationaryMap {
    fn update(&mut self, shared: &mut Shared) {
        if let Some(i) = self.index.take() {
            let p = self.data[i] as i32;
            let target = (shared.cursor.y as i32) << 22;
            self.data[i] = (p + ((target - p) >> self.rate)).clamp(0, (1 << 22) - 1) as u32;
        }
    }
}

/// Directly indexed map of 16 bit probabilities.
pub struct SmallStationaryMap {
    data:   Vec<u16>,
    mask:   usize,
    rate:   u32,
    index:  Option<usize>,
}
impl SmallStationaryMap {
    pub const INPUTS: usize = 1;

    pub fn new(bits: u32, rate: u32) -> SmallStationaryMap {
        assert!(bits <= 24 && rate > 0 && rate < 16);
        SmallStationaryMap {
            data:   vec![1 << 15; 1 << bits],
            mask:   (1 << bits) - 1,
            rate,
            index:  None,
        }
    }
    /// Select the context for the next bit.
    pub fn set(&mut self, cxt: u32) {
        self.index = Some(cxt as usize & self.mask);
    }
    pub fn mix(&mut self, m: &mut Mixer) {
        match self.index {
            Some(i) => m.add(stretch((self.data[i] >> 4) as i32)),
            None => m.add(0),
        }
    }
}
impl Component for SmallStationaryMap {
    fn update(&mut self, shared: &mut Shared) {
        if let Some(i) = self.index.take() {
            let p = self.data[i] as i32;
            let target = (shared.cursor.y as i32) << 16;
            self.data[i] = (p + ((target - p) >> self.rate)).clamp(0, 65535) as u16;
        }
    }
}
// ----------------------------------------------------------------------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn stationary_map_learns_per_partial_byte() {
        let mut shared = Shared::new(&Config::default());
        let mut sm = StationaryMap::new(4, 4);
        sm.set(3);
        for _ in 0..200 {
            let mut m = Mixer::new(StationaryMap::INPUTS, &[1], 7);
            sm.mix(&mut m, &shared);
            m.set(0, 1);
            m.p();
            // Always a 1 after the leading bit; cursor stays at bit 0.
            shared.cursor.y = 1;
            sm.update(&mut shared);
        }
        let mut m = Mixer::new(StationaryMap::INPUTS, &[1], 7);
        sm.mix(&mut m, &shared);
        assert!(m.inputs()[0] > 400);
        assert!(m.inputs()[1] > 200);

        sm.set(4);
        let mut m = Mixer::new(StationaryMap::INPUTS, &[1], 7);
        sm.mix(&mut m, &shared);
        assert_eq!(m.inputs(), &[0, 0]);
    }

    #[test]
    fn small_map_moves_by_fixed_fraction() {
        let mut shared = Shared::new(&Config::default());
        let mut sm = SmallStationaryMap::new(8, 2);
        sm.set(9);
        shared.cursor.y = 0;
        sm.update(&mut shared);
        // 32768 - 32768/4
        assert_eq!(sm.data[9], 24576);

        let mut m = Mixer::new(1, &[1], 7);
        sm.mix(&mut m);
        assert_eq!(m.inputs(), &[0]);
    }
}
