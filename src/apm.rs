use crate::{
    adaptive_map::{cell, AdaptiveMap},
    broadcaster::Component,
    logistic::{squash, stretch},
    shared::Shared,
};

// Adaptive Probability Maps ------------------------------------------------------------------------------------ Adaptive Probability Maps
//
// An APM refines a probability given a context. The input probability is
// stretched and quantized into buckets, evenly spaced in the stretched
// domain (so denser near 0 and 1), and the output is interpolated between
// the two buckets surrounding it. Each context has its own row of buckets,
// initialized to the identity mapping.

/// APM with 33 buckets per context and a fixed shift rate.
pub struct Apm1 {
    bin:       Option<usize>, // Lower bucket of last prediction
    num_cxts:  usize,         // Number of possible contexts i.e 256 for order-0
    rate:      i32,           // Update shift (higher = slower)
    bin_map:   Vec<u16>,      // 16 bit probabilities, 33 per context
}
impl Apm1 {
    pub fn new(n: usize, rate: i32) -> Apm1 {
        assert!(rate > 0 && rate < 16);
        let row = (0..33).map(|i| (squash((i - 16) * 128) * 16) as u16);
        Apm1 {
            bin:       None,
            num_cxts:  n,
            rate,
            bin_map:   row.cycle().take(n * 33).collect(),
        }
    }
    pub fn p(&mut self, pr: i32, cxt: usize) -> i32 {
        assert!((0..4096).contains(&pr));
        assert!(cxt < self.num_cxts);

        let pr = stretch(pr);  // -2047 to 2047
        let i_w = pr & 127;    // Interpolation weight (33 points)

        let bin = (((pr + 2048) >> 7) as usize) + cxt * 33;
        self.bin = Some(bin);

        let l = self.bin_map[bin] as i32;   // Lower bin
        let u = self.bin_map[bin+1] as i32; // Upper bin
        ((l * (128 - i_w)) + (u * i_w)) >> 11
    }
}
impl Component for Apm1 {
    fn update(&mut self, shared: &mut Shared) {
        let bin = match self.bin.take() {
            Some(bin) => bin,
            None => return,
        };
        let bit = shared.cursor.y as i32;
        let rate = self.rate;

        // Target: 65535 + small margin for bit 1, 0 for bit 0
        let g: i32 = (bit << 16) + (bit << rate) - bit - bit;

        for b in [bin, bin + 1] {
            let v = self.bin_map[b] as i32;
            self.bin_map[b] = (v + ((g - v) >> rate)).clamp(0, 65535) as u16;
        }
    }
}

/// APM with a configurable number of buckets per context, built on
/// counter cells so buckets adapt quickly at first. Only the bucket
/// nearer to the input learns.
pub struct Apm {
    map:    AdaptiveMap,   // n * steps counters
    n:      usize,         // Number of contexts
    steps:  usize,         // Buckets per context
    index:  Option<usize>, // Bucket to update
}
impl Apm {
    pub fn new(n: usize, steps: usize, limit: usize) -> Apm {
        assert!(steps > 1);
        let mut map = AdaptiveMap::new(n * steps, limit);
        for i in 0..n * steps {
            let j = (i % steps) as i32;
            let d = j * 4096 / (steps as i32 - 1) - 2048;
            map.set(i, cell(squash(d) as u32, 6u32.min(limit as u32)));
        }
        Apm {
            map,
            n,
            steps,
            index: None,
        }
    }
    pub fn p(&mut self, pr: i32, cxt: usize) -> i32 {
        assert!((0..4096).contains(&pr));
        assert!(cxt < self.n);

        let s = ((stretch(pr) + 2048) * (self.steps as i32 - 1)) as u32;
        let w = s & 0xFFF;
        let lo = (s >> 12) as usize + cxt * self.steps;
        self.index = Some(lo + (w >> 11) as usize);

        let l = self.map.p16(lo);
        let u = self.map.p16(lo + 1);
        ((l * (4096 - w) + u * w) >> 16) as i32
    }
}
impl Component for Apm {
    fn update(&mut self, shared: &mut Shared) {
        if let Some(i) = self.index.take() {
            self.map.update(i, shared.cursor.y);
        }
    }
}
// ----------------------------------------------------------------------------------------------------------------------------------------
