use crate::{
    broadcaster::Component,
    logistic::squash,
    shared::Shared,
};

// Mixer ---------------------------------------------------------------------------------------------------------------------------- Mixer

const MAX_WEIGHT: i32 = 1 << 20;

fn train(inputs: &[i32], weights: &mut [i32], error: i32) {
    for (input, weight) in inputs.iter().zip(weights.iter_mut()) {
        *weight = (*weight + (((*input * error) + 0x8000) >> 16))
            .clamp(-MAX_WEIGHT, MAX_WEIGHT);
    }
}
fn dot_product(inputs: &[i32], weights: &[i32]) -> i32 {
    let dot = inputs.iter().zip(weights.iter())
        .map(|(i, w)| *i as i64 * *w as i64).sum::<i64>() >> 16;
    dot.clamp(-2047, 2047) as i32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Collecting, // Accepting inputs and context selections
    Predicted,  // p() was called, waiting for the bit
}

/// Combines stretched predictions by weighted summation, learning the
/// weights online. Weights are organized in context sets: each set holds
/// one weight row per context value and selects one row per bit. With a
/// single set the selected row produces the prediction directly; with
/// several, each selected row produces a prediction and a final weight
/// vector mixes those.
#[derive(Clone, Debug)]
pub struct Mixer {
    max_in:    usize,         // Maximum number of inputs
    inputs:    Vec<i32>,      // Current inputs
    sizes:     Vec<usize>,    // Declared size of each context set
    offsets:   Vec<usize>,    // First weight row of each context set
    weights:   Vec<i32>,      // Weight rows, max_in weights each
    selected:  Vec<usize>,    // Row selected by each set this bit
    outputs:   Vec<i32>,      // Stretched output of each selected row
    prs:       Vec<i32>,      // Squashed output of each selected row
    final_w:   Vec<i32>,      // Weights of the final layer
    rate:      i32,           // Learning rate (1..=8)
    pr:        i32,           // Current prediction
    phase:     Phase,
}
impl Mixer {
    pub fn new(n: usize, sizes: &[usize], rate: i32) -> Mixer {
        assert!(n > 0 && !sizes.is_empty());
        assert!(rate > 0 && rate <= 8);
        let mut offsets = Vec::with_capacity(sizes.len());
        let mut rows = 0;
        for &size in sizes {
            assert!(size > 0);
            offsets.push(rows);
            rows += size;
        }
        Mixer {
            max_in:    n,
            inputs:    Vec::with_capacity(n),
            sizes:     sizes.to_vec(),
            offsets,
            weights:   vec![0; rows * n],
            selected:  Vec::with_capacity(sizes.len()),
            outputs:   vec![0; sizes.len()],
            prs:       vec![2048; sizes.len()],
            final_w:   vec![65_536 / sizes.len() as i32; sizes.len()],
            rate,
            pr:        2048,
            phase:     Phase::Collecting,
        }
    }

    /// Append a stretched prediction.
    pub fn add(&mut self, x: i32) {
        debug_assert!(self.phase == Phase::Collecting, "Mixer::add called after Mixer::p");
        debug_assert!((-2047..=2047).contains(&x), "input {} out of range", x);
        assert!(self.inputs.len() < self.max_in, "too many mixer inputs");
        self.inputs.push(x);
    }

    /// Select weight row cxt of the next context set, whose declared
    /// size must be `size`. Sets are selected in declaration order.
    pub fn set(&mut self, cxt: usize, size: usize) {
        debug_assert!(self.phase == Phase::Collecting, "Mixer::set called after Mixer::p");
        let set = self.selected.len();
        assert!(set < self.sizes.len(), "too many context sets");
        debug_assert_eq!(size, self.sizes[set]);
        assert!(cxt < self.sizes[set], "context {} out of range", cxt);
        self.selected.push(self.offsets[set] + cxt);
    }

    /// Probability that the next bit is 1. Call once per bit, after every
    /// add() and set().
    pub fn p(&mut self) -> i32 {
        debug_assert!(self.phase == Phase::Collecting, "Mixer::p called twice");
        assert_eq!(self.selected.len(), self.sizes.len(), "context set not selected");
        let n = self.max_in;

        for (s, &row) in self.selected.iter().enumerate() {
            let w = &self.weights[row * n..row * n + n];
            self.outputs[s] = dot_product(&self.inputs, w);
            self.prs[s] = squash(self.outputs[s]);
        }
        self.pr = if self.sizes.len() == 1 {
            self.prs[0]
        }
        else {
            squash(dot_product(&self.outputs, &self.final_w))
        };
        self.phase = Phase::Predicted;
        self.pr
    }

    /// Inputs added since the last update.
    pub fn inputs(&self) -> &[i32] {
        &self.inputs
    }

    pub fn max_inputs(&self) -> usize {
        self.max_in
    }
}
impl Component for Mixer {
    fn update(&mut self, shared: &mut Shared) {
        debug_assert!(self.phase == Phase::Predicted, "Mixer updated without a prediction");
        let bit = shared.cursor.y as i32;
        let n = self.max_in;

        for (s, &row) in self.selected.iter().enumerate() {
            let error: i32 = ((bit << 12) - self.prs[s]) * self.rate;
            debug_assert!((-32768..32768).contains(&error));
            train(&self.inputs, &mut self.weights[row * n..row * n + n], error);
        }
        if self.sizes.len() > 1 {
            let error: i32 = ((bit << 12) - self.pr) * self.rate;
            train(&self.outputs, &mut self.final_w, error);
        }
        self.inputs.clear();
        self.selected.clear();
        self.phase = Phase::Collecting;
    }
}
// ----------------------------------------------------------------------------------------------------------------------------------------
