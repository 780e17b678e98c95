use crate::{
    adaptive_map::{cell, AdaptiveMap},
    broadcaster::Component,
    shared::Shared,
    state_table,
};

// State Map -------------------------------------------------------------------------------------------------------------------- State Map

/// Initial contents of a StateMap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateMapMode {
    /// Every context starts at p = 0.5.
    Generic,
    /// Context is a bit history state (context mod 256); starts at the
    /// state's own estimate (n1 + 1/2)/(n + 1).
    BitHistory,
    /// Context is (run strength << 1 | expected bit), run strength taken
    /// mod 16; starts at 1 - 1/(run + 2) in favour of the expected bit.
    Run,
}

/// A StateMap maps a context to a probability. It holds several context
/// sets of n counters each; each set may select one counter per bit, and
/// every selected counter learns from the bit once it is known.
#[derive(Clone, Debug)]
pub struct StateMap {
    map:  AdaptiveMap,        // sets * n counters
    n:    usize,              // Contexts per set
    cxt:  Vec<Option<usize>>, // Counter selected by each set this bit
}
impl StateMap {
    pub fn new(sets: usize, n: usize, limit: usize, mode: StateMapMode) -> StateMap {
        let mut map = AdaptiveMap::new(sets * n, limit);
        for i in 0..sets * n {
            let cx = i % n;
            let p = match mode {
                StateMapMode::Generic => 2048,
                StateMapMode::BitHistory => {
                    let (n0, n1) = state_table::counts(cx as u8);
                    let (n0, n1) = (n0 as u32, n1 as u32);
                    (n1 * 2 + 1) * 4096 / ((n0 + n1) * 2 + 2)
                }
                StateMapMode::Run => {
                    let run = ((cx >> 1) & 15) as u32;
                    let correct = 4096 - 4096 / (run + 2);
                    if cx & 1 == 1 { correct } else { 4096 - correct }
                }
            };
            map.set(i, cell(p.clamp(1, 4095), 0));
        }
        StateMap {
            map,
            n,
            cxt: vec![None; sets],
        }
    }

    /// Prediction of context cx in set 0.
    #[inline]
    pub fn p1(&mut self, cx: usize) -> i32 {
        self.p2(0, cx)
    }

    /// Prediction of context cx in a given set. The counter learns from
    /// the next update.
    #[inline]
    pub fn p2(&mut self, set: usize, cx: usize) -> i32 {
        assert!(cx < self.n, "context {} out of range", cx);
        let i = set * self.n + cx;
        self.cxt[set] = Some(i);
        self.map.p(i)
    }

    /// Exclude a set from the next update.
    #[inline]
    pub fn skip(&mut self, set: usize) {
        self.cxt[set] = None;
    }

    pub fn sets(&self) -> usize {
        self.cxt.len()
    }
}
impl Component for StateMap {
    fn update(&mut self, shared: &mut Shared) {
        let y = shared.cursor.y;
        for cxt in self.cxt.iter_mut() {
            if let Some(i) = cxt.take() {
                self.map.update(i, y);
            }
        }
    }
}
// ----------------------------------------------------------------------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn feed(sm: &mut StateMap, shared: &mut Shared, y: u8) {
        shared.cursor.push(y);
        sm.update(shared);
    }

    #[test]
    fn bit_history_seeds_follow_counts() {
        let mut sm = StateMap::new(1, 256, 1023, StateMapMode::BitHistory);
        assert_eq!(sm.p1(0), 2048);
        assert!(sm.p1(1) < 2048); // one zero seen
        assert!(sm.p1(2) > 2048); // one one seen
        assert!(sm.p1(4) > sm.p1(2));
    }

    #[test]
    fn run_seeds_favour_expected_bit() {
        let mut sm = StateMap::new(1, 32, 255, StateMapMode::Run);
        assert_eq!(sm.p1(1), 2048);
        assert!(sm.p1(3) > 2048);
        assert!(sm.p1(2) < 2048);
        assert!(sm.p1(31) > sm.p1(3));
    }

    #[test]
    fn only_selected_sets_learn() {
        let mut shared = Shared::new(&Config::default());
        let mut sm = StateMap::new(2, 4, 127, StateMapMode::Generic);
        for _ in 0..10 {
            sm.p2(0, 3);
            sm.p2(1, 3);
            sm.skip(1);
            feed(&mut sm, &mut shared, 1);
        }
        assert!(sm.p2(0, 3) > 3500);
        assert_eq!(sm.p2(1, 3), 2048);
        assert_eq!(sm.p2(0, 2), 2048);
    }

    #[test]
    fn update_without_selection_is_a_no_op() {
        let mut shared = Shared::new(&Config::default());
        let mut sm = StateMap::new(1, 2, 127, StateMapMode::Generic);
        feed(&mut sm, &mut shared, 1);
        assert_eq!(sm.p1(0), 2048);
        assert_eq!(sm.p1(1), 2048);
    }

    #[test]
    #[should_panic]
    fn context_out_of_range() {
        let mut sm = StateMap::new(1, 4, 127, StateMapMode::Generic);
        sm.p1(4);
    }
}
