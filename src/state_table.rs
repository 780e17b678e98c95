use std::{
    collections::VecDeque,
    sync::OnceLock,
};

use crate::random::Random;

// Bit History State Table ------------------------------------------------------------------------------------- Bit History State Table
//
// A bit history state is one byte naming a bounded pair of counts (n0, n1)
// of zeros and ones seen in a context. Observing bit y increments n_y and,
// if the opposite count is above 2, discards part of it (n = n/2 + 1), so
// that recent evidence outweighs old evidence. The larger count is bounded
// by BOUND[smaller count]; the smaller count is at most 3.
//
// Every pair reachable from (0, 0) gets a state number, ordered by total
// count, then by smaller count, then by n1. This yields exactly 256 states,
// with 0 = no history and the deepest one sided runs at the end.

/// First state treated as a deep run. Climbing out of a deep state is only
/// accepted with a probability that halves every 16 states.
pub const DEEP_STATE: usize = 205;

const BOUND: [u8; 4] = [52, 52, 23, 5];

struct StateTable {
    next:    [[u8; 2]; 256],
    counts:  [(u8, u8); 256],
}

fn allowed(n0: u8, n1: u8) -> bool {
    let (lo, hi) = (n0.min(n1), n0.max(n1));
    (lo as usize) < BOUND.len() && hi <= BOUND[lo as usize]
}

/// Counts after observing bit y.
fn observe(n0: u8, n1: u8, y: u8) -> (u8, u8) {
    let (mut own, mut other) = if y == 1 { (n1, n0) } else { (n0, n1) };
    own += 1;
    if other > 2 { other = other / 2 + 1; }
    while !allowed(own, other) && other > 0 { other -= 1; }
    while !allowed(own, other) { own -= 1; }
    if y == 1 { (other, own) } else { (own, other) }
}

fn table() -> &'static StateTable {
    static TABLE: OnceLock<StateTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut seen = [[false; 64]; 64];
        let mut states = Vec::with_capacity(256);
        let mut queue = VecDeque::from([(0u8, 0u8)]);
        seen[0][0] = true;

        while let Some((n0, n1)) = queue.pop_front() {
            states.push((n0, n1));
            for y in 0..2 {
                let (a, b) = observe(n0, n1, y);
                if !seen[a as usize][b as usize] {
                    seen[a as usize][b as usize] = true;
                    queue.push_back((a, b));
                }
            }
        }
        assert_eq!(states.len(), 256);
        states.sort_by_key(|&(n0, n1)| (n0 as u16 + n1 as u16, n0.min(n1), n1));

        let mut number = [[0u8; 64]; 64];
        for (i, &(n0, n1)) in states.iter().enumerate() {
            number[n0 as usize][n1 as usize] = i as u8;
        }

        let mut t = StateTable {
            next:    [[0; 2]; 256],
            counts:  [(0, 0); 256],
        };
        for (i, &(n0, n1)) in states.iter().enumerate() {
            t.counts[i] = (n0, n1);
            for y in 0..2u8 {
                let (a, b) = observe(n0, n1, y);
                t.next[i][y as usize] = number[a as usize][b as usize];
            }
        }
        t
    })
}

/// State reached from `state` after observing bit y.
#[inline]
pub fn next(state: u8, y: u8) -> u8 {
    table().next[state as usize][y as usize]
}

/// Advance `state` by bit y. A climb out of a deep state is taken with
/// probability 2^-k, k growing with depth; otherwise the state is kept.
#[inline]
pub fn update(state: &mut u8, y: u8, rng: &mut Random) {
    let nxt = next(*state, y);
    let s = *state as usize;
    if s >= DEEP_STATE && nxt > *state {
        let k = 1 + ((s - DEEP_STATE) / 16) as u32;
        if rng.bits(k) != 0 { return; }
    }
    *state = nxt;
}

/// Zero and one counts of a state.
#[inline]
pub fn counts(state: u8) -> (u8, u8) {
    table().counts[state as usize]
}

/// Eviction priority: total evidence held by the state.
#[inline]
pub fn prio(state: u8) -> u8 {
    let (n0, n1) = counts(state);
    n0 + n1
}

/// Coarse grouping of states (0..32), usable as mixer context.
#[inline]
pub fn group(state: u8) -> u8 {
    let (n0, n1) = counts(state);
    let t = n0 + n1;
    let bucket = if t < 8 { t } else { (8 + (t - 8) / 6).min(15) };
    bucket * 2 + (n1 > n0) as u8
}
// ----------------------------------------------------------------------------------------------------------------------------------------
