use tracing::debug;

use crate::{
    bucket::{Bucket, HistoryTree, SwarSearch},
    broadcaster::Component,
    error::ConfigError,
    hash::{checksum64, finalize64, hash2},
    hash_table::HashTable,
    logistic::stretch,
    mixer::Mixer,
    shared::{BitCursor, Shared},
    state_map::{StateMap, StateMapMode},
    state_table,
    tables::ilog,
};

/// # Context Map
///
/// Maps each of a fixed number of contexts to bit histories stored in a
/// hash table of buckets. A context is set once per byte, before its first
/// bit. Three slots are looked up per byte and context: at bit 0 (covering
/// bits 0-1), bit 2 (bits 2-4) and bit 5 (bits 5-7). Each slot holds a bit
/// tree of states, offset 0 for the first bit it covers, 1-2 for the
/// second, 3-6 for the third. The bit 0 slot only uses offsets 0-2, its
/// remaining bytes record the last byte seen in the context and how many
/// times in a row it occurred.
///
/// For every bit, each context adds a run prediction (the last byte, if it
/// agrees with the bits of the current byte so far, weighted by the log of
/// its run length) and four predictions derived from its bit history.

/// Location of a bucket slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRef {
    pub bucket:  usize,
    pub slot:    usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct ContextSlot {
    key:     u64,             // Context hash, salted with the context index
    byte0:   Option<SlotRef>, // Slot covering bits 0-1 and the run
    cur:     Option<SlotRef>, // Slot covering the current bit
    offset:  usize,           // State of the current bit within cur
    active:  bool,            // Set this byte and not skipped
}

const RUN_COUNT: usize = 3;
const RUN_BYTE: usize = 4;

/// Look up (or claim) the slot tagged by hash h.
pub(crate) fn lookup(table: &mut HashTable<Bucket>, h: u64, search: &SwarSearch) -> SlotRef {
    let bits = table.index_bits();
    let bucket = finalize64(h, bits) as usize & table.mask();
    let slot = table.bucket_mut(bucket).find(checksum64(h, bits, 16), search);
    SlotRef { bucket, slot }
}

pub(crate) fn tree(table: &HashTable<Bucket>, r: SlotRef) -> &HistoryTree {
    table.bucket(r.bucket).slot(r.slot)
}

pub(crate) fn tree_mut(table: &mut HashTable<Bucket>, r: SlotRef) -> &mut HistoryTree {
    table.bucket_mut(r.bucket).slot_mut(r.slot)
}

/// Prediction from a run of `count` occurrences of `byte`: the next bit of
/// that byte, scaled by the log of the run length, if the byte agrees
/// with the bits seen so far.
pub(crate) fn run_input(count: u8, byte: u8, cur: &BitCursor) -> i32 {
    if count == 0 || (byte as u32 + 256) >> (8 - cur.bpos) != cur.c0 {
        return 0;
    }
    let strength = (ilog(count as u16 + 1) as i32) << 2;
    if (byte >> (7 - cur.bpos)) & 1 == 1 { strength } else { -strength }
}

/// The four bit history predictions: stretched probability, probability
/// offset, stretched probability only when both bits have been seen, and a
/// confidence term when only one bit value has been seen.
pub(crate) fn add_history_inputs(m: &mut Mixer, p: i32, state: u8) {
    let st = stretch(p) >> 2;
    m.add(st);
    m.add((p - 2048) >> 3);

    let (n0, n1) = state_table::counts(state);
    m.add(if n0 > 0 && n1 > 0 { st } else { 0 });
    m.add(
        if n0 == 0 { (ilog(n1 as u16 + 1) as i32) << 2 }
        else if n1 == 0 { -((ilog(n0 as u16 + 1) as i32) << 2) }
        else { 0 }
    );
}

/// Advance the last byte and run length kept in a bit 0 slot.
pub(crate) fn roll_run(tree: &mut HistoryTree, c1: u8) {
    let t = &mut tree.0;
    if t[RUN_COUNT] == 0 || t[RUN_BYTE] != c1 {
        t[RUN_COUNT] = 1;
        t[RUN_BYTE] = c1;
    }
    else if t[RUN_COUNT] < 255 {
        t[RUN_COUNT] += 1;
    }
}

pub struct ContextMap {
    table:   HashTable<Bucket>, // Bit histories
    slots:   Vec<ContextSlot>,  // One per context
    sm:      StateMap,          // Maps a bit history to a probability, one set per context
    index:   usize,             // Next context to set this byte
    search:  SwarSearch,
}
impl ContextMap {
    /// Number of inputs added per context.
    pub const INPUTS: usize = 5;

    /// Create a context map of `bytes` bytes for `contexts` contexts.
    pub fn new(bytes: usize, contexts: usize) -> Result<ContextMap, ConfigError> {
        let table = HashTable::new(bytes)?;
        debug!(buckets = table.len(), contexts, "context map allocated");
        Ok(ContextMap {
            table,
            slots:   vec![ContextSlot::default(); contexts],
            sm:      StateMap::new(contexts, 256, 1023, StateMapMode::BitHistory),
            index:   0,
            search:  SwarSearch,
        })
    }

    /// Set the next context of this byte. Call before bit 0.
    pub fn set(&mut self, key: u64) {
        let i = self.index;
        assert!(i < self.slots.len(), "more contexts set than declared");
        self.index += 1;

        let h = hash2(key, i as u64);
        let r = lookup(&mut self.table, h, &self.search);
        self.slots[i] = ContextSlot {
            key:     h,
            byte0:   Some(r),
            cur:     Some(r),
            offset:  0,
            active:  true,
        };
    }

    /// Leave the next context out for this byte.
    pub fn skip(&mut self) {
        let i = self.index;
        assert!(i < self.slots.len(), "more contexts skipped than declared");
        self.index += 1;
        self.slots[i].active = false;
    }

    pub fn mix(&mut self, m: &mut Mixer, shared: &Shared) {
        let cur = shared.cursor;
        for (i, slot) in self.slots.iter().enumerate() {
            if !slot.active {
                for _ in 0..Self::INPUTS { m.add(0); }
                self.sm.skip(i);
                continue;
            }
            let run = slot.byte0
                .map(|r| tree(&self.table, r).0)
                .map_or(0, |t| run_input(t[RUN_COUNT], t[RUN_BYTE], &cur));
            m.add(run);

            let state = slot.cur.map_or(0, |r| tree(&self.table, r).0[slot.offset]);
            if state == 0 {
                for _ in 0..4 { m.add(0); }
                self.sm.skip(i);
            }
            else {
                let p = self.sm.p2(i, state as usize);
                add_history_inputs(m, p, state);
            }
        }
    }

    /// Current bit history state of context i, 0 if none.
    pub fn state(&self, i: usize) -> u8 {
        let slot = &self.slots[i];
        match (slot.active, slot.cur) {
            (true, Some(r)) => tree(&self.table, r).0[slot.offset],
            _ => 0,
        }
    }

    pub fn contexts(&self) -> usize {
        self.slots.len()
    }
}
impl Component for ContextMap {
    fn update(&mut self, shared: &mut Shared) {
        let ContextMap { table, slots, sm, index, search } = self;
        let cur = shared.cursor;

        for slot in slots.iter_mut().filter(|s| s.active) {
            if let Some(r) = slot.cur {
                let state = &mut tree_mut(table, r).0[slot.offset];
                state_table::update(state, cur.y, &mut shared.rng);
            }
            match cur.bpos {
                1 | 3 | 6 => slot.offset = 1 + (cur.c0 & 1) as usize,
                4 | 7 => slot.offset = 3 + (cur.c0 & 3) as usize,
                2 | 5 => {
                    slot.cur = Some(lookup(table, hash2(slot.key, cur.c0 as u64), search));
                    slot.offset = 0;
                }
                _ => {
                    if let Some(r) = slot.byte0 {
                        roll_run(tree_mut(table, r), cur.c1);
                    }
                    slot.active = false;
                }
            }
        }
        if cur.bpos == 0 {
            *index = 0;
        }
        sm.update(shared);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    /// Code one byte through a single context map, returning the sum of
    /// the magnitudes of its inputs over the byte.
    fn code_byte(cm: &mut ContextMap, shared: &mut Shared, key: u64, byte: u8) -> i32 {
        let mut confidence = 0;
        for i in (0..8).rev() {
            if shared.cursor.bpos == 0 {
                cm.set(key);
            }
            let mut m = Mixer::new(ContextMap::INPUTS * cm.contexts(), &[1], 7);
            cm.mix(&mut m, shared);
            confidence += m.inputs().iter().map(|x| x.abs()).sum::<i32>();
            m.set(0, 1);
            m.p();
            shared.cursor.push((byte >> i) & 1);
            cm.update(shared);
        }
        confidence
    }

    #[test]
    fn confidence_grows_then_fades_after_eviction() {
        let mut shared = Shared::new(&Config::default());
        // One bucket: seven slots shared by every context.
        let mut cm = ContextMap::new(64, 1).unwrap();

        let mut history = Vec::new();
        for _ in 0..24 {
            history.push(code_byte(&mut cm, &mut shared, 1, 0xAA));
        }
        assert_eq!(history[0], 0);
        for w in history.windows(2) {
            assert!(w[1] >= w[0], "confidence fell: {:?}", history);
        }
        let peak = history[23];
        assert!(peak > history[1]);

        // Two other contexts, each seen more often, push the first out.
        for _ in 0..40 {
            code_byte(&mut cm, &mut shared, 2, 0xAA);
        }
        for _ in 0..40 {
            code_byte(&mut cm, &mut shared, 3, 0xAA);
        }
        let after = code_byte(&mut cm, &mut shared, 1, 0xAA);
        assert!(after < peak, "after = {}, peak = {}", after, peak);
    }

    #[test]
    fn run_predicts_the_repeated_byte() {
        let mut shared = Shared::new(&Config::default());
        let mut cm = ContextMap::new(1 << 12, 1).unwrap();
        for _ in 0..3 {
            code_byte(&mut cm, &mut shared, 9, 0x41);
        }
        cm.set(9);
        let mut m = Mixer::new(ContextMap::INPUTS, &[1], 7);
        cm.mix(&mut m, &shared);
        // 0x41 starts with a 0 bit, run of 3.
        assert_eq!(m.inputs()[0], -((ilog(4) as i32) << 2));
    }

    #[test]
    fn skipped_context_adds_zeros() {
        let mut shared = Shared::new(&Config::default());
        let mut cm = ContextMap::new(1 << 12, 2).unwrap();
        code_byte(&mut cm, &mut shared, 5, 0x55);
        cm.set(5);
        cm.skip();
        let mut m = Mixer::new(ContextMap::INPUTS * 2, &[1], 7);
        cm.mix(&mut m, &shared);
        assert_eq!(&m.inputs()[5..], &[0; 5]);
        assert_eq!(cm.state(1), 0);
        assert_ne!(cm.state(0), 0);
    }

    #[test]
    fn run_input_requires_agreement() {
        let mut cur = BitCursor::default();
        assert_eq!(run_input(2, 0b1000_0000, &cur), (ilog(3) as i32) << 2);
        cur.push(0);
        assert_eq!(run_input(2, 0b1000_0000, &cur), 0);
        assert_eq!(run_input(0, 0, &cur), 0);
        assert_eq!(run_input(1, 0, &cur), -((ilog(2) as i32) << 2));
    }
}
