use tracing::debug;

use crate::{
    bucket::{Bucket, HistoryTree, SwarSearch},
    broadcaster::Component,
    context_map::{add_history_inputs, run_input, tree, tree_mut, SlotRef},
    error::ConfigError,
    hash::{checksum64, finalize64, hash2, PHI64},
    hash_table::HashTable,
    logistic::stretch,
    mixer::Mixer,
    shared::{BitCursor, Shared},
    state_map::{StateMap, StateMapMode},
    state_table,
    tables::ilog,
};

// Context Map 2 ------------------------------------------------------------------------------------------------------------ Context Map 2
//
// Like ContextMap, with two differences. The bit 2 and bit 5 slots of a
// byte are looked up in buckets derived from the bit 0 bucket by changing
// its low 6 index bits, keeping all three lookups within one 4 KiB page of
// the table. And the bit 0 slot remembers up to three distinct recent
// bytes of the context, which feed a sixth prediction: the most recent of
// them agreeing with the bits seen so far predicts the next bit, through
// an adaptive map indexed by its rank and run length.
//
// Bit 0 slot layout: [0..3] bit tree, [3] run length of [4], [4] last
// byte, [5] byte before, [6] byte before that (0 = none).

const RUN_COUNT: usize = 3;
const BYTE1: usize = 4;
const BYTE2: usize = 5;
const BYTE3: usize = 6;

/// Contexts of the byte history map: rank (0..3) * 16 + run strength,
/// times 2 for the expected bit.
const BYTE_HISTORY_CXTS: usize = 3 * 16 * 2;

#[derive(Clone, Copy, Debug, Default)]
struct ContextSlot {
    key:     u64,             // Context hash, salted with the context index
    page:    usize,           // Bucket of the bit 0 slot
    byte0:   Option<SlotRef>, // Slot covering bits 0-1 and byte history
    cur:     Option<SlotRef>, // Slot covering the current bit
    offset:  usize,           // State of the current bit within cur
    active:  bool,
}

fn agrees(byte: u8, cur: &BitCursor) -> bool {
    (byte as u32 + 256) >> (8 - cur.bpos) == cur.c0
}

/// Record byte c1 at the end of a byte.
fn roll_history(tree: &mut HistoryTree, c1: u8) {
    let t = &mut tree.0;
    if t[RUN_COUNT] > 0 && t[BYTE1] == c1 {
        t[RUN_COUNT] = t[RUN_COUNT].saturating_add(1);
        return;
    }
    if t[BYTE2] != c1 {
        t[BYTE3] = t[BYTE2];
    }
    t[BYTE2] = t[BYTE1];
    t[BYTE1] = c1;
    t[RUN_COUNT] = 1;
}

pub struct ContextMap2 {
    table:    HashTable<Bucket>, // Bit histories
    slots:    Vec<ContextSlot>,  // One per context
    sm:       StateMap,          // Bit history -> probability, one set per context
    run_sm:   StateMap,          // Byte history -> probability, one set per context
    index:    usize,             // Next context to set this byte
    search:   SwarSearch,
}
impl ContextMap2 {
    /// Number of inputs added per context.
    pub const INPUTS: usize = 6;

    pub fn new(bytes: usize, contexts: usize) -> Result<ContextMap2, ConfigError> {
        let table = HashTable::new(bytes)?;
        debug!(buckets = table.len(), contexts, "context map allocated");
        Ok(ContextMap2 {
            table,
            slots:    vec![ContextSlot::default(); contexts],
            sm:       StateMap::new(contexts, 256, 1023, StateMapMode::BitHistory),
            run_sm:   StateMap::new(contexts, BYTE_HISTORY_CXTS, 255, StateMapMode::Run),
            index:    0,
            search:   SwarSearch,
        })
    }

    /// Set the next context of this byte. Call before bit 0.
    pub fn set(&mut self, key: u64) {
        let i = self.index;
        assert!(i < self.slots.len(), "more contexts set than declared");
        self.index += 1;

        let h = hash2(key, i as u64);
        let bits = self.table.index_bits();
        let page = finalize64(h, bits) as usize & self.table.mask();
        let slot = self.table.bucket_mut(page).find(checksum64(h, bits, 16), &self.search);
        let r = SlotRef { bucket: page, slot };
        self.slots[i] = ContextSlot {
            key:     h,
            page,
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
            let byte0 = match (slot.active, slot.byte0) {
                (true, Some(r)) => tree(&self.table, r).0,
                _ => {
                    for _ in 0..Self::INPUTS { m.add(0); }
                    self.sm.skip(i);
                    self.run_sm.skip(i);
                    continue;
                }
            };
            m.add(run_input(byte0[RUN_COUNT], byte0[BYTE1], &cur));

            let state = slot.cur.map_or(0, |r| tree(&self.table, r).0[slot.offset]);
            if state == 0 {
                for _ in 0..4 { m.add(0); }
                self.sm.skip(i);
            }
            else {
                let p = self.sm.p2(i, state as usize);
                add_history_inputs(m, p, state);
            }

            let count = byte0[RUN_COUNT];
            let expected = if count > 0 && agrees(byte0[BYTE1], &cur) {
                Some((0, byte0[BYTE1], ilog(count as u16 + 1) as usize >> 4))
            }
            else if byte0[BYTE2] != 0 && agrees(byte0[BYTE2], &cur) {
                Some((1, byte0[BYTE2], 0))
            }
            else if byte0[BYTE3] != 0 && agrees(byte0[BYTE3], &cur) {
                Some((2, byte0[BYTE3], 0))
            }
            else {
                None
            };
            match expected {
                Some((rank, byte, strength)) => {
                    let bit = ((byte >> (7 - cur.bpos)) & 1) as usize;
                    let p = self.run_sm.p2(i, ((rank * 16 + strength) << 1) | bit);
                    m.add(stretch(p) >> 1);
                }
                None => {
                    m.add(0);
                    self.run_sm.skip(i);
                }
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

    /// Number of contexts with a bit history for the current bit.
    pub fn order(&self) -> usize {
        (0..self.slots.len()).filter(|&i| self.state(i) != 0).count()
    }

    /// State group of context i, usable as mixer context (0..32).
    pub fn state_group(&self, i: usize) -> usize {
        state_table::group(self.state(i)) as usize
    }

    pub fn contexts(&self) -> usize {
        self.slots.len()
    }
}
impl Component for ContextMap2 {
    fn update(&mut self, shared: &mut Shared) {
        let ContextMap2 { table, slots, sm, run_sm, index, search } = self;
        let cur = shared.cursor;
        let bits = table.index_bits();
        let mask = table.mask();

        for slot in slots.iter_mut().filter(|s| s.active) {
            if let Some(r) = slot.cur {
                let state = &mut tree_mut(table, r).0[slot.offset];
                state_table::update(state, cur.y, &mut shared.rng);
            }
            match cur.bpos {
                1 | 3 | 6 => slot.offset = 1 + (cur.c0 & 1) as usize,
                4 | 7 => slot.offset = 3 + (cur.c0 & 3) as usize,
                2 | 5 => {
                    let h = hash2(slot.key, cur.c0 as u64);
                    let bucket = (slot.page ^ ((cur.c0 as u64).wrapping_mul(PHI64) >> 58) as usize) & mask;
                    let i = table.bucket_mut(bucket).find(checksum64(h, bits, 16), &*search);
                    slot.cur = Some(SlotRef { bucket, slot: i });
                    slot.offset = 0;
                }
                _ => {
                    if let Some(r) = slot.byte0 {
                        roll_history(tree_mut(table, r), cur.c1);
                    }
                    slot.active = false;
                }
            }
        }
        if cur.bpos == 0 {
            *index = 0;
        }
        sm.update(shared);
        run_sm.update(shared);
    }
}
// ----------------------------------------------------------------------------------------------------------------------------------------
