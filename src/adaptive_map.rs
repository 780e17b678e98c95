use crate::tables::{dt, DT_SIZE};

// Adaptive Map ------------------------------------------------------------------------------------------------------------ Adaptive Map
//
// Counter cells pack a 22 bit probability (high bits) and a 10 bit count
// (low bits) into one u32. Each observed bit moves the probability toward
// the bit by 1/(count + 1.5), so young cells adapt quickly and mature cells
// settle. The count saturates at a per map limit, which bounds how slow
// adaptation can become.

const PR_MSK: u32 = 0xFFFFFC00; // High 22 bit mask
const COUNT_MSK: u32 = 0x3FF;   // Low 10 bit mask

/// Cell holding probability p (12 bits) with a count of n.
#[inline]
pub fn cell(p: u32, n: u32) -> u32 {
    debug_assert!(p < 4096 && n <= COUNT_MSK);
    (p << 20) | n
}

/// Apply one observed bit to a counter cell.
#[inline]
pub fn update_cell(cell: &mut u32, y: u8, limit: usize) {
    debug_assert!(y <= 1);
    let count = (*cell & COUNT_MSK) as usize;
    let pr = (*cell >> 10) as i64;

    let delta = ((((y as i64) << 22) - pr) >> 3) * dt(count.min(DT_SIZE - 1)) as i64;
    let hi = ((*cell & PR_MSK) as i64 + (delta & !(COUNT_MSK as i64)))
        .clamp(0, PR_MSK as i64) as u32;

    let n = (count + 1).min(limit) as u32;
    *cell = hi | n;
}

/// Counter cells sharing one adaptation limit.
#[derive(Clone, Debug)]
pub struct AdaptiveMap {
    t:      Vec<u32>, // Counter cells
    limit:  usize,    // Maximum count (1..1024), higher = slower
}
impl AdaptiveMap {
    pub fn new(n: usize, limit: usize) -> AdaptiveMap {
        assert!(limit > 0 && limit < DT_SIZE);
        AdaptiveMap {
            t:      vec![1 << 31; n],
            limit,
        }
    }

    /// 12 bit prediction of cell i.
    #[inline]
    pub fn p(&self, i: usize) -> i32 {
        (self.t[i] >> 20) as i32
    }

    /// 16 bit prediction of cell i.
    #[inline]
    pub fn p16(&self, i: usize) -> u32 {
        self.t[i] >> 16
    }

    #[inline]
    pub fn count(&self, i: usize) -> u32 {
        self.t[i] & COUNT_MSK
    }

    #[inline]
    pub fn update(&mut self, i: usize, y: u8) {
        update_cell(&mut self.t[i], y, self.limit);
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Overwrite cell i, used when seeding a map.
    pub fn set(&mut self, i: usize, cell: u32) {
        self.t[i] = cell;
    }
}
// ----------------------------------------------------------------------------------------------------------------------------------------
