use crate::state_table;

/// # Buckets
///
/// A bucket is one cache line holding N slots that share a table index.
/// Each slot is tagged with a 16 bit checksum of its context hash, where 0
/// marks an empty slot (a real checksum of 0 is stored as 1). One byte
/// records the two most recently used slots, one per nibble, 0xF meaning
/// none.
///
/// A lookup first tries the most recently used slot, then scans every
/// checksum. On a miss an empty slot is taken if there is one, otherwise
/// the slot with the lowest priority, excluding both recently used slots,
/// is cleared and handed to the new checksum. Found and new slots become
/// the most recently used.

/// Contents of a bucket slot.
pub trait Slot: Copy + Default {
    /// Replacement priority, lower is evicted first.
    fn priority(&self) -> u8;
    fn clear(&mut self);
}

/// Seven bit history states forming a 3 level bit tree (offsets 0, 1-2,
/// 3-6). When it covers the first two bits of a byte, bytes 3-6 hold
/// run and byte history information instead.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct HistoryTree(pub [u8; 7]);

impl Slot for HistoryTree {
    fn priority(&self) -> u8 {
        state_table::prio(self.0[0])
    }
    fn clear(&mut self) {
        self.0 = [0; 7];
    }
}

/// Strategy for locating a checksum within a bucket. Every strategy must
/// return the lowest matching index.
pub trait ChecksumSearch {
    fn find(&self, checksums: &[u16], checksum: u16) -> Option<usize>;
}

/// Compares one checksum at a time.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarSearch;

impl ChecksumSearch for ScalarSearch {
    #[inline]
    fn find(&self, checksums: &[u16], checksum: u16) -> Option<usize> {
        checksums.iter().position(|&c| c == checksum)
    }
}

/// Compares four checksums at a time packed into a u64.
#[derive(Clone, Copy, Debug, Default)]
pub struct SwarSearch;

const LANE_LO: u64 = 0x0001_0001_0001_0001;
const LANE_HI: u64 = 0x8000_8000_8000_8000;

impl ChecksumSearch for SwarSearch {
    #[inline]
    fn find(&self, checksums: &[u16], checksum: u16) -> Option<usize> {
        let pattern = checksum as u64 * LANE_LO;
        let mut chunks = checksums.chunks_exact(4);

        for (c, chunk) in chunks.by_ref().enumerate() {
            let word = chunk.iter().rev()
                .fold(0u64, |w, &lane| (w << 16) | lane as u64);
            let x = word ^ pattern;
            // Flags zero lanes. Lanes above a zero lane may be flagged
            // falsely through the borrow, the lowest flag is exact.
            let zero = x.wrapping_sub(LANE_LO) & !x & LANE_HI;
            if zero != 0 {
                return Some(c * 4 + (zero.trailing_zeros() / 16) as usize);
            }
        }
        let base = checksums.len() - chunks.remainder().len();
        chunks.remainder().iter()
            .position(|&c| c == checksum)
            .map(|i| base + i)
    }
}

const NO_SLOT: u8 = 0xF;

#[repr(C, align(64))]
#[derive(Clone, Copy, Debug)]
pub struct Bucket16<T: Slot, const N: usize> {
    checksums:  [u16; N], // Slot tags, 0 = empty
    mru:        u8,       // Most recently used slot (low nibble) and the one before it
    slots:      [T; N],
}
impl<T: Slot, const N: usize> Default for Bucket16<T, N> {
    fn default() -> Bucket16<T, N> {
        Bucket16::new()
    }
}
impl<T: Slot, const N: usize> Bucket16<T, N> {
    pub fn new() -> Bucket16<T, N> {
        assert!(N >= 3 && N < NO_SLOT as usize);
        Bucket16 {
            checksums:  [0; N],
            mru:        (NO_SLOT << 4) | NO_SLOT,
            slots:      [T::default(); N],
        }
    }

    /// Index of the slot tagged with `checksum`, claiming one if absent.
    pub fn find<S: ChecksumSearch>(&mut self, checksum: u16, search: &S) -> usize {
        let checksum = checksum.max(1);
        let (first, second) = self.mru();

        if first < N && self.checksums[first] == checksum {
            return first;
        }
        if let Some(i) = search.find(&self.checksums, checksum) {
            self.promote(i);
            return i;
        }

        let i = match self.checksums.iter().position(|&c| c == 0) {
            Some(empty) => empty,
            None => self.victim(first, second),
        };
        self.slots[i].clear();
        self.checksums[i] = checksum;
        self.promote(i);
        i
    }

    /// Lowest priority slot outside the MRU pair, ties to the lowest index.
    fn victim(&self, first: usize, second: usize) -> usize {
        let mut victim = None;
        let mut lowest = u8::MAX;
        for i in (0..N).filter(|&i| i != first && i != second) {
            let priority = self.slots[i].priority();
            if victim.is_none() || priority < lowest {
                victim = Some(i);
                lowest = priority;
            }
        }
        victim.unwrap_or(0)
    }

    fn promote(&mut self, i: usize) {
        if i != (self.mru & 0xF) as usize {
            self.mru = (self.mru << 4) | i as u8;
        }
    }

    /// Most and second most recently used slot, N or more if none.
    pub fn mru(&self) -> (usize, usize) {
        ((self.mru & 0xF) as usize, (self.mru >> 4) as usize)
    }

    pub fn checksum(&self, i: usize) -> u16 {
        self.checksums[i]
    }

    pub fn slot(&self, i: usize) -> &T {
        &self.slots[i]
    }

    pub fn slot_mut(&mut self, i: usize) -> &mut T {
        &mut self.slots[i]
    }
}

/// Bucket of seven bit history trees, one cache line.
pub type Bucket = Bucket16<HistoryTree, 7>;

const _: () = assert!(std::mem::size_of::<Bucket>() == 64);
