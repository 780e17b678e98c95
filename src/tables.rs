use std::sync::OnceLock;

/// Number of entries in the reciprocal table, and one past the largest
/// count a counter cell can hold.
pub const DT_SIZE: usize = 1024;

/// Reciprocal table: dt[n] = 16384/(2n+3). Controls how far a counter
/// moves toward an observed bit after n observations.
#[inline]
pub fn dt(n: usize) -> i32 {
    static TABLE: OnceLock<[u16; DT_SIZE]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut t = [0u16; DT_SIZE];
        for (i, x) in t.iter_mut().enumerate() {
            *x = (16_384 / (i + i + 3)) as u16;
        }
        t
    });
    table[n] as i32
}

/// ilog(x) = round(16 * log2(x)) for x in 1..65536, ilog(0) = 0.
/// Built by numerically integrating 1/x.
#[inline]
pub fn ilog(x: u16) -> u8 {
    static TABLE: OnceLock<Vec<u8>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut t = vec![0u8; 65_536];
        let mut x: u32 = 14_155_776;
        for (i, v) in t.iter_mut().enumerate().skip(2) {
            x += 774_541_002 / ((i as u32) * 2 - 1);
            *v = (x >> 24) as u8;
        }
        t
    });
    table[x as usize]
}
