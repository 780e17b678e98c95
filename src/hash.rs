// Context hashing.
//
// Keys are combined by multiplying each (x + 1) with its own large odd
// constant and folding the high bits back down. The table index is taken
// from the top bits of the final hash and the checksum from the bits just
// below, so index and checksum never share bits.

pub const PHI64: u64 = 0x9E3779B97F4A7C15;

const MUL64: [u64; 3] = [
    0xD6E8FEB86659FD93,
    0x9FB21C651E98DF25,
    0xC2B2AE3D27D4EB4F,
];

#[inline]
fn fold(h: u64) -> u64 {
    h ^ (h >> 29)
}

#[inline]
pub fn hash2(a: u64, b: u64) -> u64 {
    fold(
        a.wrapping_add(1).wrapping_mul(PHI64)
        .wrapping_add(b.wrapping_add(1).wrapping_mul(MUL64[0]))
    )
}

#[inline]
pub fn hash3(a: u64, b: u64, c: u64) -> u64 {
    fold(
        a.wrapping_add(1).wrapping_mul(PHI64)
        .wrapping_add(b.wrapping_add(1).wrapping_mul(MUL64[0]))
        .wrapping_add(c.wrapping_add(1).wrapping_mul(MUL64[1]))
    )
}

/// Table index from the top `bits` bits of a hash (0..=32).
#[inline]
pub fn finalize64(h: u64, bits: u32) -> u32 {
    debug_assert!(bits <= 32);
    h.checked_shr(64 - bits).unwrap_or(0) as u32
}

/// Checksum from the `checksum_bits` bits below the index bits.
#[inline]
pub fn checksum64(h: u64, hash_bits: u32, checksum_bits: u32) -> u16 {
    debug_assert!(checksum_bits <= 16 && hash_bits + checksum_bits <= 64);
    ((h >> (64 - hash_bits - checksum_bits)) & ((1 << checksum_bits) - 1)) as u16
}

/// Rolling hash step: mixes byte c into h. Used by order-n and word
/// contexts whose history does not fit into c4.
#[inline]
pub fn combine(h: u64, c: u8) -> u64 {
    (h.wrapping_add(c as u64 + 1)).wrapping_mul(MUL64[2])
}
