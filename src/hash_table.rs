use std::mem::size_of;

use crate::error::ConfigError;

/// # Hash Table
///
/// A power of two number of buckets, allocated once. Contexts are hashed to
/// 64 bits; the top bits select a bucket and the 16 bits below them form
/// the checksum that tags a slot inside the bucket (see bucket.rs). Bucket
/// indices are masked, so any index addresses some bucket.
pub struct HashTable<T> {
    buckets:  Vec<T>, // Power of two number of buckets
    mask:     usize,  // Number of buckets - 1
}
impl<T: Default + Clone> HashTable<T> {
    /// Create a table occupying `bytes` bytes.
    pub fn new(bytes: usize) -> Result<HashTable<T>, ConfigError> {
        let size = size_of::<T>();
        if size == 0 || bytes < size || bytes % size != 0 {
            return Err(ConfigError::InvalidTableSize(bytes));
        }
        let n = bytes / size;
        if !bytes.is_power_of_two() || !n.is_power_of_two() {
            return Err(ConfigError::InvalidTableSize(bytes));
        }
        Ok(HashTable {
            buckets:  vec![T::default(); n],
            mask:     n - 1,
        })
    }
}
impl<T> HashTable<T> {
    #[inline]
    pub fn bucket(&self, i: usize) -> &T {
        &self.buckets[i & self.mask]
    }

    #[inline]
    pub fn bucket_mut(&mut self, i: usize) -> &mut T {
        &mut self.buckets[i & self.mask]
    }

    /// Number of hash bits used to select a bucket.
    pub fn index_bits(&self) -> u32 {
        self.buckets.len().trailing_zeros()
    }

    pub fn mask(&self) -> usize {
        self.mask
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
