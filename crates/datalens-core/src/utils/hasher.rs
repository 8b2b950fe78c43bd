use std::hash::{BuildHasher, Hasher};

/// Identity hasher for the distinct-value sets and reference indexes. Their
/// keys are xxh3-64 digests computed at insertion, already uniformly
/// distributed, so the map must not hash them a second time.
#[derive(Default, Clone)]
pub struct PrehashedKey(u64);

impl Hasher for PrehashedKey {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline]
    fn write_u64(&mut self, key: u64) {
        self.0 = key;
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        // Keys reach this hasher through write_u64; fold anything else so
        // non-u64 keys still hash deterministically.
        for &byte in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(byte);
        }
    }
}

#[derive(Clone, Default)]
pub struct PrehashedBuilder;

impl BuildHasher for PrehashedBuilder {
    type Hasher = PrehashedKey;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        PrehashedKey(0)
    }
}
