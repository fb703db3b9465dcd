//! Deterministic hashing.
//!
//! Rule tables are keyed by event kind and must iterate identically in every
//! iteration; trace fingerprints must be stable across processes. The std
//! `RandomState` provides neither.

use std::hash::{BuildHasher, Hash, Hasher};

/// Deterministic, non-cryptographic hasher with a fixed seed.
#[derive(Debug, Clone)]
pub struct DetHasher {
    state: u64,
}

impl DetHasher {
    const SEED: u64 = 0x16f1_1fe8_9b0d_677c;
    const MULTIPLIER: u64 = 0x517c_c1b7_2722_0a95;
}

impl Default for DetHasher {
    fn default() -> Self {
        Self { state: Self::SEED }
    }
}

impl Hasher for DetHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(Self::MULTIPLIER) ^ u64::from(byte);
        }
    }

    fn write_u64(&mut self, i: u64) {
        self.state = self.state.wrapping_mul(Self::MULTIPLIER) ^ i;
    }

    fn finish(&self) -> u64 {
        // fmix64 finalizer
        let mut h = self.state;
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^= h >> 33;
        h
    }
}

/// Builder for [`DetHasher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DetBuildHasher;

impl BuildHasher for DetBuildHasher {
    type Hasher = DetHasher;

    fn build_hasher(&self) -> Self::Hasher {
        DetHasher::default()
    }
}

/// `HashMap` with reproducible hashing across runs.
pub type DetHashMap<K, V> = std::collections::HashMap<K, V, DetBuildHasher>;

/// Hashes any sequence of values with [`DetHasher`].
pub fn fingerprint<'a, T, I>(items: I) -> u64
where
    T: Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut hasher = DetHasher::default();
    for item in items {
        item.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_order_sensitive() {
        let a = fingerprint(&[1u64, 2, 3]);
        let b = fingerprint(&[1u64, 2, 3]);
        let c = fingerprint(&[3u64, 2, 1]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn det_hash_map_lookup() {
        let mut map: DetHashMap<&str, u32> = DetHashMap::default();
        map.insert("ping", 1);
        map.insert("pong", 2);
        assert_eq!(map.get("ping"), Some(&1));
        assert_eq!(map.get("pong"), Some(&2));
    }
}
