//! Random object key suffixes
//!
//! When suffix randomization is on, object keys end in a random UUID instead
//! of the zero-padded object index. The generator is seeded, so two runs with
//! the same seed produce the same key sequence. One generator is shared by all
//! workers of a phase; the random source sits behind a mutex and each UUID's
//! 16 bytes are drawn under a single lock acquisition.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Thread-safe, seeded UUID generator
#[derive(Debug)]
pub struct SuffixGenerator {
    rng: Mutex<Xoshiro256PlusPlus>,
}

impl SuffixGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(Xoshiro256PlusPlus::seed_from_u64(seed)),
        }
    }

    /// Next random version 4 UUID
    pub fn next_uuid(&self) -> Uuid {
        let mut buf = [0u8; 16];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(&mut buf);

        buf[6] = (buf[6] & 0x0f) | 0x40;
        buf[8] = (buf[8] & 0x3f) | 0x80;
        Uuid::from_bytes(buf)
    }

    /// Next suffix in hyphenated lower-case form
    pub fn next_suffix(&self) -> String {
        self.next_uuid().hyphenated().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_version_and_variant() {
        let generator = SuffixGenerator::new(7);
        for _ in 0..100 {
            let uuid = generator.next_uuid();
            assert_eq!(uuid.get_version_num(), 4);
            assert_eq!(uuid.get_variant(), uuid::Variant::RFC4122);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = SuffixGenerator::new(42);
        let b = SuffixGenerator::new(42);
        let c = SuffixGenerator::new(43);
        let seq_a: Vec<String> = (0..10).map(|_| a.next_suffix()).collect();
        let seq_b: Vec<String> = (0..10).map(|_| b.next_suffix()).collect();
        let seq_c: Vec<String> = (0..10).map(|_| c.next_suffix()).collect();
        assert_eq!(seq_a, seq_b);
        assert_ne!(seq_a, seq_c);
    }

    #[test]
    fn test_suffix_format() {
        let suffix = SuffixGenerator::new(0).next_suffix();
        assert_eq!(suffix.len(), 36);
        assert_eq!(suffix.matches('-').count(), 4);
        assert_eq!(suffix, suffix.to_lowercase());
    }

    #[test]
    fn test_concurrent_draws_are_distinct() {
        let generator = SuffixGenerator::new(1);
        let mut all: Vec<String> = Vec::new();
        thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..250).map(|_| generator.next_suffix()).collect::<Vec<_>>()))
                .collect();
            for handle in handles {
                all.extend(handle.join().unwrap());
            }
        });
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 1000);
    }
}
