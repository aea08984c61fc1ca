//! Order-sensitive rolling fingerprint
//!
//! [`HashGenerator`] accumulates a sequence of integers into a single
//! 32-bit value: the `i`th word is multiplied by the `i`th prime and added
//! to a running total, with the prime index wrapping after
//! [`MAX_PRIME_NUMBERS`] words. The schema model feeds its structure through
//! this generator to produce the fingerprint that peers compare at
//! connection time (see [`DcFile::generate_hash`](crate::DcFile::generate_hash)).

pub mod primes;

pub use primes::PrimeTable;

/// Number of primes cycled through before the index wraps around
pub const MAX_PRIME_NUMBERS: usize = 10000;

/// Rolling accumulator over a stream of integer words
#[derive(Clone, Debug, Default)]
pub struct HashGenerator {
    hash: i64,
    index: usize,
    primes: PrimeTable,
}

impl HashGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_primes(PrimeTable::new())
    }

    /// Constructs a generator around an existing (possibly pre-extended) prime table.
    #[must_use]
    pub fn with_primes(primes: PrimeTable) -> Self {
        Self {
            hash: 0,
            index: 0,
            primes,
        }
    }

    /// Adds one word to the fingerprint.
    pub fn add_int(&mut self, num: i64) {
        let prime = self.primes.get(self.index);
        self.hash = self.hash.wrapping_add(prime.wrapping_mul(num));
        self.index = (self.index + 1) % MAX_PRIME_NUMBERS;
    }

    /// Adds the length of `s` followed by each of its bytes.
    pub fn add_string(&mut self, s: &str) {
        self.add_blob(s.as_bytes());
    }

    /// Adds the length of `b` followed by each of its bytes, read as signed.
    pub fn add_blob(&mut self, b: &[u8]) {
        self.add_int(b.len() as i64);
        for &byte in b {
            self.add_int(byte as i8 as i64);
        }
    }

    /// Returns the current fingerprint, truncated to 32 bits.
    #[must_use]
    pub fn get_hash(&self) -> u32 {
        (self.hash & 0xffff_ffff) as u32
    }

    /// Consumes the generator, returning the fingerprint and the prime table for reuse.
    pub fn finish(self) -> (u32, PrimeTable) {
        (self.get_hash(), self.primes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_sensitive() {
        let mut a = HashGenerator::new();
        a.add_int(1);
        a.add_int(2);
        let mut b = HashGenerator::new();
        b.add_int(2);
        b.add_int(1);
        assert_eq!(a.get_hash(), 2 * 1 + 3 * 2);
        assert_eq!(b.get_hash(), 2 * 2 + 3 * 1);
    }

    #[test]
    fn string_words() {
        let mut a = HashGenerator::new();
        a.add_string("ab");
        let mut b = HashGenerator::new();
        b.add_int(2);
        b.add_int(b'a' as i64);
        b.add_int(b'b' as i64);
        assert_eq!(a.get_hash(), b.get_hash());
    }

    #[test]
    fn negative_truncation() {
        let mut gen = HashGenerator::new();
        gen.add_int(-1);
        assert_eq!(gen.get_hash(), (-2i64 & 0xffff_ffff) as u32);
    }

    #[test]
    fn reused_table_is_equivalent() {
        let mut first = HashGenerator::new();
        (0..50).for_each(|i| first.add_int(i));
        let (h1, table) = first.finish();
        let mut second = HashGenerator::with_primes(table);
        (0..50).for_each(|i| second.add_int(i));
        assert_eq!(second.get_hash(), h1);
    }
}
