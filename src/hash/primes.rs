//! Deterministic, lazily-extended table of prime numbers
//!
//! The table is an ordinary value: a [`HashGenerator`](super::HashGenerator)
//! owns one, and callers that fingerprint many schemas can hand the same
//! table from one generator to the next to avoid regenerating it.

/// Growable table of the first `n` primes, in ascending order.
#[derive(Clone, Debug)]
pub struct PrimeTable {
    primes: Vec<i64>,
}

impl Default for PrimeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimeTable {
    /// Returns a table that initially knows only the first prime.
    #[must_use]
    pub fn new() -> Self {
        Self { primes: vec![2] }
    }

    /// Number of primes computed so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.primes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    /// Returns the `n`th prime (zero-indexed), extending the table as needed.
    pub fn get(&mut self, n: usize) -> i64 {
        while self.primes.len() <= n {
            self.extend_one();
        }
        self.primes[n]
    }

    fn extend_one(&mut self) {
        let mut candidate = self.primes.last().copied().unwrap_or(1) + 1;
        loop {
            let is_prime = self
                .primes
                .iter()
                .take_while(|&&p| p * p <= candidate)
                .all(|&p| candidate % p != 0);
            if is_prime {
                self.primes.push(candidate);
                return;
            }
            candidate += 1;
        }
    }
}

#[cfg(test)]
mod test {
    use super::PrimeTable;

    #[test]
    fn first_primes() {
        let mut table = PrimeTable::new();
        let first: Vec<i64> = (0..10).map(|i| table.get(i)).collect();
        assert_eq!(first, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn thousandth() {
        let mut table = PrimeTable::new();
        assert_eq!(table.get(999), 7919);
    }
}
