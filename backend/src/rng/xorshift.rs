//! xorshift64* random number generator
//!
//! Same seed → same sequence. Replays are reproduced from the map seed, so
//! any provider-side randomness must come from here.

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use arena_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let slot = rng.index(8); // [0, 8)
/// assert!(slot < 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with the given seed
    ///
    /// A zero seed is mapped to 1 (xorshift has a fixed point at zero).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate the next raw 64-bit value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate an f64 in `[0.0, 1.0)`
    pub fn next_f64(&mut self) -> f64 {
        (self.next() >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Pick an index in `[0, len)` by scaling a uniform float
    ///
    /// # Panics
    /// Panics if `len` is zero
    pub fn index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot pick from an empty set");
        let picked = (self.next_f64() * len as f64) as usize;
        // next_f64 < 1.0, but guard the float rounding edge anyway
        picked.min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let mut rng = RngManager::new(0);
        assert_eq!(rng, RngManager::new(1));
        assert_ne!(rng.next(), 0);
    }

    #[test]
    #[should_panic(expected = "cannot pick from an empty set")]
    fn test_index_empty_set() {
        let mut rng = RngManager::new(12345);
        rng.index(0);
    }

    #[test]
    fn test_index_covers_all_slots() {
        let mut rng = RngManager::new(7);
        let mut seen = [false; 8];
        for _ in 0..1000 {
            seen[rng.index(8)] = true;
        }
        assert!(seen.iter().all(|s| *s), "some direction was never drawn");
    }
}
