//! Uniform randomness, injected as an explicit collaborator rather than
//! pulled from a global so the state machine is deterministic under test.

use rand_core::RngCore;

/// Uniform randomness needed by the MAC: small-range integers for backoff
/// slot selection and prime-offset indexing, and a real on `[0, 1)` for
/// the phase-2 coin flip.
///
/// Blanket-implemented for anything implementing [`rand_core::RngCore`],
/// so a hardware TRNG, a test fixture, or `rand`'s `SmallRng` all work
/// without writing an adapter.
pub trait Entropy {
    /// Draw uniformly from `0..bound`. `bound` must be positive.
    fn gen_range(&mut self, bound: u32) -> u32;

    /// Draw uniformly from `[0.0, 1.0)`.
    fn gen_unit(&mut self) -> f32;
}

impl<T: RngCore> Entropy for T {
    fn gen_range(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0, "gen_range bound must be positive");
        self.next_u32() % bound
    }

    fn gen_unit(&mut self) -> f32 {
        // Top 24 bits: exactly representable in an f32 mantissa, and the
        // division can never round up to 1.0.
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// A small, deterministic xorshift RNG for tests and for targets without a
/// hardware TRNG. Not suitable for anything security-sensitive — the MAC
/// only needs decorrelation among nodes, not unpredictability.
#[derive(Clone, Debug)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0xA5A5_A5A5 } else { seed },
        }
    }
}

impl RngCore for Xorshift32 {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_u32() as u64;
        let hi = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut chunks = dest.chunks_exact_mut(4);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&self.next_u32().to_le_bytes());
        }
        let rem = chunks.into_remainder();
        if !rem.is_empty() {
            let bytes = self.next_u32().to_le_bytes();
            rem.copy_from_slice(&bytes[..rem.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen_range_stays_in_bounds() {
        let mut rng = Xorshift32::new(12345);
        for _ in 0..1000 {
            let v = rng.gen_range(8);
            assert!(v < 8);
        }
    }

    #[test]
    fn gen_unit_stays_in_unit_interval() {
        let mut rng = Xorshift32::new(42);
        for _ in 0..1000 {
            let v = rng.gen_unit();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn zero_seed_does_not_stall() {
        let mut rng = Xorshift32::new(0);
        assert_ne!(rng.next_u32(), 0);
    }
}
