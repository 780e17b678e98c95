/// Seedable random stream owned by one session. Drives the probabilistic
/// transitions of the bit history state machine, so an encoder and a
/// decoder seeded alike make identical choices.
#[derive(Clone, Debug)]
pub struct Random {
    rng: fastrand::Rng,
}
impl Random {
    pub fn new(seed: u64) -> Random {
        Random {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
    pub fn next_u32(&mut self) -> u32 {
        self.rng.u32(..)
    }
    /// Returns k random bits (1..=32).
    pub fn bits(&mut self, k: u32) -> u32 {
        debug_assert!(k > 0 && k <= 32);
        self.next_u32() >> (32 - k)
    }
}
