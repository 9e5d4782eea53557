// Per-box random streams built on a 64-bit PCG generator
//
// The LCG multiplier and the RXS-M-XS output permutation are the usual PCG
// choices. Every stream has its own odd increment, which selects one of 2^63
// distinct sequences, so two boxes never walk the same sequence even when
// their states collide.

use rand::{RngCore, SeedableRng};

/// LCG multiplier
const PCG_MULT: u64 = 6364136223846793005;
/// Increment used when no stream is selected
const PCG_DEFAULT_INC: u64 = 1442695040888963407;
/// RXS-M-XS output multiplier
const PCG_OUT_MULT: u64 = 12605985483714917081;

/// SplitMix64 finaliser, used to spread seeds and subdivision codes over the
/// full 64-bit range before they become generator state.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// PCG random stream owned by a single box.
///
/// Streams are cheap value types, but a box never hands its stream out:
/// sampling always goes through `&mut BoundingBox`.
#[derive(Debug, PartialEq, Eq)]
pub struct FastRng {
    state: u64,
    inc: u64,
}

impl FastRng {
    /// Create a generator on the default stream.
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self::with_stream(seed, PCG_DEFAULT_INC >> 1)
    }

    /// Create a generator on the given stream. Only the low 63 bits of
    /// `stream` are significant.
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut rng = FastRng {
            state: 0,
            inc: (stream << 1) | 1,
        };
        rng.step();
        rng.state = rng.state.wrapping_add(seed);
        rng.step();
        rng
    }

    /// Derive the stream of a box from the root seed of its decomposition and
    /// its subdivision code. The same (seed, code) pair always yields the same
    /// sequence; different codes yield different streams.
    pub fn for_box(seed: u64, subdiv: u64) -> Self {
        let state_seed = mix64(seed ^ mix64(subdiv));
        let stream = mix64(subdiv.rotate_left(17) ^ seed.rotate_right(29));
        Self::with_stream(state_seed, stream)
    }

    #[inline(always)]
    fn step(&mut self) {
        self.state = PCG_MULT.wrapping_mul(self.state).wrapping_add(self.inc);
    }

    #[inline(always)]
    fn output(state: u64) -> u64 {
        let word = ((state >> ((state >> 59) + 5)) ^ state).wrapping_mul(PCG_OUT_MULT);
        (word >> 43) ^ word
    }

    /// Generate a random f64 in [0, 1)
    #[inline]
    pub fn random(&mut self) -> f64 {
        // 53 high bits -> exact dyadic rational in [0, 1)
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Generate a random f64 in [-1, 1)
    #[inline]
    pub fn symmetric(&mut self) -> f64 {
        2.0 * self.random() - 1.0
    }
}

impl SeedableRng for FastRng {
    type Seed = [u8; 16];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut state = [0u8; 8];
        let mut stream = [0u8; 8];
        state.copy_from_slice(&seed[..8]);
        stream.copy_from_slice(&seed[8..]);
        Self::with_stream(u64::from_le_bytes(state), u64::from_le_bytes(stream))
    }

    fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed)
    }
}

impl RngCore for FastRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.step();
        Self::output(self.state)
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut chunks = dest.chunks_exact_mut(8);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&self.next_u64().to_le_bytes());
        }
        let rest = chunks.into_remainder();
        if !rest.is_empty() {
            let bytes = self.next_u64().to_le_bytes();
            let n = rest.len();
            rest.copy_from_slice(&bytes[..n]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
