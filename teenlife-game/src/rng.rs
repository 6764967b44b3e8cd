//! Injectable randomness: seeded per-domain streams and scripted test rolls.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::VecDeque;

/// Simulation domain a random draw belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollStream {
    /// Skip-school consequence draws.
    School,
    /// Exam score jitter.
    Exam,
    /// Event selection and trigger rolls.
    Event,
    /// Assignment score draws and subject picks.
    Assignment,
}

/// Single seam every probabilistic branch goes through.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)` from the given stream.
    fn roll(&mut self, stream: RollStream) -> f64;

    /// Uniform draw in `[low, high)`.
    fn roll_range(&mut self, stream: RollStream, low: f64, high: f64) -> f64 {
        low + (high - low) * self.roll(stream)
    }

    /// Uniform index in `0..len`; returns 0 for empty ranges.
    fn roll_index(&mut self, stream: RollStream, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let scaled = self.roll(stream) * crate::numbers::usize_to_f64(len);
        let idx = num_traits::cast::<f64, usize>(scaled.floor()).unwrap_or(0);
        idx.min(len - 1)
    }

    /// Restart the source from `seed`. Scripted sources ignore this.
    fn reseed(&mut self, _seed: u64) {}
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Deterministic bundle of RNG streams segregated by simulation domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    school: CountingRng<ChaCha20Rng>,
    exam: CountingRng<ChaCha20Rng>,
    event: CountingRng<ChaCha20Rng>,
    assignment: CountingRng<ChaCha20Rng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            school: CountingRng::new(derive_stream_seed(seed, b"school")),
            exam: CountingRng::new(derive_stream_seed(seed, b"exam")),
            event: CountingRng::new(derive_stream_seed(seed, b"event")),
            assignment: CountingRng::new(derive_stream_seed(seed, b"assignment")),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of draws taken from a stream so far.
    #[must_use]
    pub const fn draws(&self, stream: RollStream) -> u64 {
        match stream {
            RollStream::School => self.school.draws(),
            RollStream::Exam => self.exam.draws(),
            RollStream::Event => self.event.draws(),
            RollStream::Assignment => self.assignment.draws(),
        }
    }

    const fn stream_mut(&mut self, stream: RollStream) -> &mut CountingRng<ChaCha20Rng> {
        match stream {
            RollStream::School => &mut self.school,
            RollStream::Exam => &mut self.exam,
            RollStream::Event => &mut self.event,
            RollStream::Assignment => &mut self.assignment,
        }
    }
}

impl RandomSource for RngBundle {
    fn roll(&mut self, stream: RollStream) -> f64 {
        self.stream_mut(stream).r#gen::<f64>()
    }

    fn reseed(&mut self, seed: u64) {
        *self = Self::from_user_seed(seed);
    }
}

/// Fixed sequence of rolls for deterministic tests.
///
/// Values are consumed in order regardless of stream; once exhausted the
/// fallback value is returned.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    queue: VecDeque<f64>,
    fallback: f64,
    consumed: Vec<RollStream>,
}

impl ScriptedRolls {
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            queue: values.into_iter().collect(),
            fallback: 0.0,
            consumed: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn push(&mut self, value: f64) {
        self.queue.push_back(value);
    }

    /// Streams that have been drawn from, in order.
    #[must_use]
    pub fn consumed(&self) -> &[RollStream] {
        &self.consumed
    }
}

impl RandomSource for ScriptedRolls {
    fn roll(&mut self, stream: RollStream) -> f64 {
        self.consumed.push(stream);
        self.queue
            .pop_front()
            .unwrap_or(self.fallback)
            .clamp(0.0, 1.0 - f64::EPSILON)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
