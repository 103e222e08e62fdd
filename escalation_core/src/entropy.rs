//! Injected randomness.
//!
//! Every stochastic branch in the engine draws through [`RandomSource`], so a fixed seed
//! (or a scripted draw list) replays a campaign exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub trait RandomSource: Send + Sync {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f32;

    /// Uniform draw in `[min, max]`; returns `min` when the range is empty.
    fn range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_unit()
    }

    /// Same as [`RandomSource::range`] with `f64` bounds, used for countdowns.
    fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_unit() as f64
    }

    /// Index in `0..len`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize {
        let index = (self.next_unit() * len as f32) as usize;
        index.min(len.saturating_sub(1))
    }
}

/// ChaCha8-backed source seeded from a `u64`.
#[derive(Debug, Clone)]
pub struct SeededEntropy {
    rng: ChaCha8Rng,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededEntropy {
    fn next_unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedEntropy {
    draws: Vec<f32>,
    cursor: usize,
}

impl ScriptedEntropy {
    pub fn new(draws: Vec<f32>) -> Self {
        Self { draws, cursor: 0 }
    }

    /// A source that always returns the same draw.
    pub fn constant(draw: f32) -> Self {
        Self::new(vec![draw])
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedEntropy {
    fn next_unit(&mut self) -> f32 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        draw.clamp(0.0, 0.999_999)
    }
}
