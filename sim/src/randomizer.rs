//! Seeded perturbations applied to scenario gas usage.
//!
//! Every randomizer owns its own [`ChaCha8Rng`] seeded from an explicit
//! `u64`, so a run is reproducible from its [`RandomizerConfig`] alone.
//! [`Randomizer::reset`] re-seeds as well as clearing state: replaying after
//! a reset yields the same sequence as a fresh instance.

use {
    crate::error::SimError,
    rand::{Rng, SeedableRng},
    rand_chacha::ChaCha8Rng,
    serde::{Deserialize, Serialize},
    std::f64::consts::PI,
};

pub trait Randomizer: std::fmt::Debug {
    /// Perturb `gas_used`, never returning more than `max_block_size`
    /// unless the input already exceeded it and was left untouched.
    fn add_randomness(&mut self, gas_used: u64, max_block_size: u64) -> u64;

    fn reset(&mut self);
}

/// Multiplies gas by `1 + N(0, std_dev)`, floored at zero.
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    rng: ChaCha8Rng,
    seed: u64,
    std_dev: f64,
}

impl GaussianNoise {
    pub fn new(seed: u64, std_dev: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            std_dev,
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Standard normal sample via Box–Muller.
    fn sample_standard_normal(&mut self) -> f64 {
        // shift into (0, 1] so the log stays finite
        let u1 = 1.0 - self.rng.random::<f64>();
        let u2 = self.rng.random::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl Randomizer for GaussianNoise {
    fn add_randomness(&mut self, gas_used: u64, max_block_size: u64) -> u64 {
        if self.std_dev == 0.0 {
            return gas_used;
        }
        let multiplier = 1.0 + self.sample_standard_normal() * self.std_dev;
        // `as` saturates: negative multipliers land on zero
        let perturbed = (gas_used as f64 * multiplier) as u64;
        perturbed.min(max_block_size)
    }

    fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}

/// Randomly enters bursts during which gas is multiplied by `intensity`.
#[derive(Debug, Clone)]
pub struct BurstRandomizer {
    rng: ChaCha8Rng,
    seed: u64,
    probability: f64,
    duration_min: u32,
    duration_max: u32,
    intensity: f64,
    in_burst: bool,
    blocks_left: u32,
}

impl BurstRandomizer {
    pub fn new(
        seed: u64,
        probability: f64,
        duration_min: u32,
        duration_max: u32,
        intensity: f64,
    ) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            probability,
            duration_min,
            duration_max: duration_max.max(duration_min),
            intensity,
            in_burst: false,
            blocks_left: 0,
        }
    }

    pub fn in_burst(&self) -> bool {
        self.in_burst
    }

    pub fn blocks_left(&self) -> u32 {
        self.blocks_left
    }

    fn advance(&mut self) {
        if self.in_burst {
            self.blocks_left = self.blocks_left.saturating_sub(1);
            if self.blocks_left == 0 {
                self.in_burst = false;
            }
        } else if self.rng.random::<f64>() < self.probability {
            self.in_burst = true;
            self.blocks_left = self
                .rng
                .random_range(self.duration_min..=self.duration_max);
        }
    }
}

impl Randomizer for BurstRandomizer {
    fn add_randomness(&mut self, gas_used: u64, max_block_size: u64) -> u64 {
        if self.probability == 0.0 {
            return gas_used;
        }
        self.advance();
        if !self.in_burst {
            return gas_used;
        }
        ((gas_used as f64 * self.intensity) as u64).min(max_block_size)
    }

    fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.in_burst = false;
        self.blocks_left = 0;
    }
}

/// Applies each inner randomizer in order.
#[derive(Debug, Default)]
pub struct CompoundRandomizer {
    randomizers: Vec<Box<dyn Randomizer + Send>>,
}

impl CompoundRandomizer {
    pub fn new(randomizers: Vec<Box<dyn Randomizer + Send>>) -> Self {
        Self { randomizers }
    }

    pub fn push(&mut self, randomizer: impl Randomizer + Send + 'static) {
        self.randomizers.push(Box::new(randomizer));
    }

    pub fn len(&self) -> usize {
        self.randomizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.randomizers.is_empty()
    }
}

impl Randomizer for CompoundRandomizer {
    fn add_randomness(&mut self, gas_used: u64, max_block_size: u64) -> u64 {
        self.randomizers
            .iter_mut()
            .fold(gas_used, |gas, randomizer| {
                randomizer.add_randomness(gas, max_block_size)
            })
    }

    fn reset(&mut self) {
        self.randomizers.iter_mut().for_each(|r| r.reset());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizerConfig {
    /// Seed shared by every randomizer built from this config.
    pub seed: u64,
    /// Standard deviation of the multiplicative noise; 0.1 is 10 % variation.
    pub gaussian_noise: f64,
    /// Chance of a burst starting on any block outside one.
    pub burst_probability: f64,
    /// Burst length bounds in blocks (inclusive).
    pub burst_duration_min: u32,
    pub burst_duration_max: u32,
    /// Gas multiplier while bursting.
    pub burst_intensity: f64,
}

impl Default for RandomizerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            gaussian_noise: 0.0,
            burst_probability: 0.0,
            burst_duration_min: 3,
            burst_duration_max: 10,
            burst_intensity: 1.5,
        }
    }
}

impl RandomizerConfig {
    pub fn is_noop(&self) -> bool {
        self.gaussian_noise == 0.0 && self.burst_probability == 0.0
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |reason: String| Err(SimError::InvalidRandomizer { reason });

        if !(0.0..=1.0).contains(&self.gaussian_noise) {
            return invalid(format!(
                "gaussian noise ({:.3}) must be between 0.0 and 1.0",
                self.gaussian_noise
            ));
        }
        if !(0.0..=1.0).contains(&self.burst_probability) {
            return invalid(format!(
                "burst probability ({:.3}) must be between 0.0 and 1.0",
                self.burst_probability
            ));
        }
        if self.burst_probability > 0.0 {
            if self.burst_duration_min == 0 {
                return invalid("burst duration min must be positive".to_string());
            }
            if self.burst_duration_max < self.burst_duration_min {
                return invalid(format!(
                    "burst duration max ({}) must be >= min ({})",
                    self.burst_duration_max, self.burst_duration_min
                ));
            }
            if self.burst_intensity.is_nan() || self.burst_intensity <= 0.0 {
                return invalid(format!(
                    "burst intensity ({:.3}) must be positive",
                    self.burst_intensity
                ));
            }
        }
        Ok(())
    }

    /// Noise first, then bursts. Disabled stages are left out.
    pub fn build(&self) -> Result<CompoundRandomizer, SimError> {
        self.validate()?;
        let mut compound = CompoundRandomizer::default();
        if self.gaussian_noise > 0.0 {
            compound.push(GaussianNoise::new(self.seed, self.gaussian_noise));
        }
        if self.burst_probability > 0.0 {
            // decorrelate from the noise stream
            compound.push(BurstRandomizer::new(
                self.seed.wrapping_add(1),
                self.burst_probability,
                self.burst_duration_min,
                self.burst_duration_max,
                self.burst_intensity,
            ));
        }
        Ok(compound)
    }
}
