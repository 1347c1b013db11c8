//! Parameter samplers
//!
//! A sampler proposes an assignment for each trial and is told the score the
//! trial achieved. [`TpeSampler`] models good and bad regions of the space
//! with Parzen estimators once it has seen enough trials; [`RandomSampler`]
//! draws uniformly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;
use std::f64::consts::{PI, SQRT_2};
use tracing::debug;

use super::space::{HyperParams, SearchSpace};
use super::study::Trial;

/// Suggest/report protocol between the search engine and a sampler
pub trait Sampler {
    /// Propose parameters for trial `trial_index` given all finished trials.
    fn suggest(&mut self, trial_index: usize, history: &[Trial]) -> HyperParams;

    /// Receive the score of a trial; failed trials report `f64::NEG_INFINITY`.
    fn report(&mut self, trial_index: usize, score: f64);
}

fn sample_space(space: &SearchSpace, rng: &mut StdRng) -> HyperParams {
    space
        .iter()
        .map(|(name, domain)| (name.clone(), domain.sample_uniform(rng)))
        .collect()
}

/// Independent uniform draws
pub struct RandomSampler {
    space: SearchSpace,
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(space: SearchSpace, seed: u64) -> Self {
        Self {
            space,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for RandomSampler {
    fn suggest(&mut self, _trial_index: usize, _history: &[Trial]) -> HyperParams {
        sample_space(&self.space, &mut self.rng)
    }

    fn report(&mut self, _trial_index: usize, _score: f64) {}
}

/// TPE settings
#[derive(Debug, Clone, Copy)]
pub struct TpeOptions {
    /// Trials drawn uniformly before the model takes over
    pub n_startup_trials: usize,
    /// Draws from the good density per parameter
    pub n_ei_candidates: usize,
}

impl Default for TpeOptions {
    fn default() -> Self {
        Self {
            n_startup_trials: 10,
            n_ei_candidates: 24,
        }
    }
}

/// Tree-structured Parzen estimator
///
/// Completed trials are ranked by score; the top γ(n) = min(⌈0.1·n⌉, 25)
/// form the good set. Per parameter, candidates are drawn from the good
/// density l(x) and the one maximizing l(x)/g(x) is kept.
pub struct TpeSampler {
    space: SearchSpace,
    options: TpeOptions,
    rng: StdRng,
    pending: BTreeMap<usize, HyperParams>,
    /// Completed (params, score) pairs in report order
    observations: Vec<(HyperParams, f64)>,
}

impl TpeSampler {
    pub fn new(space: SearchSpace, seed: u64, options: TpeOptions) -> Self {
        Self {
            space,
            options,
            rng: StdRng::seed_from_u64(seed),
            pending: BTreeMap::new(),
            observations: Vec::new(),
        }
    }

    fn gamma(n: usize) -> usize {
        ((n as f64 * 0.1).ceil() as usize).clamp(1, 25)
    }

    fn suggest_from_model(&mut self) -> HyperParams {
        let mut ranked: Vec<&(HyperParams, f64)> = self.observations.iter().collect();
        // Stable sort keeps report order among equal scores
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let n_good = Self::gamma(ranked.len());
        let (good, bad) = ranked.split_at(n_good);

        let mut params = HyperParams::new();
        for (name, domain) in &self.space {
            let (low, high) = domain.internal_bounds();
            let values = |set: &[&(HyperParams, f64)]| -> Vec<f64> {
                set.iter()
                    .filter_map(|(p, _)| p.get(name).map(|v| domain.to_internal(*v)))
                    .collect()
            };
            let below = ParzenEstimator::new(&values(good), low, high);
            let above = ParzenEstimator::new(&values(bad), low, high);

            let mut best: Option<(f64, f64)> = None;
            for _ in 0..self.options.n_ei_candidates {
                let x = below.sample(&mut self.rng);
                let ratio = below.log_pdf(x) - above.log_pdf(x);
                if best.map_or(true, |(_, best_ratio)| ratio > best_ratio) {
                    best = Some((x, ratio));
                }
            }

            let x = best.map_or((low + high) / 2.0, |(x, _)| x);
            params.insert(name.clone(), domain.from_internal(x));
        }
        params
    }
}

impl Sampler for TpeSampler {
    fn suggest(&mut self, trial_index: usize, history: &[Trial]) -> HyperParams {
        let modelled = history.len() >= self.options.n_startup_trials && self.observations.len() >= 2;
        let params = if modelled {
            self.suggest_from_model()
        } else {
            sample_space(&self.space, &mut self.rng)
        };

        debug!(trial = trial_index, modelled, "tpe suggestion");
        self.pending.insert(trial_index, params.clone());
        params
    }

    fn report(&mut self, trial_index: usize, score: f64) {
        if let Some(params) = self.pending.remove(&trial_index) {
            // Failed trials carry no information about the objective surface
            if score.is_finite() {
                self.observations.push((params, score));
            }
        }
    }
}

/// Mixture of truncated Gaussians over `[low, high]`, plus a wide prior
/// component centred on the range
struct ParzenEstimator {
    mus: Vec<f64>,
    sigmas: Vec<f64>,
    low: f64,
    high: f64,
}

impl ParzenEstimator {
    fn new(observed: &[f64], low: f64, high: f64) -> Self {
        let range = high - low;
        let mut mus: Vec<f64> = observed.to_vec();
        mus.sort_by(f64::total_cmp);

        // Bandwidth is the wider gap to a neighbour (or bound)
        let min_sigma = range / (observed.len() as f64 + 1.0).min(100.0);
        let mut sigmas: Vec<f64> = (0..mus.len())
            .map(|i| {
                let left = if i == 0 { mus[i] - low } else { mus[i] - mus[i - 1] };
                let right = if i + 1 == mus.len() { high - mus[i] } else { mus[i + 1] - mus[i] };
                left.max(right).clamp(min_sigma, range)
            })
            .collect();

        mus.push(low + range / 2.0);
        sigmas.push(range);

        Self {
            mus,
            sigmas,
            low,
            high,
        }
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        let k = rng.gen_range(0..self.mus.len());
        let (mu, sigma) = (self.mus[k], self.sigmas[k]);
        let Ok(normal) = Normal::new(mu, sigma) else {
            return mu.clamp(self.low, self.high);
        };
        for _ in 0..32 {
            let x = normal.sample(rng);
            if (self.low..=self.high).contains(&x) {
                return x;
            }
        }
        mu.clamp(self.low, self.high)
    }

    fn log_pdf(&self, x: f64) -> f64 {
        let weight = 1.0 / self.mus.len() as f64;
        let density: f64 = self
            .mus
            .iter()
            .zip(&self.sigmas)
            .map(|(&mu, &sigma)| {
                let mass = normal_cdf((self.high - mu) / sigma) - normal_cdf((self.low - mu) / sigma);
                let z = (x - mu) / sigma;
                let pdf = (-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt());
                weight * pdf / mass.max(1e-12)
            })
            .sum();
        density.max(1e-300).ln()
    }
}

fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / SQRT_2))
}

/// Abramowitz and Stegun 7.1.26, absolute error below 1.5e-7
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}
