//! Two-component beta mixture estimation.
//!
//! A small from-scratch EM routine: responsibilities from weighted beta
//! densities in the E-step, weighted moment matching of the shape parameters
//! in the M-step. This is the default [`MixtureFit`] implementation used by
//! the mixture threshold policy.

use locmap_core::{Beta, Error, FittedMixture, MixtureComponent, MixtureFit, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Samples and component means are kept this far inside (0, 1) so densities
/// stay finite at the support boundaries.
const SUPPORT_MARGIN: f64 = 1e-6;

/// Floor on per-component weighted variance; moment matching divides by it.
const VARIANCE_FLOOR: f64 = 1e-10;

/// Configuration for [`BetaMixtureEm`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BmmConfig {
    /// Maximum number of EM iterations (default: 100).
    pub max_iterations: usize,
    /// Convergence tolerance on the mean log-likelihood change (default: 1e-6).
    pub tolerance: f64,
}

impl Default for BmmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl BmmConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of EM iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// EM fitter for a two-component beta mixture on [0, 1].
///
/// Component 0 is initialized from the samples below the sample mean and
/// component 1 from those above, so estimation order tracks mean order for
/// bimodal foreground/background separation.
#[derive(Debug, Clone, Default)]
pub struct BetaMixtureEm {
    config: BmmConfig,
}

impl BetaMixtureEm {
    /// Creates a fitter with the given configuration.
    #[must_use]
    pub fn new(config: BmmConfig) -> Self {
        Self { config }
    }

    /// Moment-matched shape parameters from a weighted mean and variance.
    fn match_moments(mean: f64, var: f64) -> (f64, f64) {
        let mean = mean.clamp(SUPPORT_MARGIN, 1.0 - SUPPORT_MARGIN);
        // Beta variance is bounded by m(1-m); keep the estimate inside so the
        // common factor stays positive.
        let bound = mean * (1.0 - mean);
        let var = var.clamp(VARIANCE_FLOOR, bound * 0.999);
        let common = bound / var - 1.0;
        let alpha = (mean * common).clamp(1e-3, 1e6);
        let beta = ((1.0 - mean) * common).clamp(1e-3, 1e6);
        (alpha, beta)
    }
}

impl MixtureFit for BetaMixtureEm {
    fn estimate(&self, samples: &[f64], n_components: usize) -> Result<FittedMixture> {
        if n_components != 2 {
            return Err(Error::InvalidParameter(format!(
                "BetaMixtureEm supports exactly 2 components, requested {n_components}"
            )));
        }
        if samples.is_empty() {
            return Err(Error::DegenerateFit("empty sample".to_string()));
        }
        for &v in samples {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(Error::InvalidParameter(format!(
                    "samples must lie in [0, 1], got {v}"
                )));
            }
        }

        let n = samples.len() as f64;
        let x: Vec<f64> = samples
            .iter()
            .map(|&v| v.clamp(SUPPORT_MARGIN, 1.0 - SUPPORT_MARGIN))
            .collect();

        let sample_mean = x.iter().sum::<f64>() / n;
        let sample_var = x.iter().map(|&v| (v - sample_mean).powi(2)).sum::<f64>() / n;
        if sample_var < 1e-12 {
            return Err(Error::DegenerateFit(
                "sample has no variation, cannot separate two components".to_string(),
            ));
        }

        // Soft split at the sample mean: component 0 low, component 1 high.
        let mut resp: Vec<[f64; 2]> = x
            .iter()
            .map(|&v| if v < sample_mean { [0.9, 0.1] } else { [0.1, 0.9] })
            .collect();

        let mut params = [(1.0, 1.0); 2];
        let mut weights = [0.5; 2];
        let mut prev_ll = f64::NEG_INFINITY;
        let mut n_iter = self.config.max_iterations;

        for iter in 0..self.config.max_iterations {
            // M-step: weighted moment matching per component.
            for c in 0..2 {
                let mass: f64 = resp.iter().map(|r| r[c]).sum::<f64>().max(VARIANCE_FLOOR);
                let mean = resp
                    .iter()
                    .zip(&x)
                    .map(|(r, &v)| r[c] * v)
                    .sum::<f64>()
                    / mass;
                let var = resp
                    .iter()
                    .zip(&x)
                    .map(|(r, &v)| r[c] * (v - mean).powi(2))
                    .sum::<f64>()
                    / mass;
                params[c] = Self::match_moments(mean, var);
                weights[c] = (mass / n).clamp(SUPPORT_MARGIN, 1.0);
            }

            let dists = [
                Beta::new(params[0].0, params[0].1)?,
                Beta::new(params[1].0, params[1].1)?,
            ];

            // E-step: responsibilities via log-sum-exp.
            let mut ll = 0.0;
            for (r, &v) in resp.iter_mut().zip(&x) {
                let log_joint = [
                    weights[0].ln() + dists[0].ln_pdf(v),
                    weights[1].ln() + dists[1].ln_pdf(v),
                ];
                let max = log_joint[0].max(log_joint[1]);
                let norm = (log_joint[0] - max).exp() + (log_joint[1] - max).exp();
                r[0] = (log_joint[0] - max).exp() / norm;
                r[1] = (log_joint[1] - max).exp() / norm;
                ll += max + norm.ln();
            }
            ll /= n;

            if !ll.is_finite() {
                return Err(Error::DegenerateFit(
                    "log-likelihood diverged during EM".to_string(),
                ));
            }
            if (ll - prev_ll).abs() < self.config.tolerance {
                n_iter = iter + 1;
                break;
            }
            prev_ll = ll;
        }

        Ok(FittedMixture {
            components: vec![
                MixtureComponent {
                    dist: Beta::new(params[0].0, params[0].1)?,
                    weight: weights[0],
                },
                MixtureComponent {
                    dist: Beta::new(params[1].0, params[1].1)?,
                    weight: weights[1],
                },
            ],
            n_iter,
        })
    }

    fn name(&self) -> &'static str {
        "BetaMixtureEm"
    }
}
