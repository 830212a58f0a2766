//! Cross-image accumulation of fitted mixtures.
//!
//! One mixture is typically fed per processed image; `summarize` is the
//! reporting statistic (it replaces figure plotting): mean and spread of the
//! per-component densities over a fixed grid, plus a kernel density estimate
//! of the effective thresholds.

use locmap_core::{Error, FittedMixture, MixtureComponent, Result};
use ndarray::Array1;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Densities are clamped here before averaging; beta densities diverge near
/// the support boundaries for shape parameters below one.
const DENSITY_CLAMP: f64 = 50.0;

/// Accumulates mixtures across invocations and computes aggregate statistics.
///
/// State grows append-only via [`feed`](Self::feed); summarizing never
/// mutates, so it can be called repeatedly as mixtures keep arriving.
/// Single-writer: not safe for concurrent feeding without external
/// synchronization.
#[derive(Debug, Clone)]
pub struct MixtureAccumulator {
    n_components: usize,
    grid: Array1<f64>,
    mixtures: Vec<FittedMixture>,
}

/// Aggregate statistics over the fed mixtures, evaluated on a fixed grid.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MixtureSummary {
    /// Evaluation grid over [0, 1].
    pub grid: Array1<f64>,
    /// Pointwise mean of the clamped densities, one curve per component.
    pub density_mean: Vec<Array1<f64>>,
    /// Pointwise sample standard deviation (divisor N-1) of the clamped
    /// densities, one curve per component. Present with two or more fed
    /// mixtures.
    pub density_stdev: Option<Vec<Array1<f64>>>,
    /// Gaussian kernel density estimate of the effective thresholds (the
    /// mean of each mixture's last component). Present with two or more fed
    /// mixtures.
    pub threshold_kde: Option<Array1<f64>>,
}

impl MixtureAccumulator {
    /// Creates an accumulator for `n_components`-component mixtures with an
    /// `n_pts`-point evaluation grid over [0, 1].
    #[must_use]
    pub fn new(n_components: usize, n_pts: usize) -> Self {
        Self {
            n_components,
            grid: Array1::linspace(0.0, 1.0, n_pts),
            mixtures: Vec::new(),
        }
    }

    /// Number of mixtures fed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mixtures.len()
    }

    /// Returns true if no mixtures have been fed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mixtures.is_empty()
    }

    /// The evaluation grid.
    #[must_use]
    pub fn grid(&self) -> &Array1<f64> {
        &self.grid
    }

    /// Appends one fitted mixture.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] when the mixture's component count
    /// differs from the configured one.
    pub fn feed(&mut self, mixture: FittedMixture) -> Result<()> {
        if mixture.len() != self.n_components {
            return Err(Error::ShapeMismatch {
                expected: format!("{} mixture components", self.n_components),
                got: format!("{}", mixture.len()),
            });
        }
        self.mixtures.push(mixture);
        Ok(())
    }

    /// Computes aggregate statistics over the fed mixtures.
    ///
    /// # Errors
    /// - [`Error::InsufficientData`] when no mixture has been fed.
    /// - [`Error::DegenerateFit`] when the KDE bandwidth would be zero
    ///   (all effective thresholds identical).
    pub fn summarize(&self) -> Result<MixtureSummary> {
        if self.mixtures.is_empty() {
            return Err(Error::InsufficientData {
                operation: "summarize",
                required: 1,
                have: 0,
            });
        }

        let n = self.mixtures.len();
        let n_pts = self.grid.len();

        let mut density_mean = vec![Array1::<f64>::zeros(n_pts); self.n_components];
        for mixture in &self.mixtures {
            for (c, component) in mixture.components.iter().enumerate() {
                density_mean[c] += &self.clamped_density(component);
            }
        }
        for curve in &mut density_mean {
            *curve /= n as f64;
        }

        if n < 2 {
            return Ok(MixtureSummary {
                grid: self.grid.clone(),
                density_mean,
                density_stdev: None,
                threshold_kde: None,
            });
        }

        let mut sq_err = vec![Array1::<f64>::zeros(n_pts); self.n_components];
        for mixture in &self.mixtures {
            for (c, component) in mixture.components.iter().enumerate() {
                let diff = self.clamped_density(component) - &density_mean[c];
                sq_err[c] += &diff.mapv(|d| d * d);
            }
        }
        let density_stdev: Vec<Array1<f64>> = sq_err
            .into_iter()
            .map(|curve| curve.mapv(|s| (s / (n - 1) as f64).sqrt()))
            .collect();

        let mut thresholds = Vec::with_capacity(n);
        for mixture in &self.mixtures {
            let last = mixture.components.last().ok_or_else(|| Error::ShapeMismatch {
                expected: "at least 1 mixture component".to_string(),
                got: "0".to_string(),
            })?;
            thresholds.push(last.dist.mean());
        }
        let threshold_kde = gaussian_kde(&thresholds, &self.grid)?;

        Ok(MixtureSummary {
            grid: self.grid.clone(),
            density_mean,
            density_stdev: Some(density_stdev),
            threshold_kde: Some(threshold_kde),
        })
    }

    /// A component's density on the grid, clamped to `[0, DENSITY_CLAMP]`.
    fn clamped_density(&self, component: &MixtureComponent) -> Array1<f64> {
        self.grid
            .mapv(|x| component.dist.pdf(x).clamp(0.0, DENSITY_CLAMP))
    }
}

/// 1-D Gaussian kernel density estimate with Scott's-rule bandwidth.
fn gaussian_kde(samples: &[f64], grid: &Array1<f64>) -> Result<Array1<f64>> {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|&s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
    if var < 1e-24 {
        return Err(Error::DegenerateFit(
            "threshold sample has no variation, KDE bandwidth is zero".to_string(),
        ));
    }

    let bandwidth = n.powf(-0.2) * var.sqrt();
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    Ok(grid.mapv(|x| {
        samples
            .iter()
            .map(|&s| (-0.5 * ((x - s) / bandwidth).powi(2)).exp())
            .sum::<f64>()
            * norm
    }))
}
