//! Adaptive thresholding of confidence maps.

use locmap_core::{Error, FittedMixture, MixtureFit, Result};
use ndarray::{Array, ArrayView, Dimension};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bmm::BetaMixtureEm;

/// How [`AdaptiveThresholder`] chooses the decision threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ThresholdPolicy {
    /// Literal threshold in the array's value range.
    Fixed(f64),
    /// Bimodal inter-class-variance search over the rescaled 8-bit range.
    Otsu,
    /// Two-component beta-mixture fit; the threshold is the mean of the
    /// second fitted component.
    Mixture,
}

/// Binary mask plus the threshold that produced it.
///
/// Created fresh per [`AdaptiveThresholder::threshold`] call; the mixture is
/// present only for [`ThresholdPolicy::Mixture`].
#[derive(Debug, Clone)]
pub struct ThresholdResult<D: Dimension> {
    /// Elementwise indicator: 1 where the value lies in `[tau, 1]`.
    pub mask: Array<u8, D>,
    /// The threshold that was applied.
    pub tau: f64,
    /// The fitted two-component mixture, for the mixture policy.
    pub mixture: Option<FittedMixture>,
}

/// Thresholds scalar arrays under a fixed, Otsu or mixture policy.
///
/// Generic over the mixture fitter so callers can substitute their own
/// estimator; the default is [`BetaMixtureEm`].
#[derive(Debug, Clone, Default)]
pub struct AdaptiveThresholder<F = BetaMixtureEm> {
    fitter: F,
}

impl AdaptiveThresholder<BetaMixtureEm> {
    /// Creates a thresholder backed by the default beta-mixture fitter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: MixtureFit> AdaptiveThresholder<F> {
    /// Creates a thresholder backed by a custom mixture fitter.
    #[must_use]
    pub fn with_fitter(fitter: F) -> Self {
        Self { fitter }
    }

    /// Thresholds `array` under `policy`.
    ///
    /// The input is never mutated. Values above 1 fall outside the `[tau, 1]`
    /// acceptance band by design: confidence maps are expected normalized to
    /// at most 1.
    ///
    /// # Errors
    /// - [`Error::DegenerateFit`] when the Otsu rescale sees a constant array
    ///   or the mixture fit fails to converge.
    /// - Whatever the configured fitter reports for invalid samples.
    pub fn threshold<D: Dimension>(
        &self,
        array: &ArrayView<'_, f64, D>,
        policy: ThresholdPolicy,
    ) -> Result<ThresholdResult<D>> {
        match policy {
            ThresholdPolicy::Fixed(tau) => Ok(ThresholdResult {
                mask: in_range_mask(array, tau),
                tau,
                mixture: None,
            }),
            ThresholdPolicy::Otsu => {
                let tau = otsu_tau(array)?;
                Ok(ThresholdResult {
                    mask: in_range_mask(array, tau),
                    tau,
                    mixture: None,
                })
            }
            ThresholdPolicy::Mixture => {
                let flat: Vec<f64> = array.iter().copied().collect();
                let mixture = self.fitter.estimate(&flat, 2)?;
                // Index-based foreground selection: the second component in
                // estimation order, not the larger-mean one.
                let tau = mixture
                    .components
                    .get(1)
                    .ok_or_else(|| Error::ShapeMismatch {
                        expected: "2 fitted components".to_string(),
                        got: format!("{}", mixture.len()),
                    })?
                    .dist
                    .mean();
                Ok(ThresholdResult {
                    mask: in_range_mask(array, tau),
                    tau,
                    mixture: Some(mixture),
                })
            }
        }
    }
}

/// Elementwise indicator of membership in `[tau, 1]`.
fn in_range_mask<D: Dimension>(array: &ArrayView<'_, f64, D>, tau: f64) -> Array<u8, D> {
    array.mapv(|v| u8::from(v >= tau && v <= 1.0))
}

/// Otsu's method on an array rescaled to the 8-bit range.
///
/// The observed `[min, max]` is mapped linearly onto 256 histogram bins, the
/// split maximizing inter-class variance is located, and the split is mapped
/// back to original value units.
fn otsu_tau<D: Dimension>(array: &ArrayView<'_, f64, D>) -> Result<f64> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in array.iter() {
        if !v.is_finite() {
            return Err(Error::DegenerateFit(format!(
                "non-finite value {v} in threshold input"
            )));
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if array.is_empty() {
        return Err(Error::DegenerateFit("empty threshold input".to_string()));
    }
    if hi - lo < f64::EPSILON {
        return Err(Error::DegenerateFit(
            "constant array, Otsu rescale is ill-defined".to_string(),
        ));
    }

    let mut histogram = [0u64; 256];
    let span = hi - lo;
    for &v in array.iter() {
        let bin = ((v - lo) / span * 255.0).round() as usize;
        histogram[bin.min(255)] += 1;
    }

    let total = array.len() as f64;
    let mut weighted_sum = 0.0;
    for (i, &count) in histogram.iter().enumerate() {
        weighted_sum += i as f64 * count as f64;
    }

    let mut sum_b = 0.0;
    let mut weight_b = 0.0;
    let mut max_variance = 0.0;
    let mut split = 0.0;

    for (i, &count) in histogram.iter().enumerate() {
        weight_b += count as f64;
        if weight_b == 0.0 {
            continue;
        }
        let weight_f = total - weight_b;
        if weight_f == 0.0 {
            break;
        }

        sum_b += i as f64 * count as f64;
        let mean_b = sum_b / weight_b;
        let mean_f = (weighted_sum - sum_b) / weight_f;
        let variance = weight_b * weight_f * (mean_b - mean_f).powi(2);

        if variance > max_variance {
            max_variance = variance;
            split = i as f64;
        }
    }

    Ok(lo + split / 255.0 * span)
}
