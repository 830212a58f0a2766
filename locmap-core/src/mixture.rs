//! Fitted mixture types and the mixture-estimation seam.

use crate::beta::Beta;
use crate::error::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One weighted component of a fitted mixture.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MixtureComponent {
    /// The fitted distribution.
    pub dist: Beta,
    /// Mixing weight of this component.
    pub weight: f64,
}

/// A mixture returned by a [`MixtureFit`] implementation.
///
/// Components are kept in estimation order; no reordering by mean is
/// performed anywhere downstream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FittedMixture {
    /// Weighted components in estimation order.
    pub components: Vec<MixtureComponent>,
    /// Number of iterations the fitter ran before converging.
    pub n_iter: usize,
}

impl FittedMixture {
    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if the mixture has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Trait for mixture estimation algorithms.
///
/// This is the external-collaborator seam of the localization pipeline: an
/// EM-style fitter that, given a bounded sample, returns per-component shape
/// parameters, mixing weights and an iteration count. Failure to converge or
/// degenerate input must be reported as an error, never as a silent
/// low-confidence fit.
pub trait MixtureFit {
    /// Fits an `n_components`-component mixture to `samples` in [0, 1].
    fn estimate(&self, samples: &[f64], n_components: usize) -> Result<FittedMixture>;

    /// Returns the name of the algorithm.
    fn name(&self) -> &'static str;
}
