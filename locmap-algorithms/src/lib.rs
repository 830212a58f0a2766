//! locmap-algorithms: Localization engines for confidence maps.
//!
//! This crate turns a continuous 2-D confidence map into a discrete set of
//! object locations:
//! - **Thresholding** - fixed, Otsu or two-component beta-mixture policies
//! - **Accumulation** - cross-image statistics of fitted mixtures
//! - **Clustering** - spherical Gaussian-mixture centroids of mask pixels
//! - **Rendering** - heatmap overlay and marker painting helpers
//!
#![warn(missing_docs)]

mod accumulator;
mod bmm;
mod gmm;
mod render;
mod threshold;

pub use accumulator::{MixtureAccumulator, MixtureSummary};
pub use bmm::{BetaMixtureEm, BmmConfig};
pub use gmm::{ClusterConfig, DensityClusterer};
pub use render::{overlay_heatmap, paint_markers, MarkerColor};
pub use threshold::{AdaptiveThresholder, ThresholdPolicy, ThresholdResult};

// Re-export the core seam types alongside the engines that consume them.
pub use locmap_core::mixture::{FittedMixture, MixtureComponent, MixtureFit};
