//! Spherical Gaussian-mixture clustering of binary masks.

use locmap_core::Result;
use ndarray::{Array2, ArrayView2};
use rand::seq::index;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Regularization added to every variance estimate; keeps the E-step finite
/// when a component collapses onto a single point.
const REG_VARIANCE: f64 = 1e-6;

/// Configuration for [`DensityClusterer`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterConfig {
    /// Requested number of clusters (Gaussians) to fit.
    pub n_clusters: usize,
    /// Cap on the number of foreground pixels used for fitting; exceeding
    /// masks are subsampled uniformly without replacement (default: none).
    pub max_points: Option<usize>,
    /// Maximum number of EM iterations (default: 100).
    pub max_iterations: usize,
    /// Convergence tolerance on the mean log-likelihood change (default: 1e-3).
    pub tolerance: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_clusters: 1,
            max_points: None,
            max_iterations: 100,
            tolerance: 1e-3,
        }
    }
}

impl ClusterConfig {
    /// Creates a configuration requesting `n_clusters` clusters.
    #[must_use]
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Self::default()
        }
    }

    /// Sets the foreground-pixel cap.
    #[must_use]
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = Some(max_points);
        self
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

/// Clusters the foreground pixels of a binary mask into per-object centroids
/// with a spherical-covariance Gaussian mixture.
///
/// Subsampling and initialization are randomized; determinism is the
/// caller's responsibility via [`cluster_with_rng`](Self::cluster_with_rng).
#[derive(Debug, Clone, Default)]
pub struct DensityClusterer {
    config: ClusterConfig,
}

impl DensityClusterer {
    /// Creates a clusterer with the given configuration.
    #[must_use]
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Clusters `mask` using the process-wide thread RNG.
    ///
    /// # Errors
    /// Propagates [`cluster_with_rng`](Self::cluster_with_rng) errors.
    pub fn cluster(&self, mask: &ArrayView2<'_, u8>) -> Result<Array2<i64>> {
        self.cluster_with_rng(mask, &mut rand::thread_rng())
    }

    /// Clusters `mask` with a caller-supplied RNG.
    ///
    /// Any nonzero mask element is foreground. Returns one rounded (y, x)
    /// row per fitted component; an all-zero mask yields an empty (0 x 2)
    /// set. The component count is capped at the number of foreground pixels
    /// so the fit degrades gracefully instead of failing.
    ///
    /// # Errors
    /// Currently infallible for 2-D masks; the `Result` return keeps the
    /// seam stable for fitters that can reject inputs.
    pub fn cluster_with_rng<R: Rng>(
        &self,
        mask: &ArrayView2<'_, u8>,
        rng: &mut R,
    ) -> Result<Array2<i64>> {
        let mut points: Vec<[f64; 2]> = mask
            .indexed_iter()
            .filter(|(_, &v)| v != 0)
            .map(|((y, x), _)| [y as f64, x as f64])
            .collect();

        if points.is_empty() {
            return Ok(Array2::zeros((0, 2)));
        }

        if let Some(cap) = self.config.max_points {
            if points.len() > cap {
                points = index::sample(rng, points.len(), cap)
                    .iter()
                    .map(|i| points[i])
                    .collect();
            }
        }

        // Never more components than points; at least one.
        let k = self.config.n_clusters.min(points.len()).max(1);
        let means = fit_spherical_gmm(
            &points,
            k,
            self.config.max_iterations,
            self.config.tolerance,
            rng,
        );

        let mut centroids = Array2::zeros((means.len(), 2));
        for (i, mean) in means.iter().enumerate() {
            centroids[[i, 0]] = mean[0].round() as i64;
            centroids[[i, 1]] = mean[1].round() as i64;
        }
        Ok(centroids)
    }
}

/// EM for a spherical-covariance Gaussian mixture in the plane.
///
/// Single random initialization: starting means are seeded with
/// squared-distance weighting (the k-means++ rule), variances start at the
/// pooled variance, weights uniform.
fn fit_spherical_gmm<R: Rng>(
    points: &[[f64; 2]],
    k: usize,
    max_iterations: usize,
    tolerance: f64,
    rng: &mut R,
) -> Vec<[f64; 2]> {
    let n = points.len();
    let nf = n as f64;

    let mut means = seed_means(points, k, rng);

    let grand = centroid(points);
    let pooled = points
        .iter()
        .map(|p| sq_dist(p, &grand))
        .sum::<f64>()
        / (2.0 * nf)
        + REG_VARIANCE;
    let mut variances = vec![pooled; k];
    let mut weights = vec![1.0 / k as f64; k];

    let mut resp = vec![vec![0.0; k]; n];
    let mut prev_ll = f64::NEG_INFINITY;

    for _ in 0..max_iterations {
        // E-step: spherical Gaussian log-densities, normalized per point.
        let mut ll = 0.0;
        for (r, p) in resp.iter_mut().zip(points) {
            let mut max_log = f64::NEG_INFINITY;
            for c in 0..k {
                let var = variances[c];
                let log_joint = weights[c].ln()
                    - (2.0 * std::f64::consts::PI * var).ln()
                    - sq_dist(p, &means[c]) / (2.0 * var);
                r[c] = log_joint;
                max_log = max_log.max(log_joint);
            }
            let mut norm = 0.0;
            for v in r.iter_mut() {
                *v = (*v - max_log).exp();
                norm += *v;
            }
            for v in r.iter_mut() {
                *v /= norm;
            }
            ll += max_log + norm.ln();
        }
        ll /= nf;

        // M-step.
        for c in 0..k {
            let mass: f64 = resp.iter().map(|r| r[c]).sum::<f64>().max(1e-10);
            let mut mean = [0.0, 0.0];
            for (r, p) in resp.iter().zip(points) {
                mean[0] += r[c] * p[0];
                mean[1] += r[c] * p[1];
            }
            mean[0] /= mass;
            mean[1] /= mass;

            let var = resp
                .iter()
                .zip(points)
                .map(|(r, p)| r[c] * sq_dist(p, &mean))
                .sum::<f64>()
                / (2.0 * mass)
                + REG_VARIANCE;

            means[c] = mean;
            variances[c] = var;
            weights[c] = mass / nf;
        }

        if (ll - prev_ll).abs() < tolerance {
            break;
        }
        prev_ll = ll;
    }

    means
}

/// k-means++ seeding: the first mean is uniform, each further mean is drawn
/// with probability proportional to its squared distance from the nearest
/// mean chosen so far.
fn seed_means<R: Rng>(points: &[[f64; 2]], k: usize, rng: &mut R) -> Vec<[f64; 2]> {
    let n = points.len();
    let mut means = Vec::with_capacity(k);
    means.push(points[rng.gen_range(0..n)]);

    let mut nearest_sq: Vec<f64> = points.iter().map(|p| sq_dist(p, &means[0])).collect();
    while means.len() < k {
        let total: f64 = nearest_sq.iter().sum();
        let idx = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &d) in nearest_sq.iter().enumerate() {
                if target <= d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            rng.gen_range(0..n)
        };
        let next = points[idx];
        for (d, p) in nearest_sq.iter_mut().zip(points) {
            *d = d.min(sq_dist(p, &next));
        }
        means.push(next);
    }
    means
}

fn centroid(points: &[[f64; 2]]) -> [f64; 2] {
    let nf = points.len() as f64;
    let mut c = [0.0, 0.0];
    for p in points {
        c[0] += p[0];
        c[1] += p[1];
    }
    [c[0] / nf, c[1] / nf]
}

fn sq_dist(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Mask with two solid square blobs far apart.
    fn two_blob_mask() -> Array2<u8> {
        let mut mask = Array2::zeros((64, 64));
        for y in 8..13 {
            for x in 8..13 {
                mask[[y, x]] = 1;
            }
        }
        for y in 48..53 {
            for x in 50..55 {
                mask[[y, x]] = 255;
            }
        }
        mask
    }

    fn sorted_rows(centroids: &Array2<i64>) -> Vec<(i64, i64)> {
        let mut rows: Vec<(i64, i64)> = centroids
            .rows()
            .into_iter()
            .map(|r| (r[0], r[1]))
            .collect();
        rows.sort_unstable();
        rows
    }

    #[test]
    fn test_empty_mask_yields_empty_centroid_set() {
        let mask = Array2::<u8>::zeros((32, 32));
        let clusterer = DensityClusterer::new(ClusterConfig::new(3));
        let centroids = clusterer.cluster(&mask.view()).unwrap();
        assert_eq!(centroids.dim(), (0, 2));
    }

    #[test]
    fn test_two_blobs_found() {
        let mask = two_blob_mask();
        let clusterer = DensityClusterer::new(ClusterConfig::new(2));
        let mut rng = StdRng::seed_from_u64(7);
        let centroids = clusterer.cluster_with_rng(&mask.view(), &mut rng).unwrap();

        let rows = sorted_rows(&centroids);
        assert_eq!(rows.len(), 2);
        // Blob centers are (10, 10) and (50, 52).
        assert!((rows[0].0 - 10).abs() <= 1 && (rows[0].1 - 10).abs() <= 1);
        assert!((rows[1].0 - 50).abs() <= 1 && (rows[1].1 - 52).abs() <= 1);
    }

    #[test]
    fn test_component_count_capped_at_foreground_pixels() {
        let mut mask = Array2::<u8>::zeros((16, 16));
        mask[[2, 3]] = 1;
        mask[[9, 11]] = 1;
        mask[[14, 1]] = 1;

        let clusterer = DensityClusterer::new(ClusterConfig::new(8));
        let mut rng = StdRng::seed_from_u64(1);
        let centroids = clusterer.cluster_with_rng(&mask.view(), &mut rng).unwrap();
        assert!(centroids.nrows() <= 3);
        assert_eq!(centroids.ncols(), 2);
    }

    #[test]
    fn test_single_pixel_mask() {
        let mut mask = Array2::<u8>::zeros((8, 8));
        mask[[5, 2]] = 1;
        let clusterer = DensityClusterer::new(ClusterConfig::new(4));
        let mut rng = StdRng::seed_from_u64(3);
        let centroids = clusterer.cluster_with_rng(&mask.view(), &mut rng).unwrap();
        assert_eq!(sorted_rows(&centroids), vec![(5, 2)]);
    }

    #[test]
    fn test_subsampling_respects_cap_and_structure() {
        let mask = two_blob_mask();
        let clusterer = DensityClusterer::new(ClusterConfig::new(2).with_max_points(20));
        let mut rng = StdRng::seed_from_u64(11);
        let centroids = clusterer.cluster_with_rng(&mask.view(), &mut rng).unwrap();

        let rows = sorted_rows(&centroids);
        assert_eq!(rows.len(), 2);
        // 20 of 50 pixels still leave both blobs represented.
        assert!((rows[0].0 - 10).abs() <= 2 && (rows[0].1 - 10).abs() <= 2);
        assert!((rows[1].0 - 50).abs() <= 2 && (rows[1].1 - 52).abs() <= 2);
    }

    #[test]
    fn test_nonzero_values_treated_as_foreground() {
        let mut mask = Array2::<u8>::zeros((8, 8));
        mask[[4, 4]] = 255;
        let clusterer = DensityClusterer::new(ClusterConfig::new(1));
        let mut rng = StdRng::seed_from_u64(5);
        let centroids = clusterer.cluster_with_rng(&mask.view(), &mut rng).unwrap();
        assert_eq!(sorted_rows(&centroids), vec![(4, 4)]);
    }

    #[test]
    fn test_single_cluster_mean() {
        // A solid rectangle: the single-component mean is its center.
        let mut mask = Array2::<u8>::zeros((20, 20));
        for y in 4..9 {
            for x in 6..13 {
                mask[[y, x]] = 1;
            }
        }
        let clusterer = DensityClusterer::new(ClusterConfig::new(1));
        let mut rng = StdRng::seed_from_u64(2);
        let centroids = clusterer.cluster_with_rng(&mask.view(), &mut rng).unwrap();
        assert_eq!(sorted_rows(&centroids), vec![(6, 9)]);
    }
}
