//! Coordinate rescaling between image sizes.

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

/// Maps (y, x) coordinates from a normalized (resized) image space back to
/// the original image space via per-axis scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateNormalizer {
    target_height: f64,
    target_width: f64,
}

impl CoordinateNormalizer {
    /// Creates a normalizer for a target (resized) image size.
    #[must_use]
    pub fn new(target_height: u32, target_width: u32) -> Self {
        Self {
            target_height: f64::from(target_height),
            target_width: f64::from(target_width),
        }
    }

    /// Rescales (y, x) rows from the target space to `orig_size` space.
    ///
    /// Each row is multiplied elementwise by `orig_size / target_size`,
    /// broadcast across all rows.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] when `orig_size` does not hold
    /// exactly two elements (height, width) or `coords` rows are not (y, x)
    /// pairs.
    pub fn unnormalize(
        &self,
        coords: &ArrayView2<'_, f64>,
        orig_size: &[f64],
    ) -> Result<Array2<f64>> {
        if orig_size.len() != 2 {
            return Err(Error::ShapeMismatch {
                expected: "orig_size of length 2 (height, width)".to_string(),
                got: format!("length {}", orig_size.len()),
            });
        }
        if coords.ncols() != 2 {
            return Err(Error::ShapeMismatch {
                expected: "coordinate rows of width 2 (y, x)".to_string(),
                got: format!("width {}", coords.ncols()),
            });
        }

        let factor_y = orig_size[0] / self.target_height;
        let factor_x = orig_size[1] / self.target_width;

        let mut out = coords.to_owned();
        for mut row in out.rows_mut() {
            row[0] *= factor_y;
            row[1] *= factor_x;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_unnormalize_scales_per_axis() {
        let normalizer = CoordinateNormalizer::new(100, 100);
        let coords = array![[50.0, 50.0]];
        let out = normalizer
            .unnormalize(&coords.view(), &[200.0, 100.0])
            .unwrap();
        // Height doubled, width unchanged.
        assert_relative_eq!(out[[0, 0]], 100.0);
        assert_relative_eq!(out[[0, 1]], 50.0);
    }

    #[test]
    fn test_unnormalize_broadcasts_over_rows() {
        let normalizer = CoordinateNormalizer::new(10, 20);
        let coords = array![[1.0, 2.0], [5.0, 10.0], [10.0, 20.0]];
        let out = normalizer
            .unnormalize(&coords.view(), &[20.0, 10.0])
            .unwrap();
        let expected = array![[2.0, 1.0], [10.0, 5.0], [20.0, 10.0]];
        for (got, want) in out.iter().zip(expected.iter()) {
            assert_relative_eq!(got, want);
        }
    }

    #[test]
    fn test_bad_orig_size_rejected() {
        let normalizer = CoordinateNormalizer::new(100, 100);
        let coords = array![[1.0, 1.0]];
        assert!(normalizer
            .unnormalize(&coords.view(), &[100.0])
            .is_err());
        assert!(normalizer
            .unnormalize(&coords.view(), &[100.0, 100.0, 3.0])
            .is_err());
    }

    #[test]
    fn test_bad_coordinate_width_rejected() {
        let normalizer = CoordinateNormalizer::new(100, 100);
        let coords = array![[1.0, 1.0, 1.0]];
        assert!(normalizer
            .unnormalize(&coords.view(), &[100.0, 100.0])
            .is_err());
    }
}
