//! Presentation helpers: heatmap compositing and marker painting.
//!
//! Images are channel-first (3, height, width) RGB arrays with values in
//! [0, 255]. These helpers carry no state and never mutate their inputs.

use locmap_core::{Error, Result};
use ndarray::{Array3, ArrayView2, ArrayView3};
use std::str::FromStr;

/// Colors recognized by [`paint_markers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    /// Pure red, (255, 0, 0).
    Red,
    /// Pure white, (255, 255, 255).
    White,
}

impl MarkerColor {
    fn rgb(self) -> [f64; 3] {
        match self {
            Self::Red => [255.0, 0.0, 0.0],
            Self::White => [255.0, 255.0, 255.0],
        }
    }
}

impl FromStr for MarkerColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "red" => Ok(Self::Red),
            "white" => Ok(Self::White),
            other => Err(Error::UnsupportedColor(other.to_string())),
        }
    }
}

/// Viridis colormap anchors sampled at nine evenly spaced positions.
const VIRIDIS: [[f64; 3]; 9] = [
    [0.267_004, 0.004_874, 0.329_415],
    [0.282_623, 0.140_926, 0.457_517],
    [0.253_935, 0.265_254, 0.529_983],
    [0.206_756, 0.371_758, 0.553_117],
    [0.163_625, 0.471_133, 0.558_148],
    [0.127_568, 0.566_949, 0.550_556],
    [0.134_692, 0.658_636, 0.517_649],
    [0.477_504, 0.821_444, 0.318_195],
    [0.993_248, 0.906_157, 0.143_936],
];

/// Viridis pseudo-color for a scalar in [0, 1], linearly interpolated
/// between anchors. Out-of-range input is clamped.
fn viridis(t: f64) -> [f64; 3] {
    let t = t.clamp(0.0, 1.0);
    let pos = t * (VIRIDIS.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = pos - lo as f64;
    [
        VIRIDIS[lo][0] + frac * (VIRIDIS[hi][0] - VIRIDIS[lo][0]),
        VIRIDIS[lo][1] + frac * (VIRIDIS[hi][1] - VIRIDIS[lo][1]),
        VIRIDIS[lo][2] + frac * (VIRIDIS[hi][2] - VIRIDIS[lo][2]),
    ]
}

/// Composites a scalar map over an RGB image as a pseudo-color heatmap.
///
/// `img` is (3, H, W) in [0, 255]; `map` is (H, W) in [0, 1]. The result is
/// the pixelwise average of the image and the [0, 255]-scaled pseudo-color,
/// in the same channel-first layout.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] unless `img` has exactly 3 channels and
/// `map` matches its height and width.
pub fn overlay_heatmap(
    img: &ArrayView3<'_, f64>,
    map: &ArrayView2<'_, f64>,
) -> Result<Array3<f64>> {
    let (channels, height, width) = img.dim();
    if channels != 3 {
        return Err(Error::ShapeMismatch {
            expected: "channel-first RGB image (3, H, W)".to_string(),
            got: format!("({channels}, {height}, {width})"),
        });
    }
    if map.dim() != (height, width) {
        return Err(Error::ShapeMismatch {
            expected: format!("scalar map of shape ({height}, {width})"),
            got: format!("{:?}", map.dim()),
        });
    }

    let mut out = Array3::zeros((3, height, width));
    for ((y, x), &v) in map.indexed_iter() {
        let rgb = viridis(v);
        for c in 0..3 {
            out[[c, y, x]] = (img[[c, y, x]] + rgb[c] * 255.0) / 2.0;
        }
    }
    Ok(out)
}

/// Paints markers at (y, x) points on an RGB image.
///
/// Points are rounded to pixel positions. Plain markers are filled circles
/// of radius 3; with `crosshair` a tilted cross of half-width 4 and
/// thickness 3 is stamped instead. Markers are clipped at the image border.
/// Returns a new (3, H, W) image.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] unless `img` has exactly 3 channels and
/// `points` rows are (y, x) pairs.
pub fn paint_markers(
    img: &ArrayView3<'_, f64>,
    points: &ArrayView2<'_, f64>,
    color: MarkerColor,
    crosshair: bool,
) -> Result<Array3<f64>> {
    let (channels, _, _) = img.dim();
    if channels != 3 {
        return Err(Error::ShapeMismatch {
            expected: "channel-first RGB image (3, H, W)".to_string(),
            got: format!("{:?}", img.dim()),
        });
    }
    if points.ncols() != 2 && points.nrows() > 0 {
        return Err(Error::ShapeMismatch {
            expected: "point rows of width 2 (y, x)".to_string(),
            got: format!("width {}", points.ncols()),
        });
    }

    let mut out = img.to_owned();
    let rgb = color.rgb();
    for row in points.rows() {
        #[allow(clippy::cast_possible_truncation)]
        let (y, x) = (row[0].round() as i64, row[1].round() as i64);
        if crosshair {
            stamp_cross(&mut out, y, x, rgb);
        } else {
            stamp_disc(&mut out, y, x, rgb);
        }
    }
    Ok(out)
}

fn put_pixel(img: &mut Array3<f64>, y: i64, x: i64, rgb: [f64; 3]) {
    let (_, height, width) = img.dim();
    if y < 0 || x < 0 || y >= height as i64 || x >= width as i64 {
        return;
    }
    let (y, x) = (y as usize, x as usize);
    for c in 0..3 {
        img[[c, y, x]] = rgb[c];
    }
}

/// Filled circle of radius 3.
fn stamp_disc(img: &mut Array3<f64>, cy: i64, cx: i64, rgb: [f64; 3]) {
    for dy in -3..=3 {
        for dx in -3..=3 {
            if dy * dy + dx * dx <= 9 {
                put_pixel(img, cy + dy, cx + dx, rgb);
            }
        }
    }
}

/// Tilted cross: both diagonals of half-width 4, three pixels thick.
fn stamp_cross(img: &mut Array3<f64>, cy: i64, cx: i64, rgb: [f64; 3]) {
    for d in -4..=4 {
        for t in -1..=1 {
            put_pixel(img, cy + d + t, cx + d, rgb);
            put_pixel(img, cy + d + t, cx - d, rgb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2, Array3};

    fn gray_image(h: usize, w: usize) -> Array3<f64> {
        Array3::from_elem((3, h, w), 128.0)
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!("red".parse::<MarkerColor>().unwrap(), MarkerColor::Red);
        assert_eq!("white".parse::<MarkerColor>().unwrap(), MarkerColor::White);
        assert!(matches!(
            "blue".parse::<MarkerColor>(),
            Err(Error::UnsupportedColor(_))
        ));
        // Case-sensitive literals, as documented.
        assert!("Red".parse::<MarkerColor>().is_err());
    }

    #[test]
    fn test_overlay_rejects_bad_shapes() {
        let img = Array3::<f64>::zeros((4, 8, 8));
        let map = Array2::<f64>::zeros((8, 8));
        assert!(overlay_heatmap(&img.view(), &map.view()).is_err());

        let img = gray_image(8, 8);
        let map = Array2::<f64>::zeros((8, 9));
        assert!(overlay_heatmap(&img.view(), &map.view()).is_err());
    }

    #[test]
    fn test_overlay_blends_image_and_colormap() {
        let img = gray_image(2, 2);
        let map = array![[0.0, 1.0], [0.5, 0.25]];
        let out = overlay_heatmap(&img.view(), &map.view()).unwrap();

        assert_eq!(out.dim(), (3, 2, 2));
        // Every output value is the average of 128 and a [0, 255] color.
        for &v in &out {
            assert!((64.0..=191.5).contains(&v));
        }
        // Spot-check the t = 0 anchor.
        let rgb0 = [0.267_004, 0.004_874, 0.329_415];
        for c in 0..3 {
            assert_relative_eq!(
                out[[c, 0, 0]],
                (128.0 + rgb0[c] * 255.0) / 2.0,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_overlay_leaves_input_unchanged() {
        let img = gray_image(4, 4);
        let snapshot = img.clone();
        let map = Array2::from_elem((4, 4), 0.7);
        let _ = overlay_heatmap(&img.view(), &map.view()).unwrap();
        assert_eq!(img, snapshot);
    }

    #[test]
    fn test_paint_circle_covers_center() {
        let img = gray_image(16, 16);
        let points = array![[8.0, 8.0]];
        let out = paint_markers(&img.view(), &points.view(), MarkerColor::Red, false).unwrap();

        assert_relative_eq!(out[[0, 8, 8]], 255.0);
        assert_relative_eq!(out[[1, 8, 8]], 0.0);
        assert_relative_eq!(out[[2, 8, 8]], 0.0);
        // Radius 3: a pixel four columns away is untouched.
        assert_relative_eq!(out[[0, 8, 12]], 128.0);
    }

    #[test]
    fn test_paint_crosshair_marks_diagonals() {
        let img = gray_image(16, 16);
        let points = array![[8.0, 8.0]];
        let out = paint_markers(&img.view(), &points.view(), MarkerColor::White, true).unwrap();

        for d in [-4_i64, -1, 1, 4] {
            let y = (8 + d) as usize;
            let x = (8 + d) as usize;
            assert_relative_eq!(out[[1, y, x]], 255.0);
            let x_mirror = (8 - d) as usize;
            assert_relative_eq!(out[[1, y, x_mirror]], 255.0);
        }
        // Just off the arms (horizontal offset) stays gray.
        assert_relative_eq!(out[[1, 8, 4]], 128.0);
    }

    #[test]
    fn test_paint_clips_at_border() {
        let img = gray_image(8, 8);
        let points = array![[0.0, 0.0], [7.0, 7.0]];
        let out = paint_markers(&img.view(), &points.view(), MarkerColor::Red, false).unwrap();
        assert_eq!(out.dim(), (3, 8, 8));
        assert_relative_eq!(out[[0, 0, 0]], 255.0);
    }

    #[test]
    fn test_paint_rejects_bad_point_width() {
        let img = gray_image(8, 8);
        let points = array![[1.0, 2.0, 3.0]];
        assert!(paint_markers(&img.view(), &points.view(), MarkerColor::Red, false).is_err());
    }
}
