//! Contour extraction from cleaned binary masks.
//!
//! - **Tracing**: Moore-neighbor boundary following over 8-connectivity
//! - **Douglas-Peucker**: Polyline simplification with a pixel tolerance
//!
//! Contours are ordered integer pixel sequences. Whether a contour is closed
//! is not tracked; downstream consumers treat every contour as a polyline.

pub mod simplify;
pub mod trace;

use ndarray::ArrayView2;

pub use simplify::douglas_peucker;
pub use trace::trace_contours;

/// Integer pixel coordinate in mask space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PixelPoint) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Distance from this point to the segment `start..end`.
    pub fn distance_to_segment(&self, start: &PixelPoint, end: &PixelPoint) -> f64 {
        let dx = (end.x - start.x) as f64;
        let dy = (end.y - start.y) as f64;
        let length_sq = dx * dx + dy * dy;

        if length_sq == 0.0 {
            return self.distance_to(start);
        }

        let px = (self.x - start.x) as f64;
        let py = (self.y - start.y) as f64;
        let t = ((px * dx + py * dy) / length_sq).clamp(0.0, 1.0);

        let ex = px - t * dx;
        let ey = py - t * dy;
        (ex * ex + ey * ey).sqrt()
    }
}

/// Ordered boundary points of one traced region.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<PixelPoint>,
}

impl Contour {
    pub fn new(points: Vec<PixelPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of the open polyline through all points.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    /// True if any point lies closer than `margin` pixels to the mask border.
    pub fn touches_border(&self, width: usize, height: usize, margin: usize) -> bool {
        if margin == 0 {
            return false;
        }
        let margin = margin as i64;
        let (width, height) = (width as i64, height as i64);
        self.points.iter().any(|p| {
            let (x, y) = (p.x as i64, p.y as i64);
            x < margin || y < margin || x >= width - margin || y >= height - margin
        })
    }

    /// Simplified copy of this contour.
    pub fn simplify(&self, epsilon: f64) -> Contour {
        Contour::new(douglas_peucker(&self.points, epsilon))
    }
}

/// Trace, filter and simplify all contours of a binary mask.
///
/// # Arguments
/// * `mask` - Cleaned binary mask (height, width)
/// * `min_length` - Contours whose unsimplified length is <= this are dropped
/// * `epsilon` - Douglas-Peucker tolerance in pixels
/// * `border_margin` - Drop contours within this many pixels of the border (0 = disabled)
///
/// # Returns
/// Simplified contours in discovery order
pub fn trace_filtered(
    mask: ArrayView2<u8>,
    min_length: f64,
    epsilon: f64,
    border_margin: usize,
) -> Vec<Contour> {
    let (height, width) = mask.dim();
    let traced = trace_contours(mask);
    let total = traced.len();

    let kept: Vec<Contour> = traced
        .into_iter()
        .filter(|c| c.length() > min_length)
        .filter(|c| !c.touches_border(width, height, border_margin))
        .map(|c| c.simplify(epsilon))
        .collect();

    log::debug!(
        "trace_filtered: {} of {} contours kept (min_length {:.2}, epsilon {:.2})",
        kept.len(),
        total,
        min_length,
        epsilon
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_point_to_segment_distance() {
        let p = PixelPoint::new(1, 1);
        let a = PixelPoint::new(0, 0);
        let b = PixelPoint::new(2, 0);
        assert!((p.distance_to_segment(&a, &b) - 1.0).abs() < 1e-9);
        // Beyond the end the distance is to the endpoint
        let q = PixelPoint::new(5, 4);
        assert!((q.distance_to_segment(&a, &b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_contour_length() {
        let c = Contour::new(vec![
            PixelPoint::new(0, 0),
            PixelPoint::new(3, 4),
            PixelPoint::new(3, 0),
        ]);
        assert!((c.length() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_touches_border() {
        let c = Contour::new(vec![PixelPoint::new(2, 5), PixelPoint::new(6, 5)]);
        assert!(!c.touches_border(10, 10, 0));
        assert!(!c.touches_border(10, 10, 2));
        assert!(c.touches_border(10, 10, 3));
        assert!(c.touches_border(10, 10, 4));
    }

    #[test]
    fn test_length_filter_runs_before_simplification() {
        // A 12x1 bar traces to a long thin loop; simplification would shrink
        // it to a handful of vertices, but the length filter sees all of them.
        let mut mask = Array2::<u8>::zeros((5, 16));
        for x in 2..14 {
            mask[[2, x]] = 255;
        }
        let contours = trace_filtered(mask.view(), 20.0, 2.0, 0);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].len() <= 3);

        let none = trace_filtered(mask.view(), 22.0, 2.0, 0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let mask = Array2::<u8>::zeros((10, 10));
        assert!(trace_filtered(mask.view(), 0.0, 2.0, 0).is_empty());
    }
}
