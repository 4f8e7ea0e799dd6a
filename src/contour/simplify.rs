//! Douglas-Peucker polyline simplification.

use super::PixelPoint;

/// Simplify a polyline using the Douglas-Peucker algorithm.
///
/// Uses an explicit work stack instead of recursion so long contours from
/// high-resolution masks cannot exhaust the call stack.
///
/// # Arguments
/// * `points` - Input polyline points
/// * `epsilon` - Maximum allowed distance from the simplified polyline
///
/// # Returns
/// Simplified polyline; first and last points are always kept.
pub fn douglas_peucker(points: &[PixelPoint], epsilon: f64) -> Vec<PixelPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];

    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }

        // Find the point with maximum distance from the segment first..last
        let mut max_dist = 0.0f64;
        let mut max_idx = first;

        for i in first + 1..last {
            let dist = points[i].distance_to_segment(&points[first], &points[last]);
            if dist > max_dist {
                max_dist = dist;
                max_idx = i;
            }
        }

        if max_dist > epsilon {
            keep[max_idx] = true;
            stack.push((max_idx, last));
            stack.push((first, max_idx));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}
