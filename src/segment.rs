//! Contour to line-segment conversion.
//!
//! Consecutive vertices of a simplified contour become segments whose
//! endpoints are rescaled from detection space to original-image space.

use crate::contour::Contour;
use crate::geometry::{PathLevel, Point, Segment};

/// Convert a simplified contour into scaled segments.
///
/// # Arguments
/// * `contour` - Simplified contour in detection pixel space
/// * `scale_x` - `original_width / detected_width`
/// * `scale_y` - `original_height / detected_height`
///
/// # Returns
/// `len - 1` segments; contours with fewer than two vertices yield none.
pub fn to_segments(contour: &Contour, scale_x: f64, scale_y: f64) -> Vec<Segment> {
    contour
        .points
        .windows(2)
        .map(|pair| {
            Segment::new(
                Point::new(pair[0].x as f64 * scale_x, pair[0].y as f64 * scale_y),
                Point::new(pair[1].x as f64 * scale_x, pair[1].y as f64 * scale_y),
            )
        })
        .collect()
}

/// Segment every contour and concatenate the result into one level.
pub fn to_path_level(contours: &[Contour], scale_x: f64, scale_y: f64) -> PathLevel {
    PathLevel::new(
        contours
            .iter()
            .flat_map(|contour| to_segments(contour, scale_x, scale_y))
            .collect(),
    )
}
