//! Boundary tracing over binary masks.
//!
//! Every boundary pixel (foreground with a background 4-neighbor) ends up in
//! exactly one traced contour, so both outer borders and hole borders are
//! returned.

use ndarray::{Array2, ArrayView2};

use super::{Contour, PixelPoint};

/// Moore neighborhood directions (8-connected, clockwise from right)
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // 0: right
    (1, 1),   // 1: down-right
    (0, 1),   // 2: down
    (-1, 1),  // 3: down-left
    (-1, 0),  // 4: left
    (-1, -1), // 5: up-left
    (0, -1),  // 6: up
    (1, -1),  // 7: up-right
];

/// 4-neighbor directions tried, in order, as the initial backtrack.
const INITIAL_BACKTRACK: [usize; 4] = [4, 6, 0, 2];

/// Index into `DIRECTIONS` for a unit offset.
fn direction_index(dx: i32, dy: i32) -> usize {
    match (dx, dy) {
        (1, 0) => 0,
        (1, 1) => 1,
        (0, 1) => 2,
        (-1, 1) => 3,
        (-1, 0) => 4,
        (-1, -1) => 5,
        (0, -1) => 6,
        _ => 7,
    }
}

/// Check if pixel is foreground (treating out-of-bounds as background).
#[inline]
fn is_foreground(mask: &ArrayView2<u8>, x: i32, y: i32) -> bool {
    let (height, width) = mask.dim();
    x >= 0
        && y >= 0
        && (x as usize) < width
        && (y as usize) < height
        && mask[[y as usize, x as usize]] > 0
}

/// Check if a pixel is on the boundary (foreground with at least one background 4-neighbor).
#[inline]
fn is_boundary(mask: &ArrayView2<u8>, x: i32, y: i32) -> bool {
    if !is_foreground(mask, x, y) {
        return false;
    }
    !is_foreground(mask, x - 1, y)
        || !is_foreground(mask, x + 1, y)
        || !is_foreground(mask, x, y - 1)
        || !is_foreground(mask, x, y + 1)
}

/// Extract all contours of a binary mask.
///
/// # Arguments
/// * `mask` - Binary mask (height, width); any non-zero value is foreground
///
/// # Returns
/// Contours in raster discovery order. Isolated pixels yield single-point contours.
pub fn trace_contours(mask: ArrayView2<u8>) -> Vec<Contour> {
    let (height, width) = mask.dim();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut contours = Vec::new();
    let mut visited = Array2::<bool>::from_elem((height, width), false);

    for y in 0..height {
        for x in 0..width {
            if !visited[[y, x]] && is_boundary(&mask, x as i32, y as i32) {
                let start = PixelPoint::new(x as i32, y as i32);
                contours.push(trace_boundary(&mask, start, &mut visited));
            }
        }
    }

    contours
}

/// Trace one boundary using Moore neighbor following.
///
/// Stops when the tracer is back at `start` and about to repeat its first move.
fn trace_boundary(
    mask: &ArrayView2<u8>,
    start: PixelPoint,
    visited: &mut Array2<bool>,
) -> Contour {
    let (height, width) = mask.dim();
    let max_steps = 4 * width * height + 8;

    // Boundary pixels always have a background 4-neighbor
    let mut back = INITIAL_BACKTRACK
        .iter()
        .copied()
        .find(|&d| {
            let (dx, dy) = DIRECTIONS[d];
            !is_foreground(mask, start.x + dx, start.y + dy)
        })
        .unwrap_or(4);

    let mut points = vec![start];
    visited[[start.y as usize, start.x as usize]] = true;

    let mut current = start;
    let mut first_dir: Option<usize> = None;

    for _ in 0..max_steps {
        // Search clockwise, starting just after the backtrack direction
        let next = (1..=8).map(|i| (back + i) % 8).find(|&d| {
            let (dx, dy) = DIRECTIONS[d];
            is_foreground(mask, current.x + dx, current.y + dy)
        });

        let Some(dir) = next else {
            // Isolated pixel
            break;
        };

        if current == start {
            match first_dir {
                None => first_dir = Some(dir),
                Some(first) if first == dir => break,
                Some(_) => points.push(current),
            }
        }

        let (dx, dy) = DIRECTIONS[dir];
        let moved = PixelPoint::new(current.x + dx, current.y + dy);

        // The last background pixel examined becomes the new backtrack
        let (bx, by) = DIRECTIONS[(dir + 7) % 8];
        back = direction_index(current.x + bx - moved.x, current.y + by - moved.y);
        current = moved;

        if current != start {
            visited[[current.y as usize, current.x as usize]] = true;
            points.push(current);
        }
    }

    Contour::new(points)
}
