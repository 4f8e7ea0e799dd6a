//! Connected-component labeling and small-object removal.
//!
//! Components are 8-connected regions of foreground pixels, found with a
//! breadth-first flood fill in raster discovery order.

use std::collections::VecDeque;

use ndarray::{Array2, ArrayView2};

use super::{BACKGROUND, FOREGROUND};
use crate::error::{Error, Result, Stage};

/// 8-connected neighbor offsets (dx, dy).
const NEIGHBORS_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// One labeled foreground region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectedComponent {
    /// Label id, starting at 1 (0 is background)
    pub label: u32,
    /// Number of pixels in the region
    pub area: usize,
}

/// Labeling result.
#[derive(Clone, Debug)]
pub struct ComponentLabels {
    /// Per-pixel label (0 = background)
    pub labels: Array2<u32>,
    /// Components in discovery order; `components[i].label == i + 1`
    pub components: Vec<ConnectedComponent>,
}

impl ComponentLabels {
    pub fn area_of(&self, label: u32) -> Option<usize> {
        if label == 0 {
            return None;
        }
        self.components.get(label as usize - 1).map(|c| c.area)
    }
}

/// Reject masks containing anything but 0 and 255.
fn ensure_binary(mask: &ArrayView2<u8>) -> Result<()> {
    if let Some(((y, x), &v)) = mask
        .indexed_iter()
        .find(|(_, v)| **v != FOREGROUND && **v != BACKGROUND)
    {
        return Err(Error::invalid(
            Stage::Clean,
            format!("mask is not binary: value {v} at ({x}, {y})"),
        ));
    }
    Ok(())
}

/// Label all 8-connected foreground components.
///
/// # Arguments
/// * `mask` - Binary mask (height, width) with values {0, 255}
///
/// # Returns
/// Per-pixel labels and the area of every component
pub fn label_components(mask: ArrayView2<u8>) -> Result<ComponentLabels> {
    ensure_binary(&mask)?;

    let (height, width) = mask.dim();
    let mut labels = Array2::<u32>::zeros((height, width));
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            if mask[[y, x]] != FOREGROUND || labels[[y, x]] != 0 {
                continue;
            }

            let label = components.len() as u32 + 1;
            let mut area = 0usize;
            labels[[y, x]] = label;
            queue.push_back((x, y));

            while let Some((cx, cy)) = queue.pop_front() {
                area += 1;

                for &(dx, dy) in &NEIGHBORS_8 {
                    let nx = cx as isize + dx;
                    let ny = cy as isize + dy;
                    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    if mask[[ny, nx]] == FOREGROUND && labels[[ny, nx]] == 0 {
                        labels[[ny, nx]] = label;
                        queue.push_back((nx, ny));
                    }
                }
            }

            components.push(ConnectedComponent { label, area });
        }
    }

    Ok(ComponentLabels { labels, components })
}

/// Remove connected components smaller than `min_area` pixels.
///
/// # Arguments
/// * `mask` - Binary mask (height, width) with values {0, 255}
/// * `min_area` - Minimum component area to keep
///
/// # Returns
/// New mask containing only components with area >= `min_area`
pub fn clean_mask(mask: ArrayView2<u8>, min_area: usize) -> Result<Array2<u8>> {
    let labeled = label_components(mask)?;
    if labeled.components.is_empty() {
        return Ok(mask.to_owned());
    }

    let keep: Vec<bool> = std::iter::once(false)
        .chain(labeled.components.iter().map(|c| c.area >= min_area))
        .collect();

    let removed = keep.iter().filter(|&&k| !k).count() - 1;
    log::debug!(
        "clean_mask: {} components, {} removed below {} px",
        labeled.components.len(),
        removed,
        min_area
    );

    Ok(labeled
        .labels
        .mapv(|label| if keep[label as usize] { FOREGROUND } else { BACKGROUND }))
}
