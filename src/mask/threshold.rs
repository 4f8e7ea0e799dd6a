//! Intensity thresholding.

use ndarray::{Array2, ArrayView2};

use super::{BACKGROUND, FOREGROUND};
use crate::error::{Error, Result, Stage};

/// Binarize an intensity buffer.
///
/// # Arguments
/// * `intensity` - Edge/probability map (height, width), 0-255
/// * `threshold` - Cut-off in 0.0-1.0; samples strictly above `threshold * 255` become foreground
///
/// # Returns
/// Binary mask with values {0, 255}
pub fn threshold_mask(intensity: ArrayView2<u8>, threshold: f32) -> Result<Array2<u8>> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(Error::invalid(
            Stage::Threshold,
            format!("threshold {threshold} outside 0.0-1.0"),
        ));
    }

    let cutoff = (threshold * 255.0) as u8;
    Ok(intensity.mapv(|v| if v > cutoff { FOREGROUND } else { BACKGROUND }))
}
