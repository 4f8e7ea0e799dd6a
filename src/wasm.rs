//! WebAssembly exports for scene geometry extraction.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Buffers are
//! passed as flat row-major `u8` arrays with explicit width and height.
//! Detection is done on the JavaScript side; only mask processing, contour
//! tracing and sampling run here.

use ndarray::{Array2, ArrayView2};
use wasm_bindgen::prelude::*;

use crate::contour::trace_filtered;
use crate::error::Error;
use crate::geometry::Dimensions;
use crate::mask::clean_mask;
use crate::sampling;

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn view(data: &[u8], width: usize, height: usize) -> Result<ArrayView2<'_, u8>, JsValue> {
    ArrayView2::from_shape((height, width), data)
        .map_err(|e| JsValue::from_str(&format!("invalid dimensions {width}x{height}: {e}")))
}

/// Remove small 8-connected components from a binary mask.
///
/// # Arguments
/// * `data` - Flat mask bytes (length = width * height), values 0 or 255
/// * `width` - Mask width in pixels
/// * `height` - Mask height in pixels
/// * `min_area` - Components with fewer pixels are cleared
#[wasm_bindgen]
pub fn clean_mask_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    min_area: usize,
) -> Result<Vec<u8>, JsValue> {
    let cleaned: Array2<u8> = clean_mask(view(data, width, height)?, min_area).map_err(to_js)?;
    Ok(cleaned.into_raw_vec_and_offset().0)
}

/// Trace, filter and simplify contours of a binary mask.
///
/// # Returns
/// Flat array: [num_contours, len1, x1, y1, x2, y2, ..., len2, ...]
#[wasm_bindgen]
pub fn trace_contours_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    min_length: f64,
    epsilon: f64,
) -> Result<Vec<f32>, JsValue> {
    let contours = trace_filtered(view(data, width, height)?, min_length, epsilon, 0);

    let mut result = Vec::new();
    result.push(contours.len() as f32);
    for contour in &contours {
        result.push(contour.len() as f32);
        for point in &contour.points {
            result.push(point.x as f32);
            result.push(point.y as f32);
        }
    }
    Ok(result)
}

/// Sample points weighted by an intensity map.
///
/// # Returns
/// Flat array: [x1, y1, x2, y2, ...] in original pixel space
#[wasm_bindgen]
pub fn sample_points_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    original_width: usize,
    original_height: usize,
    num_points: usize,
    edge_weight: f32,
    seed: Option<u64>,
) -> Result<Vec<f64>, JsValue> {
    let cloud = sampling::sample(
        view(data, width, height)?,
        num_points,
        edge_weight,
        Dimensions::new(original_width, original_height),
        seed,
    )
    .map_err(to_js)?;
    Ok(cloud.points.iter().flat_map(|p| [p.x, p.y]).collect())
}
