//! Scene Geometry Extraction
//!
//! Turns a source image into stylized geometry for a 3D scene, with Python
//! bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Geometry Types
//! - **Line art**: edge maps detected at several resolutions are thresholded,
//!   cleaned, traced and simplified into one level of line segments each
//! - **Point cloud**: points sampled with probability proportional to a
//!   contrast-adjusted edge intensity map
//!
//! ## Buffer Format
//! Intensity maps and binary masks are `(height, width)` `u8` arrays. Masks
//! hold only 0 (background) and 255 (foreground). Output coordinates are
//! `f64` pixels in the original image space.
//!
//! ## Detection
//! Edge detection itself is external. Callers supply a [`Detector`] which
//! produces an intensity map of a requested size; any
//! `FnMut(usize, usize) -> Result<Array2<u8>, E>` closure works.

pub mod config;
pub mod contour;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod mask;
pub mod pipeline;
pub mod sampling;
pub mod segment;
pub mod store;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{load_config, GeometryConfig, LineArtConfig, PointCloudConfig};
pub use error::{DetectorError, Error, Result, Stage};
pub use geometry::{
    Dimensions, GeometryArtifact, GeometryType, LineArt, PathLevel, Point, PointCloud, Segment,
};
pub use hierarchy::{
    detection_dimensions, extract_levels, Detector, ExtractionObserver, HierarchicalExtractor,
    NoopObserver,
};
pub use pipeline::{extract_and_store, extract_geometry, geometry_types, GeometryTypeInfo};
pub use sampling::PointSampler;
pub use store::{FileGeometryStore, GeometryStore, MemoryGeometryStore};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use ndarray::Array2;
    use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::contour::trace_filtered;
    use crate::error::DetectorError;
    use crate::geometry::{Dimensions, PathLevel};
    use crate::hierarchy;
    use crate::mask::{clean_mask as clean_mask_impl, threshold_mask as threshold_mask_impl};
    use crate::sampling;

    fn shape_error(e: ndarray::ShapeError) -> PyErr {
        PyValueError::new_err(e.to_string())
    }

    fn level_to_array(level: &PathLevel) -> PyResult<Array2<f64>> {
        let flat: Vec<f64> = level
            .iter()
            .flat_map(|s| [s.start.x, s.start.y, s.end.x, s.end.y])
            .collect();
        Array2::from_shape_vec((level.len(), 4), flat).map_err(shape_error)
    }

    // ========================================================================
    // Mask Operations
    // ========================================================================

    /// Binarize an intensity map: pixels above `threshold * 255` become 255.
    #[pyfunction]
    #[pyo3(signature = (intensity, threshold=0.3))]
    pub fn threshold_mask<'py>(
        py: Python<'py>,
        intensity: PyReadonlyArray2<'py, u8>,
        threshold: f32,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result = threshold_mask_impl(intensity.as_array(), threshold)?;
        Ok(result.into_pyarray(py))
    }

    /// Remove 8-connected components smaller than `min_area` pixels.
    #[pyfunction]
    #[pyo3(signature = (mask, min_area=50))]
    pub fn clean_mask<'py>(
        py: Python<'py>,
        mask: PyReadonlyArray2<'py, u8>,
        min_area: usize,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let result = clean_mask_impl(mask.as_array(), min_area)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Contours
    // ========================================================================

    /// Trace, filter and simplify contours.
    ///
    /// Returns a list of (N, 2) int32 arrays of (x, y) pixel coordinates.
    #[pyfunction]
    #[pyo3(signature = (mask, min_length=10.0, epsilon=2.0, border_margin=0))]
    pub fn trace_contours<'py>(
        py: Python<'py>,
        mask: PyReadonlyArray2<'py, u8>,
        min_length: f64,
        epsilon: f64,
        border_margin: usize,
    ) -> PyResult<Vec<Bound<'py, PyArray2<i32>>>> {
        trace_filtered(mask.as_array(), min_length, epsilon, border_margin)
            .iter()
            .map(|contour| {
                let flat: Vec<i32> = contour.points.iter().flat_map(|p| [p.x, p.y]).collect();
                let array = Array2::from_shape_vec((contour.len(), 2), flat).map_err(shape_error)?;
                Ok(array.into_pyarray(py))
            })
            .collect()
    }

    // ========================================================================
    // Extraction
    // ========================================================================

    /// Detection buffer (width, height) for a resolution.
    #[pyfunction]
    pub fn detection_dimensions(
        original_width: usize,
        original_height: usize,
        resolution: usize,
    ) -> PyResult<(usize, usize)> {
        let dims = hierarchy::detection_dimensions(original_width, original_height, resolution)?;
        Ok((dims.width, dims.height))
    }

    /// Hierarchical line-art extraction.
    ///
    /// `detector` is called as `detector(width, height)` and must return a
    /// (height, width) uint8 array. Returns one (N, 4) float64 array of
    /// `[x0, y0, x1, y1]` rows per resolution.
    #[pyfunction]
    #[pyo3(signature = (
        detector,
        original_width,
        original_height,
        resolutions = vec![512, 768, 1024],
        threshold = 0.3,
        base_min_length = 10.0
    ))]
    pub fn extract_levels<'py>(
        py: Python<'py>,
        detector: Bound<'py, PyAny>,
        original_width: usize,
        original_height: usize,
        resolutions: Vec<usize>,
        threshold: f32,
        base_min_length: f64,
    ) -> PyResult<Vec<Bound<'py, PyArray2<f64>>>> {
        let mut call = |width: usize, height: usize| -> Result<Array2<u8>, DetectorError> {
            let output = detector.call1((width, height))?;
            let array: PyReadonlyArray2<u8> = output.extract()?;
            Ok(array.as_array().to_owned())
        };
        let levels = hierarchy::extract_levels(
            &mut call,
            &resolutions,
            original_width,
            original_height,
            threshold,
            base_min_length,
        )?;
        levels
            .iter()
            .map(|level| Ok(level_to_array(level)?.into_pyarray(py)))
            .collect()
    }

    /// Sample points weighted by intensity.
    ///
    /// Returns an (N, 2) float64 array of (x, y) in original pixel space.
    #[pyfunction]
    #[pyo3(signature = (
        intensity,
        original_width,
        original_height,
        num_points = 10000,
        edge_weight = 0.8,
        seed = None
    ))]
    pub fn sample_points<'py>(
        py: Python<'py>,
        intensity: PyReadonlyArray2<'py, u8>,
        original_width: usize,
        original_height: usize,
        num_points: usize,
        edge_weight: f32,
        seed: Option<u64>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let cloud = sampling::sample(
            intensity.as_array(),
            num_points,
            edge_weight,
            Dimensions::new(original_width, original_height),
            seed,
        )?;
        let flat: Vec<f64> = cloud.points.iter().flat_map(|p| [p.x, p.y]).collect();
        let array = Array2::from_shape_vec((cloud.points.len(), 2), flat).map_err(shape_error)?;
        Ok(array.into_pyarray(py))
    }

    /// Geometry type catalogue as a JSON string.
    #[pyfunction]
    pub fn geometry_types_json() -> PyResult<String> {
        serde_json::to_string(&crate::pipeline::geometry_types())
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Scene geometry Rust extension module
    #[pymodule]
    pub fn scene_geometry(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Mask operations
        m.add_function(wrap_pyfunction!(threshold_mask, m)?)?;
        m.add_function(wrap_pyfunction!(clean_mask, m)?)?;

        // Contours
        m.add_function(wrap_pyfunction!(trace_contours, m)?)?;

        // Extraction
        m.add_function(wrap_pyfunction!(detection_dimensions, m)?)?;
        m.add_function(wrap_pyfunction!(extract_levels, m)?)?;
        m.add_function(wrap_pyfunction!(sample_points, m)?)?;
        m.add_function(wrap_pyfunction!(geometry_types_json, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::scene_geometry;
