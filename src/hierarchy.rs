//! Multi-resolution line-art extraction.
//!
//! For each detection resolution the external detector is asked for an edge
//! map, which is then thresholded, cleaned, traced, simplified and segmented
//! back into original-image pixel space. Levels are independent of each other.
//!
//! ## Pipeline per level
//! 1. Detection dimensions: longer original axis -> resolution, aspect preserved
//! 2. `Detector::detect` at those dimensions
//! 3. Threshold at `threshold * 255`
//! 4. Remove components below `min_component_area`
//! 5. Trace; drop contours not longer than `base_min_length * resolution / 512`;
//!    simplify with `simplify_epsilon`
//! 6. Scale segments by `original / detected` per axis

use ndarray::{Array2, ArrayView2};

use crate::config::LineArtConfig;
use crate::contour::trace_filtered;
use crate::error::{DetectorError, Error, Result, Stage};
use crate::geometry::{Dimensions, LineArt, PathLevel};
use crate::mask::{clean_mask, threshold_mask};
use crate::segment::to_path_level;

/// Source of edge/probability maps.
///
/// Implementations own the source image; the core only asks for a map of a
/// given size. The returned buffer has shape (height, width).
pub trait Detector {
    fn detect(
        &mut self,
        width: usize,
        height: usize,
    ) -> std::result::Result<Array2<u8>, DetectorError>;
}

impl<F, E> Detector for F
where
    F: FnMut(usize, usize) -> std::result::Result<Array2<u8>, E>,
    E: Into<DetectorError>,
{
    fn detect(
        &mut self,
        width: usize,
        height: usize,
    ) -> std::result::Result<Array2<u8>, DetectorError> {
        self(width, height).map_err(Into::into)
    }
}

/// Hooks receiving intermediate buffers, for debugging or streaming.
///
/// All methods default to doing nothing.
pub trait ExtractionObserver {
    /// Raw detector output for a level.
    fn on_detected(&mut self, _level: usize, _intensity: ArrayView2<u8>) {}

    /// Thresholded mask for a level.
    fn on_mask(&mut self, _level: usize, _mask: ArrayView2<u8>) {}

    /// Mask after small-component removal.
    fn on_cleaned(&mut self, _level: usize, _mask: ArrayView2<u8>) {}

    /// A finished level, before the next one starts.
    fn on_level(&mut self, _level: usize, _paths: &PathLevel) {}

    /// Normalized sampling distribution (point-cloud mode).
    fn on_probability(&mut self, _probabilities: ArrayView2<f64>) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExtractionObserver for NoopObserver {}

/// Detection buffer size for a given resolution.
///
/// The longer original axis maps to `resolution`; the shorter axis is
/// `resolution * short / long`, rounded down and never below one pixel.
pub fn detection_dimensions(
    original_width: usize,
    original_height: usize,
    resolution: usize,
) -> Result<Dimensions> {
    if original_width == 0 || original_height == 0 {
        return Err(Error::invalid(
            Stage::Config,
            format!("original dimensions {original_width}x{original_height} must be positive"),
        ));
    }
    if resolution == 0 {
        return Err(Error::invalid(Stage::Config, "detection resolution must be positive"));
    }

    let scaled = |short: usize, long: usize| {
        let v = (resolution as u128 * short as u128) / long as u128;
        (v as usize).max(1)
    };

    let dims = if original_width >= original_height {
        Dimensions::new(resolution, scaled(original_height, original_width))
    } else {
        Dimensions::new(scaled(original_width, original_height), resolution)
    };
    Ok(dims)
}

/// Ask the detector for a map and check its shape.
pub(crate) fn run_detector<D: Detector + ?Sized>(
    detector: &mut D,
    target: Dimensions,
) -> Result<Array2<u8>> {
    let intensity = detector
        .detect(target.width, target.height)
        .map_err(Error::collaborator)?;

    let (height, width) = intensity.dim();
    if width == 0 || height == 0 {
        return Err(Error::collaborator(format!(
            "detector returned an empty {width}x{height} buffer for {}x{} request",
            target.width, target.height
        )));
    }
    if width != target.width || height != target.height {
        log::debug!(
            "detector returned {}x{} for requested {}x{}; scaling from returned size",
            width,
            height,
            target.width,
            target.height
        );
    }
    Ok(intensity)
}

/// Hierarchical line-art extractor.
#[derive(Debug, Clone, Default)]
pub struct HierarchicalExtractor {
    config: LineArtConfig,
}

impl HierarchicalExtractor {
    pub fn new(config: LineArtConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LineArtConfig {
        &self.config
    }

    /// Extract one path level per configured resolution.
    pub fn extract_levels<D: Detector + ?Sized>(
        &self,
        detector: &mut D,
        original_width: usize,
        original_height: usize,
    ) -> Result<Vec<PathLevel>> {
        self.extract_levels_observed(detector, original_width, original_height, &mut NoopObserver)
    }

    /// Extract all levels, reporting intermediate buffers to `observer`.
    ///
    /// Fails as a whole if any level fails; the error names the level.
    pub fn extract_levels_observed<D: Detector + ?Sized>(
        &self,
        detector: &mut D,
        original_width: usize,
        original_height: usize,
        observer: &mut dyn ExtractionObserver,
    ) -> Result<Vec<PathLevel>> {
        let mut levels = Vec::with_capacity(self.config.resolutions.len());

        for (level, &resolution) in self.config.resolutions.iter().enumerate() {
            let paths = self
                .extract_level(
                    detector,
                    original_width,
                    original_height,
                    level,
                    resolution,
                    observer,
                )
                .map_err(|source| Error::Level {
                    level,
                    resolution,
                    source: Box::new(source),
                })?;

            observer.on_level(level, &paths);
            levels.push(paths);
        }

        log::info!(
            "extracted {} levels ({} segments) for {}x{} image",
            levels.len(),
            levels.iter().map(PathLevel::len).sum::<usize>(),
            original_width,
            original_height
        );

        Ok(levels)
    }

    /// Extract all levels wrapped as a [`LineArt`] document.
    pub fn extract_line_art<D: Detector + ?Sized>(
        &self,
        detector: &mut D,
        original_width: usize,
        original_height: usize,
        observer: &mut dyn ExtractionObserver,
    ) -> Result<LineArt> {
        self.extract_levels_observed(detector, original_width, original_height, observer)
            .map(LineArt::new)
    }

    fn extract_level<D: Detector + ?Sized>(
        &self,
        detector: &mut D,
        original_width: usize,
        original_height: usize,
        level: usize,
        resolution: usize,
        observer: &mut dyn ExtractionObserver,
    ) -> Result<PathLevel> {
        let target = detection_dimensions(original_width, original_height, resolution)?;
        let detected = run_detector(detector, target)?;
        observer.on_detected(level, detected.view());

        let (detected_height, detected_width) = detected.dim();

        let binary = threshold_mask(detected.view(), self.config.threshold)?;
        observer.on_mask(level, binary.view());

        let cleaned = clean_mask(binary.view(), self.config.min_component_area)?;
        observer.on_cleaned(level, cleaned.view());

        let min_length = self.config.min_length_for(resolution);
        let contours = trace_filtered(
            cleaned.view(),
            min_length,
            self.config.simplify_epsilon,
            self.config.border_margin,
        );

        let scale_x = original_width as f64 / detected_width as f64;
        let scale_y = original_height as f64 / detected_height as f64;
        let paths = to_path_level(&contours, scale_x, scale_y);

        log::debug!(
            "level {}: resolution {}, detected {}x{}, scale ({:.4}, {:.4}), {} contours, {} segs",
            level,
            resolution,
            detected_width,
            detected_height,
            scale_x,
            scale_y,
            contours.len(),
            paths.len()
        );

        Ok(paths)
    }
}

/// Extract levels with default policy values for area and epsilon.
///
/// # Arguments
/// * `detector` - Edge map source
/// * `resolutions` - Detection resolutions, one output level each
/// * `original_width`, `original_height` - Original image size
/// * `threshold` - Binarization threshold (0.0-1.0)
/// * `base_min_length` - Minimum contour length at resolution 512
pub fn extract_levels<D: Detector + ?Sized>(
    detector: &mut D,
    resolutions: &[usize],
    original_width: usize,
    original_height: usize,
    threshold: f32,
    base_min_length: f64,
) -> Result<Vec<PathLevel>> {
    let extractor = HierarchicalExtractor::new(LineArtConfig {
        resolutions: resolutions.to_vec(),
        threshold,
        base_min_length,
        ..Default::default()
    })?;
    extractor.extract_levels(detector, original_width, original_height)
}
