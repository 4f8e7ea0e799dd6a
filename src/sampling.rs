//! Probability-weighted point sampling.
//!
//! The intensity map is treated as an unnormalized density:
//! 1. Normalize to 0.0-1.0 (divide by 255)
//! 2. Apply the contrast curve `p' = p^g` with `g = 1 - 0.375 * edge_weight`
//! 3. Normalize so all weights sum to one
//! 4. Draw indices with replacement from the categorical distribution
//! 5. Map flat indices to (x, y) and rescale to original pixel space
//!
//! Sampling uses a seedable `StdRng`, so a fixed seed reproduces a cloud exactly.

use ndarray::{Array2, ArrayView2};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::PointCloudConfig;
use crate::error::{Error, Result, Stage};
use crate::geometry::{Dimensions, Point, PointCloud};
use crate::hierarchy::{detection_dimensions, run_detector, Detector, ExtractionObserver};

/// Contrast exponent for an edge weight in 0.0-1.0.
///
/// 0.0 leaves the map linear; the default 0.8 gives 0.7.
pub fn contrast_exponent(edge_weight: f32) -> Result<f64> {
    if !(0.0..=1.0).contains(&edge_weight) {
        return Err(Error::invalid(
            Stage::Sample,
            format!("edge_weight {edge_weight} outside 0.0-1.0"),
        ));
    }
    Ok(1.0 - 0.375 * edge_weight as f64)
}

/// Apply the contrast curve to every sample, in row-major order.
#[cfg(not(target_arch = "wasm32"))]
fn contrast_weights(samples: &[u8], exponent: f64) -> Vec<f64> {
    use rayon::prelude::*;

    samples
        .par_iter()
        .map(|&v| (v as f64 / 255.0).powf(exponent))
        .collect()
}

#[cfg(target_arch = "wasm32")]
fn contrast_weights(samples: &[u8], exponent: f64) -> Vec<f64> {
    samples
        .iter()
        .map(|&v| (v as f64 / 255.0).powf(exponent))
        .collect()
}

/// Build the normalized sampling distribution of an intensity map.
///
/// # Returns
/// Probabilities with the map's shape, summing to one.
///
/// # Errors
/// `InvalidInput` if the map is empty or all zero.
pub fn probability_map(intensity: ArrayView2<u8>, edge_weight: f32) -> Result<Array2<f64>> {
    let exponent = contrast_exponent(edge_weight)?;
    let (height, width) = intensity.dim();
    if width == 0 || height == 0 {
        return Err(Error::invalid(Stage::Sample, "intensity map is empty"));
    }

    let samples: Vec<u8> = intensity.iter().copied().collect();
    let mut weights = contrast_weights(&samples, exponent);

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(Error::invalid(
            Stage::Sample,
            "intensity map is all zero; no density to sample from",
        ));
    }
    for w in weights.iter_mut() {
        *w /= total;
    }

    Array2::from_shape_vec((height, width), weights)
        .map_err(|e| Error::invalid(Stage::Sample, e.to_string()))
}

/// Weighted point sampler.
#[derive(Debug, Clone, Default)]
pub struct PointSampler {
    config: PointCloudConfig,
}

impl PointSampler {
    pub fn new(config: PointCloudConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PointCloudConfig {
        &self.config
    }

    /// Sample `num_points` points from `intensity` using the configured seed.
    pub fn sample(&self, intensity: ArrayView2<u8>, original: Dimensions) -> Result<PointCloud> {
        sample(
            intensity,
            self.config.num_points,
            self.config.edge_weight,
            original,
            self.config.seed,
        )
    }

    /// Detect at the configured resolution, then sample.
    pub fn extract<D: Detector + ?Sized>(
        &self,
        detector: &mut D,
        original: Dimensions,
        observer: &mut dyn ExtractionObserver,
    ) -> Result<PointCloud> {
        let target = detection_dimensions(
            original.width,
            original.height,
            self.config.detect_resolution,
        )?;
        let detected = run_detector(detector, target)?;
        observer.on_detected(0, detected.view());

        let probabilities = probability_map(detected.view(), self.config.edge_weight)?;
        observer.on_probability(probabilities.view());

        let mut rng = make_rng(self.config.seed);
        let cloud = draw(&probabilities, self.config.num_points, original, &mut rng)?;

        log::info!(
            "sampled {} points from {}x{} detection for {}x{} image",
            cloud.points.len(),
            detected.ncols(),
            detected.nrows(),
            original.width,
            original.height
        );
        Ok(cloud)
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Draw a weighted point sample.
///
/// # Arguments
/// * `intensity` - Detection-resolution map (height, width); its shape gives the detect size
/// * `num_points` - Number of points to draw (with replacement)
/// * `edge_weight` - Edge emphasis in 0.0-1.0
/// * `original` - Original image size the points are scaled to
/// * `seed` - Fixed seed for reproducible output, or `None` for OS entropy
///
/// # Returns
/// Exactly `num_points` points in original pixel space
pub fn sample(
    intensity: ArrayView2<u8>,
    num_points: usize,
    edge_weight: f32,
    original: Dimensions,
    seed: Option<u64>,
) -> Result<PointCloud> {
    let mut rng = make_rng(seed);
    sample_with_rng(intensity, num_points, edge_weight, original, &mut rng)
}

/// Draw a weighted point sample using a caller-supplied RNG.
pub fn sample_with_rng<R: Rng + ?Sized>(
    intensity: ArrayView2<u8>,
    num_points: usize,
    edge_weight: f32,
    original: Dimensions,
    rng: &mut R,
) -> Result<PointCloud> {
    let probabilities = probability_map(intensity, edge_weight)?;
    draw(&probabilities, num_points, original, rng)
}

fn draw<R: Rng + ?Sized>(
    probabilities: &Array2<f64>,
    num_points: usize,
    original: Dimensions,
    rng: &mut R,
) -> Result<PointCloud> {
    if original.width == 0 || original.height == 0 {
        return Err(Error::invalid(
            Stage::Sample,
            format!("original dimensions {}x{} must be positive", original.width, original.height),
        ));
    }

    let (detect_height, detect_width) = probabilities.dim();
    let scale_x = original.width as f64 / detect_width as f64;
    let scale_y = original.height as f64 / detect_height as f64;

    let distribution = WeightedIndex::<f64>::new(probabilities.iter())
        .map_err(|e| Error::invalid(Stage::Sample, format!("invalid sampling weights: {e}")))?;

    let points = (0..num_points)
        .map(|_| {
            let index = distribution.sample(&mut *rng);
            let x = index % detect_width;
            let y = index / detect_width;
            Point::new(x as f64 * scale_x, y as f64 * scale_y)
        })
        .collect();

    Ok(PointCloud {
        points,
        dimensions: original,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectorError;

    fn bright_square(width: usize, height: usize, x0: usize, y0: usize, size: usize) -> Array2<u8> {
        let mut map = Array2::<u8>::zeros((height, width));
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                map[[y, x]] = 255;
            }
        }
        map
    }

    #[test]
    fn test_exponent_policy() {
        assert!((contrast_exponent(0.8).unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(contrast_exponent(0.0).unwrap(), 1.0);
        assert!(contrast_exponent(1.0).unwrap() < contrast_exponent(0.5).unwrap());
        assert!(contrast_exponent(1.1).is_err());
    }

    #[test]
    fn test_probability_map_sums_to_one() {
        let map = bright_square(20, 10, 2, 2, 4);
        let probabilities = probability_map(map.view(), 0.8).unwrap();
        assert_eq!(probabilities.dim(), (10, 20));
        assert!((probabilities.sum() - 1.0).abs() < 1e-9);
        assert_eq!(probabilities[[0, 0]], 0.0);
    }

    #[test]
    fn test_sample_count_invariant() {
        let mut map = Array2::<u8>::from_elem((32, 48), 3);
        map[[5, 5]] = 255;
        let original = Dimensions::new(480, 320);
        for n in [1usize, 1000, 50_000] {
            let cloud = sample(map.view(), n, 0.8, original, Some(11)).unwrap();
            assert_eq!(cloud.points.len(), n);
            assert_eq!(cloud.dimensions, original);
        }
    }

    #[test]
    fn test_uniform_map_samples_everywhere() {
        let map = Array2::<u8>::from_elem((4, 4), 200);
        let cloud = sample(map.view(), 2000, 0.8, Dimensions::new(4, 4), Some(3)).unwrap();
        let mut seen = Array2::<bool>::from_elem((4, 4), false);
        for p in &cloud.points {
            seen[[p.y as usize, p.x as usize]] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_bright_region_dominates() {
        let map = bright_square(100, 100, 40, 60, 10);
        let cloud = sample(map.view(), 10_000, 0.8, Dimensions::new(100, 100), Some(42)).unwrap();
        let inside = cloud
            .points
            .iter()
            .filter(|p| (40.0..50.0).contains(&p.x) && (60.0..70.0).contains(&p.y))
            .count();
        assert!(inside as f64 >= 0.95 * cloud.points.len() as f64);
    }

    #[test]
    fn test_points_scaled_to_original() {
        // Single lit pixel at (3, 1) in an 8x4 map of a 800x200 original
        let mut map = Array2::<u8>::zeros((4, 8));
        map[[1, 3]] = 255;
        let cloud = sample(map.view(), 5, 0.5, Dimensions::new(800, 200), Some(0)).unwrap();
        for p in &cloud.points {
            assert_eq!(*p, Point::new(300.0, 50.0));
        }
    }

    #[test]
    fn test_same_seed_same_cloud() {
        let map = bright_square(30, 30, 5, 5, 20);
        let a = sample(map.view(), 500, 0.8, Dimensions::new(300, 300), Some(9)).unwrap();
        let b = sample(map.view(), 500, 0.8, Dimensions::new(300, 300), Some(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_zero_map_rejected() {
        let map = Array2::<u8>::zeros((10, 10));
        let err = sample(map.view(), 10, 0.8, Dimensions::new(10, 10), Some(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput {
                stage: Stage::Sample,
                ..
            }
        ));
    }

    #[derive(Default)]
    struct ProbabilityRecorder {
        detected: Option<(usize, usize)>,
        probabilities: Option<Array2<f64>>,
    }

    impl ExtractionObserver for ProbabilityRecorder {
        fn on_detected(&mut self, _level: usize, intensity: ArrayView2<u8>) {
            self.detected = Some(intensity.dim());
        }

        fn on_probability(&mut self, probabilities: ArrayView2<f64>) {
            self.probabilities = Some(probabilities.to_owned());
        }
    }

    #[test]
    fn test_extract_reports_probability_map() {
        let sampler = PointSampler::new(PointCloudConfig {
            num_points: 200,
            detect_resolution: 64,
            seed: Some(4),
            ..Default::default()
        })
        .unwrap();
        let mut detector = |w: usize, h: usize| -> std::result::Result<Array2<u8>, DetectorError> {
            Ok(bright_square(w, h, 8, 8, 16))
        };
        let mut recorder = ProbabilityRecorder::default();
        let cloud = sampler
            .extract(&mut detector, Dimensions::new(640, 320), &mut recorder)
            .unwrap();

        assert_eq!(cloud.points.len(), 200);
        assert_eq!(recorder.detected, Some((32, 64)));
        let probabilities = recorder.probabilities.unwrap();
        assert_eq!(probabilities.dim(), (32, 64));
        assert!((probabilities.sum() - 1.0).abs() < 1e-9);
        assert!(probabilities.iter().all(|&p| p >= 0.0));
        assert_eq!(probabilities[[0, 0]], 0.0);
    }

    #[test]
    fn test_zero_points_is_empty_cloud() {
        let map = bright_square(10, 10, 0, 0, 3);
        let cloud = sample(map.view(), 0, 0.8, Dimensions::new(10, 10), None).unwrap();
        assert!(cloud.points.is_empty());
    }
}
