//! Extraction parameters.
//!
//! Every policy value used by the pipelines lives here rather than in module
//! constants, so callers can override any of them per call. Configuration can
//! be loaded from a JSON file; missing fields fall back to the defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, Stage};

/// Parameters for hierarchical line-art extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineArtConfig {
    /// Detection resolutions, coarsest first by convention.
    pub resolutions: Vec<usize>,
    /// Binarization threshold in 0.0-1.0 (multiplied by 255).
    pub threshold: f32,
    /// Minimum contour length at resolution 512; scaled linearly per level.
    pub base_min_length: f64,
    /// Connected components smaller than this (in pixels) are removed.
    pub min_component_area: usize,
    /// Douglas-Peucker tolerance in detection pixels.
    pub simplify_epsilon: f64,
    /// Drop contours reaching within this many pixels of the border (0 = keep all).
    pub border_margin: usize,
}

impl Default for LineArtConfig {
    fn default() -> Self {
        Self {
            resolutions: vec![512, 768, 1024],
            threshold: 0.3,
            base_min_length: 10.0,
            min_component_area: 50,
            simplify_epsilon: 2.0,
            border_margin: 0,
        }
    }
}

impl LineArtConfig {
    pub fn validate(&self) -> Result<()> {
        if self.resolutions.iter().any(|&r| r == 0) {
            return Err(Error::invalid(Stage::Config, "resolutions must be positive"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::invalid(
                Stage::Config,
                format!("threshold {} outside 0.0-1.0", self.threshold),
            ));
        }
        if !self.base_min_length.is_finite() || self.base_min_length < 0.0 {
            return Err(Error::invalid(
                Stage::Config,
                format!("base_min_length {} must be non-negative", self.base_min_length),
            ));
        }
        if !self.simplify_epsilon.is_finite() || self.simplify_epsilon < 0.0 {
            return Err(Error::invalid(
                Stage::Config,
                format!("simplify_epsilon {} must be non-negative", self.simplify_epsilon),
            ));
        }
        Ok(())
    }

    /// Minimum contour length at a given detection resolution.
    pub fn min_length_for(&self, resolution: usize) -> f64 {
        self.base_min_length * (resolution as f64 / 512.0)
    }
}

/// Parameters for probability-weighted point sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointCloudConfig {
    pub num_points: usize,
    /// Edge emphasis in 0.0-1.0; higher values lower the contrast exponent.
    pub edge_weight: f32,
    /// Resolution of the longer axis of the detection buffer.
    pub detect_resolution: usize,
    /// Fixed RNG seed for reproducible sampling.
    pub seed: Option<u64>,
}

impl Default for PointCloudConfig {
    fn default() -> Self {
        Self {
            num_points: 10_000,
            edge_weight: 0.8,
            detect_resolution: 512,
            seed: None,
        }
    }
}

impl PointCloudConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.edge_weight) {
            return Err(Error::invalid(
                Stage::Config,
                format!("edge_weight {} outside 0.0-1.0", self.edge_weight),
            ));
        }
        if self.detect_resolution == 0 {
            return Err(Error::invalid(Stage::Config, "detect_resolution must be positive"));
        }
        Ok(())
    }
}

/// Combined configuration for both extraction modes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub lineart: LineArtConfig,
    pub pointcloud: PointCloudConfig,
}

impl GeometryConfig {
    pub fn validate(&self) -> Result<()> {
        self.lineart.validate()?;
        self.pointcloud.validate()
    }
}

/// Load and validate a JSON configuration file.
pub fn load_config(path: &Path) -> Result<GeometryConfig> {
    let data = fs::read_to_string(path)?;
    let config: GeometryConfig = serde_json::from_str(&data)?;
    config.validate()?;
    log::debug!("loaded geometry config from {}", path.display());
    Ok(config)
}
