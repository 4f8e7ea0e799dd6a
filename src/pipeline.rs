//! Scene-layer entry points.
//!
//! Selects the extraction mode for a requested geometry type, runs it against
//! a detector and optionally persists the result.

use serde::Serialize;

use crate::config::GeometryConfig;
use crate::error::Result;
use crate::geometry::{Dimensions, GeometryArtifact, GeometryType};
use crate::hierarchy::{Detector, ExtractionObserver, HierarchicalExtractor, NoopObserver};
use crate::sampling::PointSampler;
use crate::store::GeometryStore;

/// Run the extraction mode selected by `geometry_type`.
pub fn extract_geometry<D: Detector + ?Sized>(
    detector: &mut D,
    original: Dimensions,
    geometry_type: GeometryType,
    config: &GeometryConfig,
    observer: &mut dyn ExtractionObserver,
) -> Result<GeometryArtifact> {
    let artifact = match geometry_type {
        GeometryType::LineArt => {
            let extractor = HierarchicalExtractor::new(config.lineart.clone())?;
            extractor
                .extract_line_art(detector, original.width, original.height, observer)?
                .into()
        }
        GeometryType::PointCloud => {
            let sampler = PointSampler::new(config.pointcloud.clone())?;
            sampler.extract(detector, original, observer)?.into()
        }
    };
    Ok(artifact)
}

/// Parse the geometry type, extract, and store the result under `key`.
///
/// Nothing is written unless extraction succeeds.
pub fn extract_and_store<S, D>(
    store: &S,
    detector: &mut D,
    scene_id: &str,
    geometry_type: &str,
    key: &str,
    original: Dimensions,
    config: &GeometryConfig,
) -> Result<GeometryArtifact>
where
    S: GeometryStore + ?Sized,
    D: Detector + ?Sized,
{
    let geometry_type: GeometryType = geometry_type.parse()?;
    let artifact = extract_geometry(detector, original, geometry_type, config, &mut NoopObserver)?;
    store.put(scene_id, geometry_type, key, &artifact)?;
    Ok(artifact)
}

/// Metadata for one tunable option of a geometry type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub description: &'static str,
}

/// Catalogue entry describing a geometry type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryTypeInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub options: Vec<OptionInfo>,
}

/// Geometry types available to configuration tools.
pub fn geometry_types() -> Vec<GeometryTypeInfo> {
    vec![
        GeometryTypeInfo {
            name: GeometryType::PointCloud.as_str(),
            description: "Point cloud weighted by edge intensity",
            options: vec![
                OptionInfo {
                    name: "num_points",
                    kind: "int",
                    default: 10_000.0,
                    min: 1_000.0,
                    max: 50_000.0,
                    description: "Number of points to sample",
                },
                OptionInfo {
                    name: "edge_weight",
                    kind: "float",
                    default: 0.8,
                    min: 0.0,
                    max: 1.0,
                    description: "Emphasis on edges versus flat regions",
                },
            ],
        },
        GeometryTypeInfo {
            name: GeometryType::LineArt.as_str(),
            description: "Hierarchical line art from multi-resolution edge detection",
            options: vec![],
        },
    ]
}
