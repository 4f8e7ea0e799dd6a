//! Persisted geometry types.
//!
//! These mirror the JSON documents consumed by the scene renderer:
//! - point clouds: `{ "points": [{"x", "y"}, ...], "dimensions": {"width", "height"} }`
//! - line art: `{ "levels": [[{"start": {"x", "y"}, "end": {"x", "y"}}, ...], ...] }`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, Stage};

/// A point in original-image pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A straight line between two points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// All segments extracted at one detection resolution.
///
/// Segment order carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathLevel {
    pub segments: Vec<Segment>,
}

impl PathLevel {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }
}

/// Image size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

/// Weighted point sample over an image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<Point>,
    pub dimensions: Dimensions,
}

/// Hierarchical line art, one level per detection resolution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineArt {
    pub levels: Vec<PathLevel>,
}

impl LineArt {
    pub fn new(levels: Vec<PathLevel>) -> Self {
        Self { levels }
    }

    /// Number of segments across all levels.
    pub fn total_segments(&self) -> usize {
        self.levels.iter().map(PathLevel::len).sum()
    }

    /// Look up a segment by its index in the concatenation of all levels.
    ///
    /// Returns the level index together with the segment.
    pub fn segment_at(&self, global_index: usize) -> Option<(usize, &Segment)> {
        let mut remaining = global_index;
        for (level, path) in self.levels.iter().enumerate() {
            if remaining < path.len() {
                return Some((level, &path.segments[remaining]));
            }
            remaining -= path.len();
        }
        None
    }
}

/// Geometry flavour selected by the scene layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    PointCloud,
    LineArt,
}

impl GeometryType {
    pub const ALL: [GeometryType; 2] = [GeometryType::PointCloud, GeometryType::LineArt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PointCloud => "pointcloud",
            Self::LineArt => "lineart",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pointcloud" => Ok(Self::PointCloud),
            "lineart" => Ok(Self::LineArt),
            other => Err(Error::invalid(
                Stage::Config,
                format!("unsupported geometry type '{other}'"),
            )),
        }
    }
}

/// An extraction result as persisted by a [`GeometryStore`](crate::store::GeometryStore).
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryArtifact {
    PointCloud(PointCloud),
    LineArt(LineArt),
}

impl GeometryArtifact {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Self::PointCloud(_) => GeometryType::PointCloud,
            Self::LineArt(_) => GeometryType::LineArt,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        let json = match self {
            Self::PointCloud(cloud) => serde_json::to_string(cloud)?,
            Self::LineArt(art) => serde_json::to_string(art)?,
        };
        Ok(json)
    }

    /// Decode a stored document of the given type.
    pub fn from_json(geometry_type: GeometryType, json: &str) -> Result<Self> {
        let artifact = match geometry_type {
            GeometryType::PointCloud => Self::PointCloud(serde_json::from_str(json)?),
            GeometryType::LineArt => Self::LineArt(serde_json::from_str(json)?),
        };
        Ok(artifact)
    }
}

impl From<PointCloud> for GeometryArtifact {
    fn from(cloud: PointCloud) -> Self {
        Self::PointCloud(cloud)
    }
}

impl From<LineArt> for GeometryArtifact {
    fn from(art: LineArt) -> Self {
        Self::LineArt(art)
    }
}
