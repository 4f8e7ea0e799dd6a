//! Persistence of extracted geometry.
//!
//! Artifacts are JSON documents addressed by `(geometry_type, key)`, where the
//! key is a plain file name chosen by the scene layer. Writing the same key
//! again replaces the previous artifact; concurrent writers to one key are not
//! serialized and the last completed write wins.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::NamedTempFile;

use crate::error::{Error, Result, Stage};
use crate::geometry::{GeometryArtifact, GeometryType};

/// Key-value storage for geometry artifacts.
pub trait GeometryStore {
    /// Store `artifact` under `(geometry_type, key)`, replacing any previous one.
    fn put(
        &self,
        scene_id: &str,
        geometry_type: GeometryType,
        key: &str,
        artifact: &GeometryArtifact,
    ) -> Result<()>;

    /// Load the artifact stored under `(geometry_type, key)`.
    fn get(
        &self,
        scene_id: &str,
        geometry_type: GeometryType,
        key: &str,
    ) -> Result<GeometryArtifact>;
}

/// Check that `key` is a bare file name.
fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\'])
        || key.contains('\0');
    if invalid {
        return Err(Error::invalid(
            Stage::Store,
            format!("storage key '{key}' is not a plain file name"),
        ));
    }
    Ok(())
}

fn validate_put(
    scene_id: &str,
    geometry_type: GeometryType,
    key: &str,
    artifact: &GeometryArtifact,
) -> Result<()> {
    if scene_id.is_empty() {
        return Err(Error::invalid(Stage::Store, "scene id must not be empty"));
    }
    validate_key(key)?;
    if artifact.geometry_type() != geometry_type {
        return Err(Error::invalid(
            Stage::Store,
            format!(
                "{} artifact cannot be stored as {}",
                artifact.geometry_type(),
                geometry_type
            ),
        ));
    }
    Ok(())
}

fn not_found(geometry_type: GeometryType, key: &str) -> Error {
    Error::NotFound {
        geometry_type: geometry_type.to_string(),
        key: key.to_string(),
    }
}

/// Store writing one JSON file per artifact under `<root>/<geometry_type>/<key>`.
#[derive(Debug, Clone)]
pub struct FileGeometryStore {
    root: PathBuf,
}

impl FileGeometryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for an artifact.
    pub fn path_for(&self, geometry_type: GeometryType, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(geometry_type.as_str()).join(key))
    }
}

impl GeometryStore for FileGeometryStore {
    fn put(
        &self,
        scene_id: &str,
        geometry_type: GeometryType,
        key: &str,
        artifact: &GeometryArtifact,
    ) -> Result<()> {
        validate_put(scene_id, geometry_type, key, artifact)?;

        let dir = self.root.join(geometry_type.as_str());
        fs::create_dir_all(&dir)?;

        // Write next to the target and rename, so readers never see a partial file
        let json = artifact.to_json()?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        let path = dir.join(key);
        tmp.persist(&path).map_err(|e| Error::Io(e.error))?;

        log::info!(
            "stored {} geometry for scene '{}' at {} ({} bytes)",
            geometry_type,
            scene_id,
            path.display(),
            json.len()
        );
        Ok(())
    }

    fn get(
        &self,
        scene_id: &str,
        geometry_type: GeometryType,
        key: &str,
    ) -> Result<GeometryArtifact> {
        let path = self.path_for(geometry_type, key)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(not_found(geometry_type, key));
            }
            Err(e) => return Err(e.into()),
        };
        log::debug!(
            "loaded {} geometry for scene '{}' from {}",
            geometry_type,
            scene_id,
            path.display()
        );
        GeometryArtifact::from_json(geometry_type, &json)
    }
}

/// In-process store keeping serialized artifacts in memory.
#[derive(Debug, Default)]
pub struct MemoryGeometryStore {
    entries: Mutex<HashMap<(GeometryType, String), String>>,
}

impl MemoryGeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<(GeometryType, String), String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Io(io::Error::other("geometry store lock poisoned")))
    }
}

impl GeometryStore for MemoryGeometryStore {
    fn put(
        &self,
        scene_id: &str,
        geometry_type: GeometryType,
        key: &str,
        artifact: &GeometryArtifact,
    ) -> Result<()> {
        validate_put(scene_id, geometry_type, key, artifact)?;
        let json = artifact.to_json()?;
        self.lock()?.insert((geometry_type, key.to_string()), json);
        log::debug!("stored {} geometry for scene '{}' under '{}'", geometry_type, scene_id, key);
        Ok(())
    }

    fn get(
        &self,
        _scene_id: &str,
        geometry_type: GeometryType,
        key: &str,
    ) -> Result<GeometryArtifact> {
        validate_key(key)?;
        let json = self
            .lock()?
            .get(&(geometry_type, key.to_string()))
            .cloned()
            .ok_or_else(|| not_found(geometry_type, key))?;
        GeometryArtifact::from_json(geometry_type, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Dimensions, LineArt, PathLevel, Point, PointCloud, Segment};

    fn cloud() -> GeometryArtifact {
        GeometryArtifact::PointCloud(PointCloud {
            points: vec![Point::new(1.25, 2.5), Point::new(0.0, 99.75)],
            dimensions: Dimensions::new(100, 100),
        })
    }

    fn line_art() -> GeometryArtifact {
        GeometryArtifact::LineArt(LineArt::new(vec![
            PathLevel::new(vec![Segment::new(Point::new(0.0, 0.0), Point::new(3.5, 4.0))]),
            PathLevel::default(),
        ]))
    }

    #[test]
    fn test_file_round_trip_and_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGeometryStore::new(dir.path());

        store.put("scene1", GeometryType::PointCloud, "pile.json", &cloud()).unwrap();
        store.put("scene1", GeometryType::LineArt, "pile.json", &line_art()).unwrap();

        assert!(dir.path().join("pointcloud").join("pile.json").is_file());
        assert!(dir.path().join("lineart").join("pile.json").is_file());
        assert_eq!(store.get("scene1", GeometryType::PointCloud, "pile.json").unwrap(), cloud());
        assert_eq!(store.get("scene1", GeometryType::LineArt, "pile.json").unwrap(), line_art());
    }

    #[test]
    fn test_file_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGeometryStore::new(dir.path());
        store.put("s", GeometryType::PointCloud, "a.json", &cloud()).unwrap();

        let replacement = GeometryArtifact::PointCloud(PointCloud {
            points: vec![],
            dimensions: Dimensions::new(1, 1),
        });
        store.put("s", GeometryType::PointCloud, "a.json", &replacement).unwrap();
        assert_eq!(store.get("s", GeometryType::PointCloud, "a.json").unwrap(), replacement);

        // No temp files left behind
        let files = fs::read_dir(dir.path().join("pointcloud")).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGeometryStore::new(dir.path());
        let err = store.get("s", GeometryType::LineArt, "missing.json").unwrap_err();
        assert!(err.is_not_found());

        let memory = MemoryGeometryStore::new();
        assert!(memory.get("s", GeometryType::LineArt, "missing.json").unwrap_err().is_not_found());
    }

    #[test]
    fn test_inexact_coordinates_survive_storage() {
        // Multiples of 1600/192 are not exactly representable in binary
        let segments: Vec<Segment> = (0..2000)
            .map(|i| {
                let v = i as f64 * 1600.0 / 192.0;
                Segment::new(Point::new(v, v / 3.0), Point::new(v + 0.1, v * 0.7))
            })
            .collect();
        let art = GeometryArtifact::LineArt(LineArt::new(vec![PathLevel::new(segments)]));

        let dir = tempfile::tempdir().unwrap();
        let store = FileGeometryStore::new(dir.path());
        store.put("s", GeometryType::LineArt, "fine.json", &art).unwrap();
        assert_eq!(store.get("s", GeometryType::LineArt, "fine.json").unwrap(), art);

        let memory = MemoryGeometryStore::new();
        memory.put("s", GeometryType::LineArt, "fine.json", &art).unwrap();
        assert_eq!(memory.get("s", GeometryType::LineArt, "fine.json").unwrap(), art);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let memory = MemoryGeometryStore::new();
        memory.put("s", GeometryType::PointCloud, "a.json", &cloud()).unwrap();

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = memory.entries.lock().unwrap();
            panic!("writer crashed while holding the lock");
        }));
        assert!(poisoned.is_err());

        assert!(matches!(memory.len(), Err(Error::Io(_))));
        assert!(memory.is_empty().is_err());
        assert!(memory.get("s", GeometryType::PointCloud, "a.json").is_err());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGeometryStore::new(dir.path());
        for key in ["", "..", "../escape.json", "nested/file.json"] {
            assert!(store.put("s", GeometryType::PointCloud, key, &cloud()).is_err(), "{key}");
        }
    }

    #[test]
    fn test_rejects_mismatched_type() {
        let memory = MemoryGeometryStore::new();
        let err = memory.put("s", GeometryType::LineArt, "x.json", &cloud()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(memory.is_empty().unwrap());
    }

    #[test]
    fn test_memory_round_trip() {
        let memory = MemoryGeometryStore::new();
        memory.put("s", GeometryType::LineArt, "x.json", &line_art()).unwrap();
        memory.put("s", GeometryType::LineArt, "x.json", &line_art()).unwrap();
        assert_eq!(memory.len().unwrap(), 1);
        assert_eq!(memory.get("other", GeometryType::LineArt, "x.json").unwrap(), line_art());
    }
}
