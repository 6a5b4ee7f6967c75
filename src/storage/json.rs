//! Pretty-printed JSON files with temp-file + rename writes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, warn};

use super::StorageError;

fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn to_pretty<T: Serialize>(value: &T) -> Result<String, StorageError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Read a JSON file. Missing file → `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    let value = serde_json::from_str(&contents)?;
    debug!("Read {:?}", path);
    Ok(Some(value))
}

/// Every `*.json` file directly inside `dir`, sorted. Missing dir → empty.
pub fn json_files(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let pattern = format!("{}/*.json", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern)? {
        paths.push(entry.map_err(|e| StorageError::Io(e.into()))?);
    }
    paths.sort();
    Ok(paths)
}

/// Write a single JSON file via a sibling temp file and rename.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    ensure_parent(path)?;
    let tmp = temp_path(path);
    fs::write(&tmp, to_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    debug!("Wrote {:?}", path);
    Ok(())
}

/// A set of files replaced together.
///
/// Every file is serialized and written to its temp path first; only when all
/// of them are staged are they renamed into place, and only then are queued
/// removals applied. A failure while staging leaves every previous file
/// untouched.
#[derive(Debug, Default)]
pub struct StagedBatch {
    entries: Vec<(PathBuf, String)>,
    removals: Vec<PathBuf>,
}

impl StagedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `value` for `path`. Serialization errors surface here.
    pub fn add<T: Serialize>(&mut self, path: PathBuf, value: &T) -> Result<(), StorageError> {
        let json = to_pretty(value)?;
        self.entries.push((path, json));
        Ok(())
    }

    /// Queue `path` for deletion once every write has been swapped in.
    pub fn remove(&mut self, path: PathBuf) {
        self.removals.push(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.removals.is_empty()
    }

    /// Stage then swap in every file. Returns the number of files written.
    ///
    /// If a rename fails part way, the files already swapped in are logged
    /// and the remaining temp files are discarded.
    pub fn commit(self) -> Result<usize, StorageError> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(self.entries.len());

        for (path, json) in &self.entries {
            let tmp = temp_path(path);
            let result = ensure_parent(path)
                .and_then(|_| fs::write(&tmp, json).map_err(StorageError::from));
            if let Err(e) = result {
                warn!("Staging {:?} failed, discarding {} staged files", path, staged.len());
                for (tmp, _) in &staged {
                    let _ = fs::remove_file(tmp);
                }
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
            staged.push((tmp, path.clone()));
        }

        for (done, (tmp, path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, path) {
                let swapped: Vec<&PathBuf> = staged[..done].iter().map(|(_, p)| p).collect();
                error!(
                    "Rename of {:?} failed after {} of {} files were swapped in: {:?}",
                    path,
                    done,
                    staged.len(),
                    swapped
                );
                for (tmp, _) in &staged[done..] {
                    let _ = fs::remove_file(tmp);
                }
                return Err(e.into());
            }
        }

        for path in &self.removals {
            if path.exists() {
                fs::remove_file(path)?;
                info!("Removed stale {:?}", path);
            }
        }

        info!("Committed {} files", staged.len());
        Ok(staged.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestEntity {
        id: String,
        value: u32,
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("entity.json");
        let entity = TestEntity {
            id: "1".to_string(),
            value: 100,
        };

        write_json_atomic(&path, &entity).unwrap();
        let read: Option<TestEntity> = read_json(&path).unwrap();
        assert_eq!(read, Some(entity));
        assert!(!temp_path(&path).exists());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"id\""));
    }

    #[test]
    fn test_read_missing() {
        let temp_dir = TempDir::new().unwrap();
        let read: Option<TestEntity> = read_json(&temp_dir.path().join("none.json")).unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn test_read_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let result: Result<Option<TestEntity>, _> = read_json(&path);
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[test]
    fn test_batch_commit() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.json");
        let b = temp_dir.path().join("sub").join("b.json");

        let mut batch = StagedBatch::new();
        batch.add(a.clone(), &vec![1, 2, 3]).unwrap();
        batch.add(b.clone(), &"hello").unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.commit().unwrap(), 2);

        let read_a: Option<Vec<u32>> = read_json(&a).unwrap();
        assert_eq!(read_a, Some(vec![1, 2, 3]));
        assert!(b.exists());
    }

    #[test]
    fn test_batch_failure_leaves_previous_files() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.json");
        write_json_atomic(&good, &"old").unwrap();

        // A regular file where a directory is needed makes staging fail.
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let bad = blocker.join("bad.json");

        let mut batch = StagedBatch::new();
        batch.add(good.clone(), &"new").unwrap();
        batch.add(bad, &"never").unwrap();
        assert!(batch.commit().is_err());

        let read: Option<String> = read_json(&good).unwrap();
        assert_eq!(read.as_deref(), Some("old"));
        assert!(!temp_path(&good).exists());
    }

    #[test]
    fn test_batch_rename_failure_discards_remaining_temps() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.json");

        // A non-empty directory cannot be replaced by a rename.
        let occupied = temp_dir.path().join("occupied.json");
        fs::create_dir(&occupied).unwrap();
        fs::write(occupied.join("keep"), "x").unwrap();

        let mut batch = StagedBatch::new();
        batch.add(first.clone(), &"new").unwrap();
        batch.add(occupied.clone(), &"never").unwrap();
        assert!(batch.commit().is_err());

        let read: Option<String> = read_json(&first).unwrap();
        assert_eq!(read.as_deref(), Some("new"));
        assert!(!temp_path(&occupied).exists());
        assert!(occupied.join("keep").exists());
    }

    #[test]
    fn test_batch_removals_after_writes() {
        let temp_dir = TempDir::new().unwrap();
        let kept = temp_dir.path().join("kept.json");
        let stale = temp_dir.path().join("stale.json");
        write_json_atomic(&stale, &"old").unwrap();

        let mut batch = StagedBatch::new();
        batch.add(kept.clone(), &1).unwrap();
        batch.remove(stale.clone());
        batch.remove(temp_dir.path().join("never-existed.json"));
        assert_eq!(batch.commit().unwrap(), 1);

        assert!(kept.exists());
        assert!(!stale.exists());
    }

    #[test]
    fn test_json_files_lists_only_json() {
        let temp_dir = TempDir::new().unwrap();
        assert!(json_files(&temp_dir.path().join("missing")).unwrap().is_empty());

        fs::write(temp_dir.path().join("b.json"), "1").unwrap();
        fs::write(temp_dir.path().join("a.json"), "1").unwrap();
        fs::write(temp_dir.path().join("a.json.bak"), "1").unwrap();
        let names: Vec<String> = json_files(temp_dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }
}
