use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::bundle::{BundleSource, normalize_bundle_path};

/// In-memory reader for downloaded or synthetic bundles.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBundleReader {
    /// Keyed by normalized relative path.
    files: BTreeMap<String, Vec<u8>>,
}

impl InMemoryBundleReader {
    pub fn new(files: BTreeMap<String, Vec<u8>>) -> Self {
        let files = files
            .into_iter()
            .map(|(path, bytes)| (normalize_bundle_path(path), bytes))
            .collect();
        Self { files }
    }

    /// Read every file below `dir`, keyed by its path relative to `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = dir.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {}", root.display()),
            ));
        }

        let mut files = BTreeMap::new();
        // Canonical directories already walked; symlinks may point back up the tree.
        let mut visited = HashSet::from([root.clone()]);
        let mut stack = vec![root.clone()];
        while let Some(current) = stack.pop() {
            for entry in fs::read_dir(&current)? {
                let path = entry?.path();
                if path.is_dir() {
                    if visited.insert(path.canonicalize()?) {
                        stack.push(path);
                    } else {
                        log::warn!("Skipping already visited directory {}", path.display());
                    }
                } else if path.is_file() {
                    let rel = path.strip_prefix(&root).unwrap_or(&path);
                    let rel = normalize_bundle_path(rel.to_string_lossy());
                    files.insert(rel, fs::read(&path)?);
                }
            }
        }

        Ok(Self { files })
    }

    /// Add a file, replacing any previous file at the same path.
    pub fn with_file(mut self, path: impl AsRef<str>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(normalize_bundle_path(path.as_ref()), bytes.into());
        self
    }
}

impl BundleSource for InMemoryBundleReader {
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, String> {
        let rel = normalize_bundle_path(path);
        let bytes = self
            .files
            .get(&rel)
            .ok_or_else(|| format!("No file `{rel}` in artifact"))?;
        Ok(Box::new(std::io::Cursor::new(bytes.clone())))
    }

    fn list(&self) -> Result<Vec<String>, String> {
        Ok(self.files.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("MLmodel"), b"flavors: {}").unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data").join("model.json"), b"{}").unwrap();

        let reader = InMemoryBundleReader::from_dir(dir.path()).unwrap();
        assert_eq!(
            reader.list().unwrap(),
            vec!["MLmodel".to_string(), "data/model.json".to_string()]
        );
        assert_eq!(reader.read_all("data/model.json").unwrap(), b"{}");
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loops_are_walked_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data").join("model.json"), b"{}").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("data").join("up")).unwrap();

        let reader = InMemoryBundleReader::from_dir(dir.path()).unwrap();
        assert_eq!(reader.list().unwrap(), vec!["data/model.json".to_string()]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InMemoryBundleReader::from_dir(dir.path().join("absent")).is_err());
    }

    #[test]
    fn open_reports_missing_file() {
        let reader = InMemoryBundleReader::default().with_file("/a.json", "{}");
        assert_eq!(reader.list().unwrap(), ["a.json"]);
        let err = reader.open("b.json").err().unwrap();
        assert!(err.contains("b.json"));
    }
}
