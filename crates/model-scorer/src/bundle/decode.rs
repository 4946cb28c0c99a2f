use serde::{Serialize, de::DeserializeOwned};
use std::io::Read;

/// A type that can be rebuilt from the files of a model artifact.
pub trait BundleDecode: Sized {
    type Settings: Default + Serialize + DeserializeOwned;
    type Error: Into<Box<dyn std::error::Error + Send + Sync + 'static>>;

    fn decode<I: BundleSource>(source: &I, settings: &Self::Settings) -> Result<Self, Self::Error>;
}

/// Read access to the files of a materialized artifact, addressed by relative path.
pub trait BundleSource {
    /// Stream one file. Fails when the path is not part of the bundle.
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, String>;

    /// Relative paths of every file in the bundle.
    fn list(&self) -> Result<Vec<String>, String>;

    /// Read a whole file into memory.
    fn read_all(&self, path: &str) -> Result<Vec<u8>, String> {
        let mut bytes = Vec::new();
        self.open(path)?
            .read_to_end(&mut bytes)
            .map_err(|e| format!("Failed to read {path}: {e}"))?;
        Ok(bytes)
    }
}

/// Registry listings and local walks disagree on separators and leading
/// `/` or `./`; keys are stored as `dir/file`.
pub fn normalize_bundle_path<S: AsRef<str>>(s: S) -> String {
    s.as_ref()
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}
