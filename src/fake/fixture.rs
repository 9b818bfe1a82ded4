use crate::error::FixtureError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory that file-backed fake responses are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureLocator {
    root: PathBuf,
}

impl FixtureLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a fixture name under this locator.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Read the raw bytes of a fixture.
    pub fn load(&self, name: &str) -> Result<Vec<u8>, FixtureError> {
        let path = self.path_for(name);
        debug!("Loading fixture {} from {}", name, path.display());
        std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FixtureError::NotFound(path.display().to_string())
            } else {
                FixtureError::Io {
                    name: name.to_string(),
                    source,
                }
            }
        })
    }

    /// Read a fixture and parse it as JSON.
    pub fn load_json(&self, name: &str) -> Result<Value, FixtureError> {
        let bytes = self.load(name)?;
        serde_json::from_slice(&bytes).map_err(|source| FixtureError::Parse {
            name: name.to_string(),
            source,
        })
    }
}
