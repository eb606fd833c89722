//! Test runtime and fixture helpers.
//!
//! `TestRuntime` wraps `std::fs` with a fixed working directory so walker
//! tests run against real files in a `tempfile::TempDir` instead of mocks:
//! extension fallback, directory resolution, and `package.json` probing all
//! exercise genuine filesystem behavior.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Filesystem-backed runtime with an explicit working directory.
#[derive(Debug)]
pub struct TestRuntime {
    cwd: PathBuf,
}

impl TestRuntime {
    pub fn new(cwd: PathBuf) -> Self {
        Self { cwd }
    }
}

#[async_trait]
impl Runtime for TestRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::FileNotFound(path.to_path_buf())
            } else {
                RuntimeError::Io(e.to_string())
            }
        })
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let metadata = std::fs::metadata(path).map_err(|e| RuntimeError::Io(e.to_string()))?;
        Ok(FileMetadata {
            size: metadata.len(),
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}

/// Write a fixture tree under `root`: each `(relative_path, content)` pair
/// becomes a file, with parent directories created as needed.
pub fn create_tree(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }
}
