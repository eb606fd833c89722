//! Platform runtime abstraction.
//!
//! The walker never touches the filesystem directly: everything goes
//! through the `Runtime` trait so the engine can be driven against the real
//! filesystem, a fixture tree in tests, or any other source of file bytes.
//! Only the read-side surface is modeled; the walker never writes.

pub mod native;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// File metadata.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Whether this is a file
    pub is_file: bool,
}

/// Read-side filesystem operations the walker depends on.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file's raw bytes.
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Get file metadata.
    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Check if a path exists. Cheap pre-check before `metadata`.
    fn exists(&self, path: &Path) -> bool;

    /// The working directory entries are resolved against when the walk
    /// options carry none.
    fn get_cwd(&self) -> RuntimeResult<PathBuf>;
}
