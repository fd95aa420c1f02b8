//! File access abstraction.
//!
//! The core never opens files on its own. Everything that needs file text goes
//! through a [`FileSource`], which the host implements over its vault or file
//! cache. Two implementations ship here:
//!
//! - [`RealFileSource`] reads straight from disk
//! - [`MemoryFileSource`] keeps files in memory, for hosts with their own
//!   cache and for tests
//!
//! ```
//! use std::path::Path;
//! use spark_core::{FileSource, MemoryFileSource};
//!
//! let mut files = MemoryFileSource::new();
//! files.add_file("notes/flow.svg", "<svg/>");
//! assert_eq!(files.read_text(Path::new("notes/flow.svg")).unwrap(), "<svg/>");
//! ```

use crate::error::{SparkError, SparkResult};
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Returns file contents as text, given a path.
///
/// Read failures are reported to the caller untouched; the core propagates
/// them rather than converting them into a fallback.
pub trait FileSource: Send + Sync + std::fmt::Debug {
    /// Read the whole file as UTF-8 text.
    fn read_text(&self, path: &Path) -> SparkResult<String>;

    /// Check if a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// Disk-backed [`FileSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSource;

impl FileSource for RealFileSource {
    fn read_text(&self, path: &Path) -> SparkResult<String> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SparkError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => SparkError::FileRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        String::from_utf8(bytes).map_err(|_| SparkError::FileNotText {
            path: path.to_path_buf(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory [`FileSource`].
///
/// Paths are normalized on insert and lookup, so `a/./b.svg` and `a/b.svg`
/// name the same file.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSource {
    files: HashMap<PathBuf, String>,
}

impl MemoryFileSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files
            .insert(normalize_path(path.as_ref()), content.into());
    }

    /// Remove a file, returning its previous content.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> Option<String> {
        self.files.remove(&normalize_path(path.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSource for MemoryFileSource {
    fn read_text(&self, path: &Path) -> SparkResult<String> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| SparkError::FileNotFound {
                path: path.to_path_buf(),
            })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }
}

/// Drop `.` components and fold `..` so equivalent spellings compare equal.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(s) => result.push(s),
            Component::RootDir => result.push(component.as_os_str()),
            Component::Prefix(p) => result.push(p.as_os_str()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_memory_add_and_read_file() {
        let mut files = MemoryFileSource::new();
        files.add_file("vault/flow.svg", "<svg/>");

        assert_eq!(files.read_text(Path::new("vault/flow.svg")).unwrap(), "<svg/>");
        assert!(files.exists(Path::new("vault/flow.svg")));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_memory_normalizes_paths() {
        let mut files = MemoryFileSource::new();
        files.add_file("vault/./sub/../flow.svg", "x");

        assert!(files.exists(Path::new("vault/flow.svg")));
    }

    #[test]
    fn test_memory_missing_file_is_not_found() {
        let files = MemoryFileSource::new();
        let err = files.read_text(Path::new("missing.svg")).unwrap_err();
        assert!(matches!(err, SparkError::FileNotFound { .. }));
    }

    #[test]
    fn test_memory_remove_file() {
        let mut files = MemoryFileSource::new();
        files.add_file("a.svg", "x");
        assert_eq!(files.remove_file("a.svg").as_deref(), Some("x"));
        assert!(files.is_empty());
    }

    #[test]
    fn test_real_read_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("diagram.svg");
        fs::write(&path, "<mxfile/>").unwrap();

        let source = RealFileSource;
        assert_eq!(source.read_text(&path).unwrap(), "<mxfile/>");
        assert!(source.exists(&path));
    }

    #[test]
    fn test_real_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = RealFileSource
            .read_text(&temp.path().join("nope.svg"))
            .unwrap_err();
        assert!(matches!(err, SparkError::FileNotFound { .. }));
    }

    #[test]
    fn test_real_binary_file_is_not_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = RealFileSource.read_text(&path).unwrap_err();
        assert!(matches!(err, SparkError::FileNotText { .. }));
    }

    #[test]
    fn test_real_directory_is_not_a_file() {
        let temp = TempDir::new().unwrap();
        assert!(!RealFileSource.exists(temp.path()));
    }
}
