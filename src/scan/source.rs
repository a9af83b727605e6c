//! Source readers.
//!
//! The engine never touches the file system directly; it asks a
//! [`SourceReader`] for the text behind a relative path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::ScanError;

/// Provides raw file text keyed by relative path.
pub trait SourceReader: Sync {
    /// Read the full text of `path`.
    ///
    /// A missing file must be reported as [`ScanError::FileNotFound`].
    fn read_source(&self, path: &str) -> Result<String, ScanError>;
}

/// Reads files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsReader {
    root: PathBuf,
}

impl FsReader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl SourceReader for FsReader {
    fn read_source(&self, path: &str) -> Result<String, ScanError> {
        let full_path = self.root.join(path);
        if full_path.is_dir() {
            return Err(ScanError::FileNotFound {
                path: path.to_string(),
            });
        }
        std::fs::read_to_string(&full_path).map_err(|e| ScanError::from_io(path, e))
    }
}

/// In-memory sources, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<String, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl SourceReader for MemoryReader {
    fn read_source(&self, path: &str) -> Result<String, ScanError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ScanError::FileNotFound {
                path: path.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_reader_reads_relative() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src")).unwrap();
        std::fs::write(temp.path().join("src/a.js"), "let a = 1;\n").unwrap();

        let reader = FsReader::new(temp.path());
        assert_eq!(reader.read_source("src/a.js").unwrap(), "let a = 1;\n");
    }

    #[test]
    fn test_fs_reader_missing_file() {
        let temp = TempDir::new().unwrap();
        let reader = FsReader::new(temp.path());
        let err = reader.read_source("nope.js").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "file not found: nope.js");
    }

    #[test]
    fn test_fs_reader_directory_is_not_a_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("dir")).unwrap();
        let reader = FsReader::new(temp.path());
        assert!(reader.read_source("dir").unwrap_err().is_not_found());
    }

    #[test]
    fn test_memory_reader() {
        let reader = MemoryReader::new().with_file("a.js", "x");
        assert_eq!(reader.read_source("a.js").unwrap(), "x");
        assert!(reader.read_source("b.js").unwrap_err().is_not_found());
    }
}
