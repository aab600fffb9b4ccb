//! # Local Filesystem Backend

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::backend::BlobBackend;
use super::errors::{CoverError, CoverResult};

/// Blob backend writing objects below a root directory
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a new local backend
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, key: &str) -> CoverResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(CoverError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn map_io(key: &str, e: std::io::Error) -> CoverError {
    if e.kind() == std::io::ErrorKind::NotFound {
        CoverError::ObjectNotFound(key.to_string())
    } else {
        CoverError::IoError(e.to_string())
    }
}

impl BlobBackend for LocalBackend {
    fn write(&self, key: &str, data: &[u8]) -> CoverResult<()> {
        let full_path = self.full_path(key)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CoverError::IoError(e.to_string()))?;
        }

        fs::write(&full_path, data).map_err(|e| CoverError::IoError(e.to_string()))
    }

    fn read(&self, key: &str) -> CoverResult<Vec<u8>> {
        let full_path = self.full_path(key)?;
        fs::read(&full_path).map_err(|e| map_io(key, e))
    }

    fn delete(&self, key: &str) -> CoverResult<()> {
        let full_path = self.full_path(key)?;
        fs::remove_file(&full_path).map_err(|e| map_io(key, e))
    }

    fn exists(&self, key: &str) -> CoverResult<bool> {
        Ok(self.full_path(key)?.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_read_nested() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().to_path_buf());

        backend.write("covers/b1/abc.png", b"png").unwrap();
        assert_eq!(backend.read("covers/b1/abc.png").unwrap(), b"png");
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().to_path_buf());

        backend.write("delete-me.jpg", b"bye").unwrap();
        assert!(backend.exists("delete-me.jpg").unwrap());

        backend.delete("delete-me.jpg").unwrap();
        assert!(!backend.exists("delete-me.jpg").unwrap());
        assert!(matches!(
            backend.delete("delete-me.jpg"),
            Err(CoverError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().to_path_buf());

        assert!(matches!(
            backend.write("../outside.jpg", b"x"),
            Err(CoverError::InvalidKey(_))
        ));
        assert!(matches!(
            backend.write("/etc/passwd", b"x"),
            Err(CoverError::InvalidKey(_))
        ));
        assert!(matches!(backend.write("", b"x"), Err(CoverError::InvalidKey(_))));
    }
}
