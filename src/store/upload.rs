//! Screenshot storage on the local filesystem

use super::UploadStore;
use crate::http::mime;
use crate::logger;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file type '{0}', expected one of png, jpg, jpeg, gif, webp")]
    UnsupportedType(String),

    #[error("invalid file name '{0}'")]
    InvalidName(String),

    #[error("file '{0}' not found")]
    NotFound(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Files live flat inside one directory under generated names
#[derive(Debug, Clone)]
pub struct FsUploadStore {
    root: PathBuf,
}

impl FsUploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` inside the root, refusing anything but a plain file name
    fn resolve(&self, name: &str) -> Result<PathBuf, UploadError> {
        let plain = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\', '\0'])
            && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
        if plain {
            Ok(self.root.join(name))
        } else {
            Err(UploadError::InvalidName(name.to_string()))
        }
    }

    fn io_err(path: &Path, source: std::io::Error) -> UploadError {
        UploadError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl UploadStore for FsUploadStore {
    fn save(&self, original_name: &str, data: &[u8]) -> Result<String, UploadError> {
        let ext = mime::extension_of(original_name)
            .filter(|ext| mime::IMAGE_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| UploadError::UnsupportedType(original_name.to_string()))?;

        fs::create_dir_all(&self.root).map_err(|e| Self::io_err(&self.root, e))?;

        let name = format!("{}.{ext}", uuid::Uuid::new_v4());
        let path = self.root.join(&name);
        fs::write(&path, data).map_err(|e| Self::io_err(&path, e))?;
        logger::log_debug(&format!(
            "[Upload] Stored '{original_name}' as {} ({} bytes)",
            path.display(),
            data.len()
        ));
        Ok(name)
    }

    fn open(&self, name: &str) -> Result<Vec<u8>, UploadError> {
        let path = self.resolve(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => UploadError::NotFound(name.to_string()),
            _ => Self::io_err(&path, e),
        })
    }

    fn remove(&self, name: &str) -> Result<(), UploadError> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(&path, e)),
        }
    }
}
