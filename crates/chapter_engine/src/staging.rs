use std::io;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to create staging directory: {0}")]
    Create(#[source] io::Error),
    #[error("failed to write staged page {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to remove staging directory: {0}")]
    Remove(#[source] io::Error),
}

/// Per-run staging directory for accepted, re-encoded pages.
///
/// Created at run start and released at run end; never shared between
/// runs. Dropping the handle removes the directory, so an abnormal exit
/// mid-run still cleans up. Call [`StagingArea::close`] to surface
/// removal errors on the normal path.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a fresh staging directory under the system temp location,
    /// or under `root` when given.
    pub fn new(root: Option<&Path>) -> Result<Self, StagingError> {
        let dir = match root {
            Some(root) => TempDir::new_in(root),
            None => TempDir::new(),
        }
        .map_err(StagingError::Create)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Normalize to three-channel RGB and write a lossless PNG under
    /// `filename`. Returns the staged path.
    pub fn store(&self, filename: &str, image: &DynamicImage) -> Result<PathBuf, StagingError> {
        let path = self.dir.path().join(filename);
        image
            .to_rgb8()
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| StagingError::Write {
                path: path.display().to_string(),
                source,
            })?;
        Ok(path)
    }

    /// Remove the staging directory. Tolerates a directory that is
    /// already gone.
    pub fn close(self) -> Result<(), StagingError> {
        match self.dir.close() {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StagingError::Remove(err)),
        }
    }
}
