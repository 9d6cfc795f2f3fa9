use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use zip::ZipWriter;

use crate::naming::sanitize_title;
use crate::AcceptedPage;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("archive write failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    pub output_root: PathBuf,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("out"),
        }
    }
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), ArchiveError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| ArchiveError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(ArchiveError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| ArchiveError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| ArchiveError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Write `<output_root>/<title>/<chapter_tag>.cbz` containing every staged
/// page under its base filename, in ascending filename order.
///
/// The caller guarantees `pages` is non-empty; the orchestrator reports
/// the empty case before reaching this builder.
pub fn write_cbz(
    settings: &ArchiveSettings,
    title: &str,
    chapter_tag: &str,
    pages: &[AcceptedPage],
) -> Result<PathBuf, ArchiveError> {
    let chapter_dir = settings.output_root.join(sanitize_title(title));
    ensure_output_dir(&chapter_dir)?;

    // Zero-padded names make lexicographic order the numeric page order.
    let mut ordered: Vec<&AcceptedPage> = pages.iter().collect();
    ordered.sort_by(|a, b| a.filename.cmp(&b.filename));

    let cbz_path = chapter_dir.join(format!("{chapter_tag}.cbz"));
    let file = File::create(&cbz_path)?;
    let mut writer = ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for page in ordered {
        writer.start_file(&page.filename, options)?;
        let bytes = fs::read(&page.staged_path)?;
        writer.write_all(&bytes)?;
    }
    writer.finish()?;

    Ok(cbz_path)
}
