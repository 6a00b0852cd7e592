//! Archive extraction behind a seam trait.

use std::fs::{self, File};
use std::path::Path;

use crate::error::{Error, Result};

/// Unpacks a downloaded artifact into a directory.
///
/// Implementations create `target_dir` if absent and overwrite prior
/// contents, so re-extracting the same archive is idempotent.
pub trait ArchiveExtractor {
    fn extract(&self, archive: &Path, target_dir: &Path) -> Result<()>;
}

/// Extractor for the service's zip deliveries.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, target_dir: &Path) -> Result<()> {
        let fail = |detail: String| Error::ExtractionFailed {
            archive: archive.to_path_buf(),
            detail,
        };

        let file = File::open(archive).map_err(|e| fail(e.to_string()))?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| fail(e.to_string()))?;
        fs::create_dir_all(target_dir).map_err(|e| fail(e.to_string()))?;
        zip.extract(target_dir).map_err(|e| fail(e.to_string()))?;
        Ok(())
    }
}
