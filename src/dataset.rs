//! Content-addressed dataset cache.
//!
//! A [`Dataset`] pairs a [`Job`] with the two filesystem locations its
//! delivery occupies under a cache root:
//!
//! ```text
//! <cache_root>/job_<hash>.zip   downloaded archive
//! <cache_root>/job_<hash>/      extracted delivery
//! ```
//!
//! `<hash>` is the job's 16-hex-digit content hash, so equal job content maps
//! to equal paths no matter which process computes them.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::JobService;
use crate::error::{Error, Result};
use crate::extract::ArchiveExtractor;
use crate::job::Job;

/// File extension of the primary raster inside a delivery.
const RASTER_EXT: &str = "tif";

/// A job plus its deterministic cache locations.
///
/// Construction is pure path arithmetic; nothing touches the network or the
/// filesystem until [`retrieve`](Dataset::retrieve).
#[derive(Debug, Clone)]
pub struct Dataset {
    job: Job,
    archive_path: PathBuf,
    extract_dir: PathBuf,
}

impl Dataset {
    pub fn new(job: Job, cache_root: impl AsRef<Path>) -> Self {
        let hash = job.content_hash();
        let root = cache_root.as_ref();
        Self {
            archive_path: root.join(format!("job_{hash:016x}.zip")),
            extract_dir: root.join(format!("job_{hash:016x}")),
            job,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Where the downloaded archive lands.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Where the archive is extracted to.
    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Whether a prior retrieve already populated the extraction directory.
    ///
    /// Directory existence is the entire test: the content hash is encoded
    /// in the path, so an existing directory implies equal job content.
    pub fn is_cached(&self) -> bool {
        self.extract_dir.exists()
    }

    /// Returns the delivery's primary raster, producing it first if needed.
    ///
    /// Cache miss: submit the job, poll until completion (bounded by
    /// `timeout`, one status request per `poll_interval`), download the
    /// artifact to [`archive_path`](Dataset::archive_path), extract it, and
    /// scan for the raster. Cache hit: skip straight to the scan — no
    /// network traffic at all.
    ///
    /// Idempotent: however many times this is called for equal job content,
    /// the remote work happens at most once, and every successful call
    /// returns the same path. On failure the extraction directory is never
    /// left behind, so the dataset stays cold and a later retry starts
    /// clean. Concurrent first calls for the same job are not serialized
    /// here; they race to submit duplicate remote jobs and write the same
    /// destination paths (callers needing exclusion hold their own lock,
    /// keyed by the job hash).
    pub fn retrieve(
        &self,
        service: &impl JobService,
        extractor: &impl ArchiveExtractor,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<PathBuf> {
        if self.is_cached() {
            eprintln!("Using cached directory {}", self.extract_dir.display());
        } else {
            let handle = service.submit(&self.job)?;
            let artifact_url = service.await_completion(&handle, poll_interval, timeout)?;
            service.fetch_artifact(&artifact_url, &self.archive_path)?;
            self.extract_archive(extractor)?;
        }

        self.primary_raster()
    }

    /// Extracts into a staging directory and renames it into place, so a
    /// crashed or failed extraction can never leave a half-populated
    /// directory that would pass the [`is_cached`](Dataset::is_cached) test.
    fn extract_archive(&self, extractor: &impl ArchiveExtractor) -> Result<()> {
        let staging = self.extract_dir.with_extension("extracting");
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        extractor.extract(&self.archive_path, &staging)?;
        fs::rename(&staging, &self.extract_dir)?;
        Ok(())
    }

    /// Scans the extraction directory for exactly one `.tif`.
    pub fn primary_raster(&self) -> Result<PathBuf> {
        let mut matches = Vec::new();
        for entry in fs::read_dir(&self.extract_dir)? {
            let path = entry?.path();
            let is_raster = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(RASTER_EXT));
            if is_raster {
                matches.push(path);
            }
        }

        if matches.len() == 1 {
            return Ok(matches.remove(0));
        }
        Err(Error::AmbiguousOutput {
            dir: self.extract_dir.clone(),
            found: matches.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{JobHandle, JobState, JobStatusSnapshot};
    use crate::job::JobOptions;
    use crate::product::Product;
    use std::cell::Cell;

    const TICK: Duration = Duration::from_millis(2);
    const PATIENCE: Duration = Duration::from_secs(5);

    fn fuel_job() -> Job {
        let layer = Product {
            name: "13 Fire Behavior Fuel Models".to_string(),
            theme: "Fuel".to_string(),
            layer_code: "240FBFM13".to_string(),
            version: "2.4.0".to_string(),
            conus: true,
            ..Default::default()
        };
        Job::new(
            Some("fire@example.gov"),
            vec![layer],
            "-120.0 35.0 -110.0 40.0",
            JobOptions::default(),
        )
        .unwrap()
    }

    /// Succeeds after a fixed number of polls and counts every call.
    struct CountingService {
        polls_until_done: usize,
        submits: Cell<usize>,
        polls: Cell<usize>,
        fetches: Cell<usize>,
    }

    impl CountingService {
        fn new(polls_until_done: usize) -> Self {
            Self {
                polls_until_done,
                submits: Cell::new(0),
                polls: Cell::new(0),
                fetches: Cell::new(0),
            }
        }
    }

    impl JobService for CountingService {
        fn submit(&self, _job: &Job) -> Result<JobHandle> {
            self.submits.set(self.submits.get() + 1);
            Ok(JobHandle::new("j1"))
        }

        fn poll_status(&self, _handle: &JobHandle) -> Result<JobStatusSnapshot> {
            self.polls.set(self.polls.get() + 1);
            if self.polls.get() < self.polls_until_done {
                Ok(JobStatusSnapshot {
                    state: JobState::Running,
                    output_url: None,
                    detail: None,
                })
            } else {
                Ok(JobStatusSnapshot {
                    state: JobState::Succeeded,
                    output_url: Some("https://dwnld.example/out.zip".to_string()),
                    detail: None,
                })
            }
        }

        fn cancel(&self, _handle: &JobHandle) -> Result<()> {
            Ok(())
        }

        fn fetch_artifact(&self, _url: &str, dest: &Path) -> Result<PathBuf> {
            self.fetches.set(self.fetches.get() + 1);
            fs::write(dest, b"archive bytes")?;
            Ok(dest.to_path_buf())
        }
    }

    /// Populates the target directory with the given file names.
    struct StubExtractor {
        files: Vec<&'static str>,
        extracts: Cell<usize>,
    }

    impl StubExtractor {
        fn with_files(files: Vec<&'static str>) -> Self {
            Self {
                files,
                extracts: Cell::new(0),
            }
        }
    }

    impl ArchiveExtractor for StubExtractor {
        fn extract(&self, _archive: &Path, target_dir: &Path) -> Result<()> {
            self.extracts.set(self.extracts.get() + 1);
            fs::create_dir_all(target_dir)?;
            for name in &self.files {
                fs::write(target_dir.join(name), b"content")?;
            }
            Ok(())
        }
    }

    struct FailingExtractor;

    impl ArchiveExtractor for FailingExtractor {
        fn extract(&self, archive: &Path, _target_dir: &Path) -> Result<()> {
            Err(Error::ExtractionFailed {
                archive: archive.to_path_buf(),
                detail: "unexpected end of archive".to_string(),
            })
        }
    }

    #[test]
    fn paths_are_deterministic_per_job_content() {
        let tmp = tempfile::tempdir().unwrap();
        let a = Dataset::new(fuel_job(), tmp.path());
        let b = Dataset::new(fuel_job(), tmp.path());
        assert_eq!(a.archive_path(), b.archive_path());
        assert_eq!(a.extract_dir(), b.extract_dir());

        let name = a.extract_dir().file_name().unwrap().to_string_lossy();
        assert_eq!(name.len(), "job_".len() + 16);
        assert!(name.starts_with("job_"));
        assert_eq!(
            a.archive_path().file_name().unwrap().to_string_lossy(),
            format!("{name}.zip")
        );
    }

    #[test]
    fn warm_hit_returns_the_raster_without_any_remote_work() {
        let tmp = tempfile::tempdir().unwrap();
        let dataset = Dataset::new(fuel_job(), tmp.path());
        fs::create_dir_all(dataset.extract_dir()).unwrap();
        fs::write(dataset.extract_dir().join("a.tif"), b"raster").unwrap();

        let service = CountingService::new(1);
        let extractor = StubExtractor::with_files(vec!["a.tif"]);
        let raster = dataset
            .retrieve(&service, &extractor, TICK, PATIENCE)
            .unwrap();

        assert_eq!(raster, dataset.extract_dir().join("a.tif"));
        assert_eq!(service.submits.get(), 0);
        assert_eq!(service.polls.get(), 0);
        assert_eq!(service.fetches.get(), 0);
        assert_eq!(extractor.extracts.get(), 0);
    }

    #[test]
    fn cold_retrieve_runs_the_full_pipeline_exactly_once() {
        let tmp = tempfile::tempdir().unwrap();
        let dataset = Dataset::new(fuel_job(), tmp.path());
        assert!(!dataset.is_cached());

        let service = CountingService::new(3);
        let extractor = StubExtractor::with_files(vec!["a.tif", "a.csv"]);
        let raster = dataset
            .retrieve(&service, &extractor, TICK, PATIENCE)
            .unwrap();

        assert!(dataset.is_cached());
        assert_eq!(raster, dataset.extract_dir().join("a.tif"));
        assert_eq!(service.submits.get(), 1);
        assert_eq!(service.polls.get(), 3);
        assert_eq!(service.fetches.get(), 1);
        assert_eq!(extractor.extracts.get(), 1);
        assert!(dataset.archive_path().exists());
    }

    #[test]
    fn second_retrieve_does_no_further_work() {
        let tmp = tempfile::tempdir().unwrap();
        let dataset = Dataset::new(fuel_job(), tmp.path());
        let service = CountingService::new(2);
        let extractor = StubExtractor::with_files(vec!["a.tif"]);

        let first = dataset
            .retrieve(&service, &extractor, TICK, PATIENCE)
            .unwrap();
        let second = dataset
            .retrieve(&service, &extractor, TICK, PATIENCE)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(service.submits.get(), 1);
        assert_eq!(service.polls.get(), 2);
        assert_eq!(service.fetches.get(), 1);
        assert_eq!(extractor.extracts.get(), 1);
    }

    #[test]
    fn zero_rasters_in_the_delivery_is_ambiguous() {
        let tmp = tempfile::tempdir().unwrap();
        let dataset = Dataset::new(fuel_job(), tmp.path());
        let service = CountingService::new(1);
        let extractor = StubExtractor::with_files(vec!["metadata.xml"]);

        let err = dataset
            .retrieve(&service, &extractor, TICK, PATIENCE)
            .unwrap_err();
        match err {
            Error::AmbiguousOutput { found, .. } => assert_eq!(found, 0),
            other => panic!("expected AmbiguousOutput, got {other:?}"),
        }
    }

    #[test]
    fn two_rasters_in_the_delivery_is_ambiguous() {
        let tmp = tempfile::tempdir().unwrap();
        let dataset = Dataset::new(fuel_job(), tmp.path());
        fs::create_dir_all(dataset.extract_dir()).unwrap();
        fs::write(dataset.extract_dir().join("a.tif"), b"one").unwrap();
        fs::write(dataset.extract_dir().join("b.TIF"), b"two").unwrap();

        let err = dataset.primary_raster().unwrap_err();
        match err {
            Error::AmbiguousOutput { found, dir } => {
                assert_eq!(found, 2);
                assert_eq!(dir, dataset.extract_dir());
            }
            other => panic!("expected AmbiguousOutput, got {other:?}"),
        }
    }

    #[test]
    fn failed_extraction_leaves_the_dataset_cold() {
        let tmp = tempfile::tempdir().unwrap();
        let dataset = Dataset::new(fuel_job(), tmp.path());
        let service = CountingService::new(1);

        let err = dataset
            .retrieve(&service, &FailingExtractor, TICK, PATIENCE)
            .unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed { .. }));
        assert!(!dataset.is_cached());

        // A retry after the failure runs the pipeline again and succeeds.
        let extractor = StubExtractor::with_files(vec!["a.tif"]);
        dataset
            .retrieve(&service, &extractor, TICK, PATIENCE)
            .unwrap();
        assert_eq!(service.submits.get(), 2);
        assert!(dataset.is_cached());
    }
}
