use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::client::JobHandle;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between building a job and handing back a
/// cached raster.
///
/// Construction-time input errors are never retried. Transport errors are
/// surfaced immediately; retry policy belongs to the caller. `JobFailed` is a
/// terminal remote decision. `JobTimedOut` is terminal for that call only;
/// retrieving the same job again is a legitimate recovery path.
#[derive(Debug, Error)]
pub enum Error {
    /// No requester email anywhere we look.
    #[error(
        "no requester email: pass one explicitly, set LFPS_EMAIL, or add `email:` to .lfpsrc"
    )]
    MissingEmail,

    /// A job needs at least one product layer.
    #[error("a job needs at least one product layer")]
    EmptyLayerList,

    #[error("invalid area of interest: {detail}")]
    InvalidAreaOfInterest { detail: String },

    /// The service only resamples between 30 and 9999 metres.
    #[error("resample resolution {value} is outside the accepted 30..=9999 metre range")]
    InvalidResampleResolution { value: u32 },

    #[error("configuration error: {detail}")]
    Config { detail: String },

    #[error("could not parse product catalog: {detail}")]
    MalformedCatalog { detail: String },

    #[error("job submission rejected: {detail}")]
    SubmissionRejected { detail: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("could not parse job status response: {detail}")]
    MalformedStatus { detail: String },

    /// The remote service reported the job as failed. Carries whatever detail
    /// the service supplied.
    #[error("remote job failed: {detail}")]
    JobFailed { detail: String },

    #[error("job {handle} still incomplete after {:.1}s", .elapsed.as_secs_f64())]
    JobTimedOut { handle: JobHandle, elapsed: Duration },

    #[error("download of {url} failed: {detail}")]
    DownloadFailed { url: String, detail: String },

    #[error("could not extract {}: {detail}", .archive.display())]
    ExtractionFailed { archive: PathBuf, detail: String },

    /// The extraction directory did not contain exactly one raster.
    #[error("expected exactly one .tif in {}, found {found}", .dir.display())]
    AmbiguousOutput { dir: PathBuf, found: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
