//! The blocking HTTP client for the job endpoints, and the [`JobService`]
//! seam the dataset cache is written against.

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::config;
use crate::error::{Error, Result};
use crate::job::Job;
use crate::protocol::{StatusReply, SubmitReply, submit_params};

/// Identifier the service assigns to a submitted job.
///
/// Opaque, and only meaningful for the job content it was returned for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobHandle {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        })
    }
}

/// Point-in-time read of a job's remote state.
#[derive(Debug, Clone)]
pub struct JobStatusSnapshot {
    pub state: JobState,
    /// Artifact download URL; present once the job has succeeded.
    pub output_url: Option<String>,
    /// Remote error detail; present when the job has failed.
    pub detail: Option<String>,
}

/// The remote job operations the dataset cache consumes. [`Client`] is the
/// production implementation; tests substitute counting stubs.
pub trait JobService {
    /// Submits the job and returns the service's handle for it.
    fn submit(&self, job: &Job) -> Result<JobHandle>;

    /// One status request, one snapshot.
    fn poll_status(&self, handle: &JobHandle) -> Result<JobStatusSnapshot>;

    /// Best-effort cancellation; remote rejection is not an error.
    fn cancel(&self, handle: &JobHandle) -> Result<()>;

    /// Downloads the artifact to `dest`, overwriting any previous file there.
    fn fetch_artifact(&self, url: &str, dest: &Path) -> Result<PathBuf>;

    /// Polls until the job settles, returning the artifact URL on success.
    ///
    /// Each cycle sleeps `poll_interval`, takes one snapshot, then acts:
    /// `Succeeded` returns the URL, `Failed` returns
    /// [`Error::JobFailed`] immediately (a terminal remote decision — no
    /// retry), and `Queued`/`Running`/`Unknown` keep looping. The timeout is
    /// checked once per cycle after the snapshot, so the call can overrun
    /// `timeout` by at most one `poll_interval` before
    /// [`Error::JobTimedOut`]. This is the only place in the crate that
    /// blocks on wall-clock time.
    fn await_completion(
        &self,
        handle: &JobHandle,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<String> {
        let start = Instant::now();
        let mut last_state: Option<JobState> = None;

        loop {
            thread::sleep(poll_interval);
            let snapshot = self.poll_status(handle)?;

            if last_state != Some(snapshot.state) {
                last_state = Some(snapshot.state);
                eprintln!("Job {} status: {}", handle, snapshot.state);
            }

            match snapshot.state {
                JobState::Succeeded => {
                    return snapshot.output_url.ok_or_else(|| Error::MalformedStatus {
                        detail: format!("job {handle} succeeded without an output URL"),
                    });
                }
                JobState::Failed => {
                    return Err(Error::JobFailed {
                        detail: snapshot
                            .detail
                            .unwrap_or_else(|| "no detail reported".to_string()),
                    });
                }
                JobState::Queued | JobState::Running | JobState::Unknown => {}
            }

            let elapsed = start.elapsed();
            if elapsed > timeout {
                return Err(Error::JobTimedOut {
                    handle: handle.clone(),
                    elapsed,
                });
            }
        }
    }
}

/// Blocking client for the job endpoints.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    progress: bool,
    http: HttpClient,
}

impl Client {
    /// Creates a client from environment variables and/or `.lfpsrc`.
    ///
    /// Equivalent to `Client::new(None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None)
    }

    /// Creates a client using (in order of precedence) the explicit `url`
    /// argument, the `LFPS_URL` environment variable, a `url:` line in
    /// `.lfpsrc`, or the public service endpoint.
    pub fn new(url: Option<String>) -> Result<Self> {
        let url = config::resolve_url(url)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("lfps-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("lfps-rs")),
        );

        let http = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            url,
            progress: true,
            http,
        })
    }

    /// Enables or disables the download progress bar.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), path)
    }
}

impl JobService for Client {
    fn submit(&self, job: &Job) -> Result<JobHandle> {
        let url = self.endpoint("submitJob");
        let resp = self
            .http
            .post(&url)
            .query(&[("f", "json")])
            .form(&submit_params(job))
            .send()?;

        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(Error::SubmissionRejected {
                detail: format!("HTTP {} for url ({})\n{}", status, url, text),
            });
        }

        let reply: SubmitReply =
            serde_json::from_str(&text).map_err(|e| Error::SubmissionRejected {
                detail: format!("unparseable submission response: {e}"),
            })?;
        if let Some(error) = &reply.error {
            return Err(Error::SubmissionRejected {
                detail: error.detail(),
            });
        }
        let handle = reply
            .job_id
            .filter(|id| !id.is_empty())
            .map(JobHandle::new)
            .ok_or_else(|| Error::SubmissionRejected {
                detail: "response carried no job id".to_string(),
            })?;

        eprintln!("Submitted job {handle}");
        Ok(handle)
    }

    fn poll_status(&self, handle: &JobHandle) -> Result<JobStatusSnapshot> {
        let url = self.endpoint(&format!("jobs/{handle}"));
        let resp = self.http.get(&url).query(&[("f", "json")]).send()?;

        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(Error::MalformedStatus {
                detail: format!("HTTP {} for url ({})\n{}", status, url, text),
            });
        }

        let reply: StatusReply =
            serde_json::from_str(&text).map_err(|e| Error::MalformedStatus {
                detail: format!("{e} (url={url})"),
            })?;
        Ok(reply.into_snapshot(&self.url))
    }

    fn cancel(&self, handle: &JobHandle) -> Result<()> {
        let url = self.endpoint(&format!("jobs/{handle}/cancel"));
        // Fire and forget: the body is not inspected, so a remote refusal to
        // cancel still counts as delivered.
        self.http.get(&url).query(&[("f", "json")]).send()?;
        Ok(())
    }

    fn fetch_artifact(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        let fail = |detail: String| Error::DownloadFailed {
            url: url.to_string(),
            detail,
        };

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
            }
        }

        let resp = self
            .http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| fail(e.to_string()))?;
        let total = resp.content_length();

        let pb = match (self.progress, total) {
            (true, Some(total)) => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                    )
                    .unwrap()
                    .progress_chars("=>-"),
                );
                Some(pb)
            }
            _ => None,
        };

        // Truncate: same job content means same archive, so overwriting a
        // previous download is the idempotent choice.
        let mut out = File::create(dest).map_err(|e| fail(e.to_string()))?;
        let mut resp = resp;
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = match resp.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => return Err(fail(e.to_string())),
            };
            out.write_all(&buf[..n]).map_err(|e| fail(e.to_string()))?;
            if let Some(pb) = &pb {
                pb.inc(n as u64);
            }
        }
        out.flush().map_err(|e| fail(e.to_string()))?;

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        Ok(dest.to_path_buf())
    }
}
