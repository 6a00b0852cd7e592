//! Wire types for the job endpoints.

use crate::client::{JobState, JobStatusSnapshot};
use crate::job::Job;
use crate::util::urljoin;

/// Form fields for `submitJob`, wire-named. Absent optionals are omitted
/// entirely rather than sent empty.
pub(crate) fn submit_params(job: &Job) -> Vec<(&'static str, String)> {
    let layer_list = job
        .layers()
        .iter()
        .map(|l| l.layer_code.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let mut params = vec![
        ("Email", job.email().to_string()),
        ("Layer_List", layer_list),
        ("Area_of_Interest", job.area_of_interest().to_string()),
    ];

    let opts = job.options();
    if let Some(v) = &opts.output_projection {
        params.push(("Output_Projection", v.clone()));
    }
    if let Some(v) = opts.resample_resolution {
        params.push(("Resample_Resolution", v.to_string()));
    }
    if let Some(v) = &opts.edit_rule {
        params.push(("Edit_Rule", v.clone()));
    }
    if let Some(v) = &opts.edit_mask {
        params.push(("Edit_Mask", v.clone()));
    }
    if let Some(v) = &opts.priority_code {
        params.push(("Priority_Code", v.clone()));
    }

    params
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct SubmitReply {
    #[serde(default, alias = "jobID", rename = "jobId")]
    pub(crate) job_id: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<ReplyError>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ReplyError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Vec<String>,
}

impl ReplyError {
    pub(crate) fn detail(&self) -> String {
        let message = self.message.as_deref().unwrap_or("request rejected");
        if self.details.is_empty() {
            message.to_string()
        } else {
            format!("{}. {}", message, self.details.join("; "))
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct StatusReply {
    #[serde(rename = "jobStatus")]
    job_status: String,
    #[serde(default)]
    output: Option<OutputRef>,
    #[serde(default)]
    messages: Vec<StatusMessage>,
}

#[derive(Debug, serde::Deserialize)]
struct OutputRef {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct StatusMessage {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl StatusReply {
    /// The service reports ArcGIS GP status strings. Strings outside the
    /// known set map to [`JobState::Unknown`] so the poll loop keeps going
    /// under its timeout instead of aborting on a vocabulary change.
    fn state(&self) -> JobState {
        match self.job_status.as_str() {
            "esriJobNew" | "esriJobSubmitted" | "esriJobWaiting" => JobState::Queued,
            "esriJobExecuting" => JobState::Running,
            "esriJobSucceeded" => JobState::Succeeded,
            "esriJobFailed" | "esriJobCancelling" | "esriJobCancelled" | "esriJobTimedOut" => {
                JobState::Failed
            }
            _ => JobState::Unknown,
        }
    }

    fn failure_detail(&self) -> String {
        let errors: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| {
                m.kind
                    .as_deref()
                    .is_some_and(|k| k.ends_with("Error") || k.ends_with("Abort"))
            })
            .filter_map(|m| m.description.as_deref())
            .collect();
        if errors.is_empty() {
            format!("job ended with status {}", self.job_status)
        } else {
            errors.join("; ")
        }
    }

    pub(crate) fn into_snapshot(self, base_url: &str) -> JobStatusSnapshot {
        let state = self.state();
        let output_url = if state == JobState::Succeeded {
            self.output
                .as_ref()
                .and_then(|o| o.url.as_deref())
                .map(|u| urljoin(base_url, u))
        } else {
            None
        };
        let detail = (state == JobState::Failed).then(|| self.failure_detail());

        JobStatusSnapshot {
            state,
            output_url,
            detail,
        }
    }
}
