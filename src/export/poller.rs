//! The create / poll / download state machine
//!
//! The operation is atomic from the caller's perspective: either the full
//! stream is returned or an error is, never partial results. Cancellation is
//! solely via the polling timeout; every status poll and the final download
//! go through [`Session::call`] and are logged there.

use crate::error::{Error, Result};
use crate::http::Session;
use reqwest::Method;
use serde_json::Value;
use std::io::{Cursor, Read};
use std::time::Instant;
use tracing::error;
use zip::ZipArchive;

/// What a status poll told us about the job
#[derive(Debug, PartialEq)]
enum JobStatus {
    /// Job finished; the payload may name an alternate file identifier
    Complete { file_id: Option<String> },
    /// Still running; poll again after the configured interval
    InProgress,
    /// Any other status text is terminal
    Other(String),
}

/// Classify a status-poll payload.
///
/// Both "in progress" and "inProgress" have been observed from the service,
/// so anything containing "progress" case-insensitively keeps the job in the
/// polling state.
fn classify(payload: &Value) -> Result<JobStatus> {
    let status = payload
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::data_shape("export status response missing 'status'"))?;

    if status == "complete" {
        let file_id = payload
            .get("fileId")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Ok(JobStatus::Complete { file_id });
    }
    if status.to_lowercase().contains("progress") {
        return Ok(JobStatus::InProgress);
    }
    Ok(JobStatus::Other(status.to_string()))
}

impl Session {
    /// Drive an export-style endpoint end to end: create the job, poll
    /// `path/{jobId}` until complete, download `path/{fileId}/file` and open
    /// the first entry of the resulting zip archive.
    ///
    /// The returned stream supports `Seek`, so it can be read more than once.
    pub async fn export(&self, path: &str, parameters: &Value) -> Result<Cursor<Vec<u8>>> {
        let job_id = self.post_create(path, parameters).await?;
        let budget = self.config().export_timeout();
        let poll_interval = self.config().file_creation_poll_interval;
        let started = Instant::now();

        let file_id = loop {
            let payload = self.get(&format!("{path}/{job_id}")).await?;
            match classify(&payload)? {
                JobStatus::Complete { file_id } => {
                    break file_id.unwrap_or_else(|| job_id.clone());
                }
                JobStatus::Other(status) => {
                    let err = Error::ExportFailed { status };
                    error!("{err}");
                    return Err(err);
                }
                JobStatus::InProgress => {
                    if started.elapsed() >= budget {
                        let err = Error::ExportTimeout {
                            timeout_ms: budget.as_millis() as u64,
                        };
                        error!("{err}");
                        return Err(err);
                    }
                    // Don't hammer the server between polls.
                    tokio::time::sleep(poll_interval).await;
                }
            }
        };

        let response = self
            .call(Method::GET, &format!("{path}/{file_id}/file"), None)
            .await?;
        let bytes = response.bytes().await?;
        first_archive_entry(&bytes)
    }
}

/// Open the downloaded body as a zip archive and read its first entry.
/// Archive contents are assumed single-entry; only the first directory
/// entry is ever read regardless of how many are present.
fn first_archive_entry(bytes: &[u8]) -> Result<Cursor<Vec<u8>>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    if archive.is_empty() {
        return Err(Error::data_shape("export archive contains no entries"));
    }

    let mut entry = archive.by_index(0)?;
    let mut contents = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut contents)?;
    Ok(Cursor::new(contents))
}
