//! Job Engine — per-job state machine and the asynchronous drive loop.
//!
//! One worker task per job; pairing requests are processed strictly
//! sequentially within a job to bound memory and keep progress monotonic,
//! while independent jobs make progress concurrently. Anything recoverable at
//! the item level becomes a failure row; only faults escaping the item
//! boundary (worker panics) mark the whole job `Failed`.
//!
//! Cancellation is deliberately unsupported: callers can stop polling, but the
//! worker runs to completion or failure regardless.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::ChatModel;
use crate::pdf::{extract_pdf_text, normalize_whitespace};
use crate::pipeline::config_parser::PairingRequest;
use crate::pipeline::criteria::extract_criteria;
use crate::pipeline::scoring::score_cv_against_jd;
use crate::registry::{ArtifactKind, FileRegistry, UploadedArtifact};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One scored (or failed) pairing. `raw` echoes the originating row; the
/// structured criteria and scoring values are kept as JSON so failure markers
/// (`{"error": ...}`) share the same slots as real payloads.
#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    pub raw: Vec<(String, String)>,
    pub cv_criteria: Value,
    pub jd_criteria: Value,
    pub result: Value,
    pub score: u32,
}

/// Mutable per-job state. Owned by the engine, mutated only by the single
/// worker driving the job; immutable once status leaves `Running`.
#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub total: usize,
    pub completed: usize,
    pub progress: u32,
    pub current_item: Option<String>,
    pub results: Vec<ResultRow>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Consistent point-in-time view of a job for status polling.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: u32,
    pub total: usize,
    pub completed: usize,
    pub current_item: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ResultsError {
    #[error("Job not found")]
    NotFound,

    #[error("Job not completed yet")]
    NotCompleted,
}

/// Owns the job map and the shared collaborators each worker needs.
pub struct JobEngine {
    registry: Arc<FileRegistry>,
    model: Option<Arc<dyn ChatModel>>,
    jobs: RwLock<HashMap<Uuid, Arc<RwLock<Job>>>>,
}

impl JobEngine {
    pub fn new(registry: Arc<FileRegistry>, model: Option<Arc<dyn ChatModel>>) -> Self {
        Self {
            registry,
            model,
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// The configured scoring backend, if any. Shared with the single-pair
    /// route so both surfaces degrade identically without a model.
    pub fn model(&self) -> Option<&dyn ChatModel> {
        self.model.as_deref()
    }

    /// Creates a job for the given requests and spawns its worker.
    /// Returns immediately with the job id; progress is observed via
    /// [`snapshot`](Self::snapshot).
    pub async fn start(self: &Arc<Self>, requests: Vec<PairingRequest>) -> Uuid {
        let id = Uuid::new_v4();
        let job = Arc::new(RwLock::new(Job {
            id,
            status: JobStatus::Pending,
            total: requests.len(),
            completed: 0,
            progress: 0,
            current_item: None,
            results: Vec::new(),
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }));
        self.jobs.write().await.insert(id, job.clone());

        info!("Job {id} created with {} pairing(s)", requests.len());
        let engine = Arc::clone(self);
        tokio::spawn(engine.drive(job, requests));

        id
    }

    /// Point-in-time job status; `None` for unknown ids.
    pub async fn snapshot(&self, id: Uuid) -> Option<JobSnapshot> {
        let job = self.jobs.read().await.get(&id).cloned()?;
        let job = job.read().await;
        Some(JobSnapshot {
            id: job.id,
            status: job.status,
            progress: job.progress,
            total: job.total,
            completed: job.completed,
            current_item: job.current_item.clone(),
            start_time: job.started_at,
            end_time: job.ended_at,
            error: job.error.clone(),
        })
    }

    /// Result rows of a completed job, in input order. Refused while the job
    /// is still running and for failed jobs.
    pub async fn results(&self, id: Uuid) -> Result<Vec<ResultRow>, ResultsError> {
        let job = self
            .jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ResultsError::NotFound)?;
        let job = job.read().await;
        if job.status != JobStatus::Completed {
            return Err(ResultsError::NotCompleted);
        }
        Ok(job.results.clone())
    }

    async fn drive(self: Arc<Self>, job: Arc<RwLock<Job>>, requests: Vec<PairingRequest>) {
        {
            let mut j = job.write().await;
            j.status = JobStatus::Running;
        }

        // The worker runs in its own task so a panic inside an item surfaces
        // as a JoinError and the job can be finalized as Failed.
        let worker = {
            let engine = Arc::clone(&self);
            let job = Arc::clone(&job);
            tokio::spawn(async move { engine.run_items(&job, requests).await })
        };

        let fatal: Option<String> = match worker.await {
            Ok(()) => None,
            Err(e) => Some(format!("worker aborted: {e}")),
        };

        let mut j = job.write().await;
        j.ended_at = Some(Utc::now());
        match fatal {
            None => {
                j.status = JobStatus::Completed;
                j.progress = 100;
                j.current_item = Some("Processing completed".to_string());
                info!("Job {} completed ({} result rows)", j.id, j.results.len());
            }
            Some(error) => {
                j.status = JobStatus::Failed;
                warn!("Job {} failed: {error}", j.id);
                j.error = Some(error);
            }
        }
    }

    async fn run_items(&self, job: &Arc<RwLock<Job>>, requests: Vec<PairingRequest>) {
        let total = requests.len();
        if let Some(first) = requests.first() {
            let mut j = job.write().await;
            j.current_item = Some(processing_label(first));
            j.progress = 0;
        }

        for (i, request) in requests.iter().enumerate() {
            let row = match self.process_item(request).await {
                Ok(row) => row,
                Err(e) => {
                    warn!(
                        "Pairing {} vs {} failed: {e}",
                        request.cv_file_name, request.jd_file_name
                    );
                    failure_row(request, &e.to_string())
                }
            };

            // results, completed, and the next item's progress advance in one
            // write so pollers never observe a partially applied update.
            let mut j = job.write().await;
            j.results.push(row);
            j.completed += 1;
            if let Some(next) = requests.get(i + 1) {
                j.current_item = Some(processing_label(next));
                // Progress reflects items started, not finished: computed from
                // the pre-increment index for compatibility with existing
                // pollers (100 only on completion).
                j.progress = ((i + 1) * 100 / total) as u32;
            }
        }
    }

    /// Runs one pairing end-to-end: resolve both files, extract text and
    /// criteria, score. Any error here is a per-item failure.
    async fn process_item(&self, request: &PairingRequest) -> anyhow::Result<ResultRow> {
        let cv = self
            .registry
            .resolve(&request.cv_file_name, ArtifactKind::Cv, &request.format)
            .await
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "CV file not found: {} (tried with .{} extension)",
                    request.cv_file_name,
                    request.format
                )
            })?;
        let jd = self
            .registry
            .resolve(&request.jd_file_name, ArtifactKind::Jd, &request.jd_format)
            .await
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "JD file not found: {} (tried with .{} extension)",
                    request.jd_file_name,
                    request.jd_format
                )
            })?;

        let cv_text = artifact_text(&cv, &request.format)?;
        let jd_text = artifact_text(&jd, &request.jd_format)?;

        let model = self.model();
        let cv_criteria = extract_criteria(model, &cv_text, ArtifactKind::Cv).await;
        let jd_criteria = extract_criteria(model, &jd_text, ArtifactKind::Jd).await;
        let scoring = score_cv_against_jd(model, &jd_criteria, &cv_criteria).await;

        Ok(ResultRow {
            raw: request.raw.clone(),
            cv_criteria: serde_json::to_value(&cv_criteria)?,
            jd_criteria: serde_json::to_value(&jd_criteria)?,
            score: scoring.final_score,
            result: serde_json::to_value(&scoring)?,
        })
    }
}

/// PDF payloads go through text extraction; anything else is read as UTF-8
/// (JDs are commonly plain text or markdown).
fn artifact_text(artifact: &UploadedArtifact, format: &str) -> anyhow::Result<String> {
    let is_pdf = format.eq_ignore_ascii_case("pdf")
        || artifact.identity.to_ascii_lowercase().ends_with(".pdf");
    if is_pdf {
        extract_pdf_text(&artifact.payload)
    } else {
        Ok(normalize_whitespace(&String::from_utf8_lossy(
            &artifact.payload,
        )))
    }
}

fn processing_label(request: &PairingRequest) -> String {
    format!(
        "Processing {} vs {}",
        request.cv_file_name, request.jd_file_name
    )
}

fn failure_row(request: &PairingRequest, message: &str) -> ResultRow {
    ResultRow {
        raw: request.raw.clone(),
        cv_criteria: json!({ "error": "Failed to extract criteria" }),
        jd_criteria: json!({ "error": "Failed to extract criteria" }),
        result: json!({ "error": message }),
        score: 0,
    }
}
