//! Axum route handlers for the bulk scoring API.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::pdf::{extract_pdf_text, normalize_whitespace};
use crate::pipeline::config_parser::{parse_pairing_table, template_csv, PairingRequest};
use crate::pipeline::criteria::extract_criteria;
use crate::pipeline::engine::{JobSnapshot, ResultsError};
use crate::pipeline::export::results_to_csv;
use crate::pipeline::scoring::{score_cv_against_jd, ScoringResult};
use crate::registry::ArtifactKind;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadedFileInfo {
    pub id: Uuid,
    pub name: String,
    pub size: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<UploadedFileInfo>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UploadCsvResponse {
    pub success: bool,
    pub configurations: Vec<Value>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub success: bool,
    pub job: JobSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ScorePairResponse {
    #[serde(flatten)]
    pub result: ScoringResult,
    #[serde(rename = "cvText", skip_serializing_if = "Option::is_none")]
    pub cv_text: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/bulk/upload-cvs — multipart field `cvFiles`.
pub async fn handle_upload_cvs(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    ingest_files(state, multipart, "cvFiles", ArtifactKind::Cv).await
}

/// POST /api/v1/bulk/upload-jds — multipart field `jdFiles`.
pub async fn handle_upload_jds(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    ingest_files(state, multipart, "jdFiles", ArtifactKind::Jd).await
}

async fn ingest_files(
    state: AppState,
    mut multipart: Multipart,
    field_name: &str,
    kind: ArtifactKind,
) -> Result<Json<UploadResponse>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let payload = field
            .bytes()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;
        let size = payload.len();
        let id = state.registry.register(&name, payload, kind).await;
        files.push(UploadedFileInfo { id, name, size });
    }

    let label = match kind {
        ArtifactKind::Cv => "CV",
        ArtifactKind::Jd => "JD",
    };
    tracing::info!(
        "Registered {} {label} file(s), registry now holds {}",
        files.len(),
        state.registry.len().await
    );
    let message = format!("{} {label} files uploaded successfully", files.len());
    Ok(Json(UploadResponse {
        success: true,
        files,
        message,
    }))
}

/// POST /api/v1/bulk/upload-csv — multipart field `csvFile`.
/// Parses the pairing table and echoes the configurations back to the client
/// for later submission to `process-bulk`.
pub async fn handle_upload_csv(
    State(_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadCsvResponse>, AppError> {
    let mut table: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        if field.name() == Some("csvFile") {
            table = Some(
                field
                    .text()
                    .await
                    .map_err(|e| AppError::Upload(e.to_string()))?,
            );
        }
    }

    let table = table.ok_or_else(|| AppError::Validation("No CSV file uploaded".to_string()))?;
    let requests =
        parse_pairing_table(&table).map_err(|e| AppError::Validation(e.to_string()))?;

    let configurations: Vec<Value> = requests.iter().map(row_to_object).collect();
    let message = format!("{} configurations loaded from CSV", configurations.len());
    Ok(Json(UploadCsvResponse {
        success: true,
        configurations,
        message,
    }))
}

/// POST /api/v1/bulk/process-bulk — body `{ "configurations": [ {..row..} ] }`.
pub async fn handle_process_bulk(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<StartJobResponse>, AppError> {
    let Some(rows) = body.get("configurations").and_then(Value::as_array) else {
        return Err(AppError::Validation(
            "Invalid configurations provided".to_string(),
        ));
    };

    let requests: Vec<PairingRequest> = rows
        .iter()
        .filter_map(object_to_row)
        .filter_map(PairingRequest::from_row)
        .collect();

    let job_id = state.engine.start(requests).await;
    Ok(Json(StartJobResponse {
        success: true,
        job_id,
        message: "Bulk processing started".to_string(),
    }))
}

/// GET /api/v1/bulk/status/:job_id
pub async fn handle_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let job = state
        .engine
        .snapshot(job_id)
        .await
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    Ok(Json(JobStatusResponse { success: true, job }))
}

/// GET /api/v1/bulk/download/:job_id — CSV export of a completed job.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let results = state.engine.results(job_id).await.map_err(|e| match e {
        ResultsError::NotFound => AppError::NotFound("Job not found".to_string()),
        ResultsError::NotCompleted => AppError::Validation("Job not completed yet".to_string()),
    })?;

    let csv = results_to_csv(&results);
    Ok(csv_attachment(
        &format!("bulk_scoring_results_{job_id}.csv"),
        csv,
    ))
}

/// GET /api/v1/bulk/template — canonical pairing-table template.
pub async fn handle_template() -> Response {
    csv_attachment("bulk_scoring_template.csv", template_csv())
}

/// POST /api/v1/score — one-pair convenience route: multipart `cv` PDF plus a
/// `jd` text field, scored immediately without going through a job. Set
/// `includeCvText` truthy to echo the extracted CV text in the response.
pub async fn handle_score_pair(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScorePairResponse>, AppError> {
    let mut cv_payload: Option<bytes::Bytes> = None;
    let mut jd: Option<String> = None;
    let mut include_cv_text = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        match field.name() {
            Some("cv") => {
                cv_payload = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Upload(e.to_string()))?,
                );
            }
            Some("jd") => {
                jd = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Upload(e.to_string()))?,
                );
            }
            Some("includeCvText") => {
                include_cv_text = truthy(
                    &field
                        .text()
                        .await
                        .map_err(|e| AppError::Upload(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let jd = jd.ok_or_else(|| {
        AppError::Validation("Missing jd field (Job Description markdown text)".to_string())
    })?;
    let cv_payload =
        cv_payload.ok_or_else(|| AppError::Validation("Missing cv PDF file field".to_string()))?;

    let cv_text = extract_pdf_text(&cv_payload)?;
    let jd_text = normalize_whitespace(&jd);

    let model = state.engine.model();
    let cv_criteria = extract_criteria(model, &cv_text, ArtifactKind::Cv).await;
    let jd_criteria = extract_criteria(model, &jd_text, ArtifactKind::Jd).await;
    let result = score_cv_against_jd(model, &jd_criteria, &cv_criteria).await;

    Ok(Json(ScorePairResponse {
        result,
        cv_text: include_cv_text.then_some(cv_text),
    }))
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

fn row_to_object(request: &PairingRequest) -> Value {
    Value::Object(
        request
            .raw
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Converts a posted configuration object back into a raw row. Non-string
/// scalars are stringified; nested values and non-objects are dropped.
fn object_to_row(value: &Value) -> Option<Vec<(String, String)>> {
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_to_row_stringifies_scalars() {
        let row = object_to_row(&json!({
            "cv_file_name": "john_cv",
            "score": 4.5,
            "flag": true,
            "empty": null
        }))
        .unwrap();

        let get = |key: &str| {
            row.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("cv_file_name"), "john_cv");
        assert_eq!(get("score"), "4.5");
        assert_eq!(get("flag"), "true");
        assert_eq!(get("empty"), "");
    }

    #[test]
    fn test_object_to_row_rejects_non_objects() {
        assert!(object_to_row(&json!("just a string")).is_none());
        assert!(object_to_row(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_truthy_flag_values() {
        for v in ["1", "true", "TRUE", " on ", "Yes"] {
            assert!(truthy(v), "{v:?} should be truthy");
        }
        for v in ["0", "false", "no", "", "maybe"] {
            assert!(!truthy(v), "{v:?} should not be truthy");
        }
    }

    #[test]
    fn test_score_pair_response_flattens_and_gates_cv_text() {
        use crate::pipeline::criteria::CriteriaSet;
        use crate::pipeline::heuristic::heuristic_score;

        let result = heuristic_score(&CriteriaSet::default(), &CriteriaSet::default());

        let without = serde_json::to_value(&ScorePairResponse {
            result: result.clone(),
            cv_text: None,
        })
        .unwrap();
        assert!(without.get("final_score").is_some());
        assert!(without.get("criteria_scores").is_some());
        assert!(without.get("cvText").is_none());

        let with = serde_json::to_value(&ScorePairResponse {
            result,
            cv_text: Some("extracted cv body".to_string()),
        })
        .unwrap();
        assert_eq!(with["cvText"], "extracted cv body");
    }

    #[test]
    fn test_row_round_trip_through_object() {
        let request = PairingRequest::from_row(vec![
            ("cv_file_name".to_string(), "john_cv".to_string()),
            ("format".to_string(), "pdf".to_string()),
            ("jd_file_name".to_string(), "backend_jd".to_string()),
            ("jd_format".to_string(), "pdf".to_string()),
        ])
        .unwrap();

        let object = row_to_object(&request);
        let row = object_to_row(&object).unwrap();
        let rebuilt = PairingRequest::from_row(row).unwrap();
        assert_eq!(rebuilt.cv_file_name, "john_cv");
        assert_eq!(rebuilt.jd_file_name, "backend_jd");
    }
}
