//! Pairing-table parser — turns the uploaded CSV configuration into an ordered
//! list of [`PairingRequest`]s.
//!
//! Parsing is deliberately line-oriented: split on commas with quote-stripping,
//! no RFC-4180 embedded commas or newlines. Known limitation of the pairing
//! format; the richer `csv` module is reserved for export.

use serde::Serialize;
use thiserror::Error;

pub const REQUIRED_COLUMNS: [&str; 4] = ["cv_file_name", "format", "jd_file_name", "jd_format"];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("CSV file must have at least a header row and one data row")]
    TooFewLines,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// One row of the pairing table: which CV to match against which JD.
/// `raw` preserves the full row in header order so result rows can echo
/// arbitrary extra columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingRequest {
    pub cv_file_name: String,
    pub format: String,
    pub jd_file_name: String,
    pub jd_format: String,
    pub raw: Vec<(String, String)>,
}

impl PairingRequest {
    /// Builds a request from a raw row. Returns `None` when either file
    /// reference is empty — such rows are dropped, not errors.
    pub fn from_row(raw: Vec<(String, String)>) -> Option<Self> {
        let get = |key: &str| {
            raw.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim().to_string())
                .unwrap_or_default()
        };

        let cv_file_name = get("cv_file_name");
        let jd_file_name = get("jd_file_name");
        if cv_file_name.is_empty() || jd_file_name.is_empty() {
            return None;
        }

        Some(PairingRequest {
            cv_file_name,
            format: get("format"),
            jd_file_name,
            jd_format: get("jd_format"),
            raw,
        })
    }
}

/// Parses the pairing table. Fails when the table has fewer than two lines or
/// the header misses any required column; blank lines and rows without both
/// file references are skipped.
pub fn parse_pairing_table(text: &str) -> Result<Vec<PairingRequest>, ConfigError> {
    // A bare newline separator counts as a second line, so a header with a
    // trailing newline passes the line-count check and gets the more useful
    // missing-columns diagnosis.
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() < 2 {
        return Err(ConfigError::TooFewLines);
    }

    let headers: Vec<String> = split_fields(lines[0]);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::MissingColumns(missing));
    }

    let mut requests = Vec::new();
    for line in &lines[1..] {
        if line.trim().is_empty() {
            continue;
        }
        let values = split_fields(line);
        let raw: Vec<(String, String)> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), values.get(i).cloned().unwrap_or_default()))
            .collect();
        if let Some(request) = PairingRequest::from_row(raw) {
            requests.push(request);
        }
    }

    Ok(requests)
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',')
        .map(|f| f.trim().replace('"', ""))
        .collect()
}

/// Canonical pairing-table template offered for download.
pub fn template_csv() -> String {
    [
        REQUIRED_COLUMNS.join(","),
        "john_doe_cv,pdf,software_engineer_jd,pdf".to_string(),
        "jane_smith_cv,pdf,data_scientist_jd,pdf".to_string(),
        "test_candidate,pdf,backend_developer_jd,pdf".to_string(),
    ]
    .join("\n")
}
