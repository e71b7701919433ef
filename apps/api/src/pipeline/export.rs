//! Result Exporter — renders a completed job's results as CSV.
//!
//! Fixed columns first, then any extra columns echoed from the pairing table.
//! When the input carried a numeric ground-truth `score` column, per-row
//! deltas and an aggregate-loss footer are appended (optional reporting mode,
//! not part of the primary schema).

use crate::csv::stringify_csv;
use crate::pipeline::engine::ResultRow;

const FIXED_COLUMNS: [&str; 8] = [
    "cv_file_name",
    "format",
    "jd_file_name",
    "jd_format",
    "cv_criteria",
    "jd_criteria",
    "result",
    "score",
];

fn raw_get<'a>(row: &'a ResultRow, key: &str) -> Option<&'a str> {
    row.raw
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Ground truth is an input column also named `score`; it is shadowed by the
/// produced score in the main table and only surfaces through the deltas.
fn ground_truth(row: &ResultRow) -> Option<f64> {
    raw_get(row, "score").and_then(|v| v.trim().parse::<f64>().ok())
}

/// Serializes result rows to CSV. An empty result set still emits the header
/// row alone.
pub fn results_to_csv(results: &[ResultRow]) -> String {
    // Extra columns from the echoed raw rows, first-seen order.
    let mut extras: Vec<String> = Vec::new();
    for row in results {
        for (key, _) in &row.raw {
            if !FIXED_COLUMNS.contains(&key.as_str()) && !extras.contains(key) {
                extras.push(key.clone());
            }
        }
    }

    let with_deltas = results.iter().any(|r| ground_truth(r).is_some());

    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(extras.iter().cloned());
    if with_deltas {
        header.push("delta".to_string());
        header.push("abs_delta".to_string());
    }

    let mut rows: Vec<Vec<String>> = vec![header];
    let mut sum_gt = 0.0;
    let mut sum_produced = 0.0;
    let mut sum_abs = 0.0;
    let mut numeric_rows = 0usize;

    for row in results {
        let mut cells: Vec<String> = vec![
            raw_get(row, "cv_file_name").unwrap_or_default().to_string(),
            raw_get(row, "format").unwrap_or_default().to_string(),
            raw_get(row, "jd_file_name").unwrap_or_default().to_string(),
            raw_get(row, "jd_format").unwrap_or_default().to_string(),
            row.cv_criteria.to_string(),
            row.jd_criteria.to_string(),
            row.result.to_string(),
            row.score.to_string(),
        ];
        for key in &extras {
            cells.push(raw_get(row, key).unwrap_or_default().to_string());
        }
        if with_deltas {
            match ground_truth(row) {
                Some(gt) => {
                    let delta = gt - row.score as f64;
                    sum_gt += gt;
                    sum_produced += row.score as f64;
                    sum_abs += delta.abs();
                    numeric_rows += 1;
                    cells.push(delta.to_string());
                    cells.push(delta.abs().to_string());
                }
                None => {
                    cells.push(String::new());
                    cells.push(String::new());
                }
            }
        }
        rows.push(cells);
    }

    if numeric_rows > 0 {
        let n = numeric_rows as f64;
        rows.push(Vec::new());
        rows.push(vec![
            "aggregate_loss_signed".to_string(),
            ((sum_gt - sum_produced) / n).to_string(),
        ]);
        rows.push(vec![
            "mean_absolute_loss".to_string(),
            (sum_abs / n).to_string(),
        ]);
    }

    let mut csv = stringify_csv(&rows);
    csv.push('\n');
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::parse_csv;
    use serde_json::json;

    fn row(raw: Vec<(&str, &str)>, score: u32) -> ResultRow {
        ResultRow {
            raw: raw
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            cv_criteria: json!({"skills": ["Rust", "Tokio"]}),
            jd_criteria: json!({"skills": ["Rust"]}),
            result: json!({"final_score": score, "provenance": "heuristic"}),
            score,
        }
    }

    fn base_raw(cv: &str) -> Vec<(&'static str, &str)> {
        vec![
            ("cv_file_name", cv),
            ("format", "pdf"),
            ("jd_file_name", "backend_jd"),
            ("jd_format", "pdf"),
        ]
    }

    #[test]
    fn test_empty_results_emit_header_only() {
        let csv = results_to_csv(&[]);
        assert_eq!(
            csv,
            "cv_file_name,format,jd_file_name,jd_format,cv_criteria,jd_criteria,result,score\n"
        );
    }

    #[test]
    fn test_fixed_column_order_and_json_cells_round_trip() {
        let csv = results_to_csv(&[row(base_raw("john_cv"), 42)]);
        let parsed = parse_csv(&csv);

        assert_eq!(parsed[0][0], "cv_file_name");
        assert_eq!(parsed[0][7], "score");
        assert_eq!(parsed[1][0], "john_cv");
        assert_eq!(parsed[1][7], "42");

        // JSON cells survive quoting untouched
        let criteria: serde_json::Value = serde_json::from_str(&parsed[1][4]).unwrap();
        assert_eq!(criteria["skills"][0], "Rust");
    }

    #[test]
    fn test_extra_columns_appended_after_fixed_set() {
        let mut raw = base_raw("john_cv");
        raw.push(("candidate_id", "42"));
        raw.push(("notes", "short, listed"));
        let csv = results_to_csv(&[row(raw, 10)]);
        let parsed = parse_csv(&csv);

        assert_eq!(parsed[0][8], "candidate_id");
        assert_eq!(parsed[0][9], "notes");
        assert_eq!(parsed[1][9], "short, listed");
    }

    #[test]
    fn test_score_cell_is_unquoted() {
        let csv = results_to_csv(&[row(base_raw("john_cv"), 87)]);
        let line = csv.lines().nth(1).unwrap();
        assert!(line.ends_with(",87"));
    }

    #[test]
    fn test_ground_truth_adds_deltas_and_footer() {
        let mut raw_a = base_raw("a_cv");
        raw_a.push(("score", "80"));
        let mut raw_b = base_raw("b_cv");
        raw_b.push(("score", "40"));

        let csv = results_to_csv(&[row(raw_a, 70), row(raw_b, 50)]);
        let parsed = parse_csv(&csv);

        assert_eq!(parsed[0][8], "delta");
        assert_eq!(parsed[0][9], "abs_delta");
        assert_eq!(parsed[1][8], "10"); // 80 - 70
        assert_eq!(parsed[2][8], "-10"); // 40 - 50
        assert_eq!(parsed[2][9], "10");

        // blank separator, then aggregate footer
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "aggregate_loss_signed,0");
        assert_eq!(lines[5], "mean_absolute_loss,10");
    }

    #[test]
    fn test_non_numeric_ground_truth_left_blank() {
        let mut raw_a = base_raw("a_cv");
        raw_a.push(("score", "80"));
        let mut raw_b = base_raw("b_cv");
        raw_b.push(("score", "n/a"));

        let csv = results_to_csv(&[row(raw_a, 70), row(raw_b, 50)]);
        let parsed = parse_csv(&csv);
        assert_eq!(parsed[2][8], "");
        assert_eq!(parsed[2][9], "");
    }

    #[test]
    fn test_no_ground_truth_means_no_footer() {
        let csv = results_to_csv(&[row(base_raw("john_cv"), 42)]);
        assert!(!csv.contains("aggregate_loss_signed"));
        assert!(!csv.contains("delta"));
    }
}
