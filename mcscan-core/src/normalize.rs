//! Status normalization
//!
//! The backend reports progress either as flat fields
//! (`progress`, `processed_files`, `total_files`, `current_file`) or as a
//! nested `progress` object (`percent`, `processed`, `total`,
//! `current_item`). [`normalize`] folds both into one [`JobStatus`] so no
//! caller ever has to look at the raw shape.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::job::{JobStatus, ScanState};

/// Builds the canonical status for `job_id` from a raw status payload
///
/// Flat fields win over nested ones when both are present. Missing
/// numbers become zero and missing strings become `None`.
pub fn normalize(job_id: &str, raw: &Value) -> JobStatus {
    let nested = raw.get("progress").filter(|value| value.is_object());
    let nested_field = |key: &str| nested.and_then(|progress| progress.get(key));

    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .map(ScanState::parse)
        .unwrap_or_default();

    let percent = raw
        .get("progress")
        .and_then(as_number)
        .or_else(|| nested_field("percent").and_then(as_number));

    let processed = raw
        .get("processed_files")
        .and_then(as_count)
        .or_else(|| nested_field("processed").and_then(as_count))
        .unwrap_or(0);

    let total = raw
        .get("total_files")
        .and_then(as_count)
        .or_else(|| nested_field("total").and_then(as_count))
        .unwrap_or(0);

    let current_item = raw
        .get("current_file")
        .and_then(as_text)
        .or_else(|| nested_field("current_item").and_then(as_text));

    let progress = if status == ScanState::Completed {
        100.0
    } else {
        clamp_percent(percent.unwrap_or(0.0))
    };

    let processed_items = if total > 0 { processed.min(total) } else { processed };

    JobStatus {
        job_id: job_id.to_string(),
        status,
        progress,
        processed_items,
        total_items: total,
        current_item,
        started_at: raw.get("started_at").and_then(as_timestamp),
        completed_at: raw.get("completed_at").and_then(as_timestamp),
        error: raw.get("error").and_then(as_error),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

fn as_count(value: &Value) -> Option<u64> {
    as_number(value).map(|number| number.max(0.0).round() as u64)
}

fn as_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

// The backend sends either a message string or an error object.
fn as_error(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(_) => as_text(value),
        Value::Object(fields) => fields
            .get("message")
            .and_then(as_text)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

fn clamp_percent(percent: f64) -> f64 {
    percent.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_and_nested_payloads_normalize_identically() {
        let flat = json!({
            "status": "scanning",
            "progress": 40.0,
            "processed_files": 4,
            "total_files": 10,
            "current_file": "jei.jar",
        });
        let nested = json!({
            "status": "scanning",
            "progress": {
                "percent": 40,
                "processed": 4,
                "total": 10,
                "current_item": "jei.jar",
            },
        });

        let from_flat = normalize("abc", &flat);
        let from_nested = normalize("abc", &nested);

        assert_eq!(from_flat, from_nested);
        assert_eq!(from_flat.status, ScanState::Running);
        assert_eq!(from_flat.progress, 40.0);
        assert_eq!(from_flat.processed_items, 4);
        assert_eq!(from_flat.total_items, 10);
        assert_eq!(from_flat.current_item.as_deref(), Some("jei.jar"));
    }

    #[test]
    fn test_flat_fields_take_precedence() {
        let payload = json!({
            "status": "running",
            "processed_files": 7,
            "total_files": 20,
            "progress": { "percent": 10, "processed": 1, "total": 99, "current_item": "nested.jar" },
            "current_file": "flat.jar",
        });

        let status = normalize("id", &payload);
        assert_eq!(status.processed_items, 7);
        assert_eq!(status.total_items, 20);
        assert_eq!(status.current_item.as_deref(), Some("flat.jar"));
        // `progress` is an object here, so the percentage comes from it
        assert_eq!(status.progress, 10.0);
    }

    #[test]
    fn test_missing_fields_default() {
        let status = normalize("id", &json!({}));
        assert_eq!(status, JobStatus::pending("id"));

        let status = normalize("id", &json!({ "status": "mystery" }));
        assert_eq!(status.status, ScanState::Pending);
    }

    #[test]
    fn test_progress_is_clamped() {
        let status = normalize("id", &json!({ "status": "running", "progress": 180 }));
        assert_eq!(status.progress, 100.0);

        let status = normalize("id", &json!({ "status": "running", "progress": -3 }));
        assert_eq!(status.progress, 0.0);
    }

    #[test]
    fn test_completed_reports_full_progress() {
        let status = normalize("id", &json!({ "status": "completed", "progress": 97 }));
        assert_eq!(status.progress, 100.0);
    }

    #[test]
    fn test_processed_never_exceeds_known_total() {
        let status = normalize(
            "id",
            &json!({ "status": "running", "processed_files": 12, "total_files": 10 }),
        );
        assert_eq!(status.processed_items, 10);

        let status = normalize("id", &json!({ "status": "running", "processed_files": 12 }));
        assert_eq!(status.processed_items, 12);
        assert_eq!(status.total_items, 0);
    }

    #[test]
    fn test_numeric_strings_and_timestamps() {
        let status = normalize(
            "id",
            &json!({
                "status": "running",
                "progress": "55.5",
                "total_files": "8",
                "started_at": "2024-01-01T00:00:00Z",
                "completed_at": "not a date",
            }),
        );
        assert_eq!(status.progress, 55.5);
        assert_eq!(status.total_items, 8);
        assert!(status.started_at.is_some());
        assert!(status.completed_at.is_none());
    }

    #[test]
    fn test_error_field_shapes() {
        let status = normalize("id", &json!({ "status": "failed", "error": "disk full" }));
        assert_eq!(status.error.as_deref(), Some("disk full"));

        let status = normalize(
            "id",
            &json!({ "status": "failed", "error": { "code": 3, "message": "bad jar" } }),
        );
        assert_eq!(status.error.as_deref(), Some("bad jar"));

        let status = normalize("id", &json!({ "status": "failed", "error": null }));
        assert_eq!(status.error, None);
    }
}
