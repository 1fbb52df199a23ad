//! Scan job DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::job::JobRequest;

/// Keys the backend has used for the id of a newly started scan
pub const JOB_ID_KEYS: [&str; 3] = ["scan_id", "job_id", "task_id"];

/// Body of `POST /scan/start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartScan {
    pub directory: String,
    pub incremental: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl From<&JobRequest> for StartScan {
    fn from(request: &JobRequest) -> Self {
        Self {
            directory: request.directory.clone(),
            incremental: request.incremental,
            project_id: request.project_id.clone(),
        }
    }
}

/// Whether a response body is an envelope with `success: false`
///
/// Every backend endpoint wraps its payload as `{success, data?, message?}`.
/// `success` is optional because some backend builds answer with the bare
/// payload; only an explicit `false` marks a failure, whatever the shape of
/// the other fields.
pub fn is_rejected(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(false)
}

/// Payload of `GET /scan/active`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveScans {
    #[serde(default)]
    pub active_scans: Vec<Value>,
    #[serde(default)]
    pub total: u64,
}

/// Finds the scan id in a start response
///
/// Looks inside the `data` object first, then at the top level, accepting
/// any of [`JOB_ID_KEYS`]. Numeric ids are rendered as strings; empty ids
/// count as missing.
pub fn extract_job_id(body: &Value) -> Option<String> {
    let nested = body.get("data").filter(|data| data.is_object());

    nested
        .into_iter()
        .chain(std::iter::once(body))
        .flat_map(|scope| JOB_ID_KEYS.iter().filter_map(move |key| scope.get(*key)))
        .find_map(|value| match value {
            Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_job_id_nested() {
        let body = json!({ "success": true, "data": { "scan_id": "abc" } });
        assert_eq!(extract_job_id(&body).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_job_id_alternate_keys() {
        let body = json!({ "success": true, "data": { "task_id": "t-1" } });
        assert_eq!(extract_job_id(&body).as_deref(), Some("t-1"));

        let body = json!({ "success": true, "data": { "job_id": 42 } });
        assert_eq!(extract_job_id(&body).as_deref(), Some("42"));
    }

    #[test]
    fn test_extract_job_id_flat() {
        let body = json!({ "scan_id": "flat", "status": "started" });
        assert_eq!(extract_job_id(&body).as_deref(), Some("flat"));
    }

    #[test]
    fn test_extract_job_id_missing() {
        assert_eq!(extract_job_id(&json!({ "success": true, "data": {} })), None);
        assert_eq!(extract_job_id(&json!({ "data": { "scan_id": "" } })), None);
        assert_eq!(extract_job_id(&json!(null)), None);
    }

    #[test]
    fn test_start_scan_body_omits_missing_project() {
        let body = StartScan::from(&JobRequest::new("/mods"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, json!({ "directory": "/mods", "incremental": true }));
    }

    #[test]
    fn test_envelope_rejection() {
        assert!(is_rejected(&json!({ "success": false, "message": "nope" })));
        assert!(is_rejected(&json!({ "success": false, "message": { "code": "DIR_MISSING" } })));
        assert!(is_rejected(&json!({ "success": false, "data": 7 })));

        assert!(!is_rejected(&json!({ "success": true, "data": {} })));
        assert!(!is_rejected(&json!({ "scan_id": "x" })));
        assert!(!is_rejected(&json!({ "success": "false" })));
        assert!(!is_rejected(&json!([false])));
    }
}
