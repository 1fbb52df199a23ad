//! In-memory scan backend for tests
//!
//! Serves the `/scan` routes from scripted data and records every call so
//! tests can assert on what went over the wire.

use async_trait::async_trait;
use mcscan_client::{
    ApiRequest, CancellationToken, ClientError, Method, RawResponse, ResilientClient, Transport,
};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::service::JobController;

/// Scan id the fake backend assigns to a directory
pub fn job_id_for(directory: &str) -> String {
    format!("scan-{}", directory.trim_start_matches('/'))
}

#[derive(Debug, Default)]
struct State {
    statuses: HashMap<String, VecDeque<Value>>,
    results: HashMap<String, Value>,
    start_errors: VecDeque<u16>,
    start_body: Option<Value>,
    status_error: HashMap<String, u16>,
    results_error: HashMap<String, u16>,
    cancel_on_start: Option<(String, CancellationToken)>,
    log: Vec<String>,
    live: HashSet<String>,
    max_live: usize,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Status payloads returned in order; the last one repeats
    pub fn script(&self, job_id: &str, payloads: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(job_id.to_string(), payloads.into());
    }

    pub fn set_results(&self, job_id: &str, payload: Value) {
        self.state
            .lock()
            .unwrap()
            .results
            .insert(job_id.to_string(), payload);
    }

    /// Answer the next start calls with these HTTP statuses
    pub fn fail_starts(&self, statuses: Vec<u16>) {
        self.state.lock().unwrap().start_errors = statuses.into();
    }

    /// Answer every start call with this body
    pub fn start_body(&self, body: Value) {
        self.state.lock().unwrap().start_body = Some(body);
    }

    /// Answer every status call for `job_id` with this HTTP status
    pub fn fail_status(&self, job_id: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .status_error
            .insert(job_id.to_string(), status);
    }

    /// Answer every results call for `job_id` with this HTTP status
    pub fn fail_results(&self, job_id: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .results_error
            .insert(job_id.to_string(), status);
    }

    /// Fire `token` while the scan of `directory` is being started
    pub fn cancel_on_start(&self, directory: &str, token: &CancellationToken) {
        self.state.lock().unwrap().cancel_on_start = Some((directory.to_string(), token.clone()));
    }

    /// Every call as `"<route>:<id or directory>"`, plus `"settled:<id>"`
    /// when a terminal status was served
    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }

    /// Most scans that were started but not yet settled at any one time
    pub fn max_live(&self) -> usize {
        self.state.lock().unwrap().max_live
    }

    fn handle(&self, request: &ApiRequest) -> RawResponse {
        let mut state = self.state.lock().unwrap();
        let path = request.path.as_str();

        if request.method == Method::POST && path == "/scan/start" {
            let directory = request
                .body
                .as_ref()
                .and_then(|body| body.get("directory"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            state.log.push(format!("start:{}", directory));

            if let Some(code) = state.start_errors.pop_front() {
                return RawResponse::new(code, r#"{"detail":"start failed"}"#);
            }
            if let Some((target, token)) = &state.cancel_on_start {
                if *target == directory {
                    token.cancel();
                }
            }
            if let Some(body) = &state.start_body {
                return RawResponse::new(200, body.to_string());
            }

            let job_id = job_id_for(&directory);
            state.live.insert(job_id.clone());
            let live = state.live.len();
            state.max_live = state.max_live.max(live);
            return envelope(json!({ "scan_id": job_id, "status": "started" }));
        }

        if let Some(job_id) = path.strip_prefix("/scan/status/") {
            state.log.push(format!("status:{}", job_id));
            if let Some(code) = state.status_error.get(job_id) {
                return RawResponse::new(*code, r#"{"detail":"status failed"}"#);
            }

            let payload = match state.statuses.get_mut(job_id) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
                Some(queue) => queue.front().cloned().unwrap_or_default(),
                None => json!({ "status": "running", "progress": 0 }),
            };
            let terminal = payload
                .get("status")
                .and_then(Value::as_str)
                .is_some_and(|s| matches!(s, "completed" | "failed" | "cancelled"));
            if terminal && state.live.remove(job_id) {
                state.log.push(format!("settled:{}", job_id));
            }
            return envelope(payload);
        }

        if let Some(job_id) = path.strip_prefix("/scan/results/") {
            state.log.push(format!("results:{}", job_id));
            if let Some(code) = state.results_error.get(job_id) {
                return RawResponse::new(*code, r#"{"detail":"results failed"}"#);
            }
            let payload = state
                .results
                .get(job_id)
                .cloned()
                .unwrap_or_else(|| json!({ "scan_id": job_id, "mods": [] }));
            return envelope(payload);
        }

        if let Some(job_id) = path.strip_prefix("/scan/cancel/") {
            state.log.push(format!("cancel:{}", job_id));
            state.live.remove(job_id);
            return envelope(json!({ "scan_id": job_id, "status": "cancelled" }));
        }

        if path == "/scan/active" {
            state.log.push("active:".to_string());
            let live: Vec<Value> = state.live.iter().map(|id| json!({ "scan_id": id })).collect();
            let total = live.len();
            return envelope(json!({ "active_scans": live, "total": total }));
        }

        RawResponse::new(404, r#"{"detail":"Not Found"}"#)
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(
        &self,
        request: &ApiRequest,
        _timeout: std::time::Duration,
    ) -> Result<RawResponse, ClientError> {
        Ok(self.handle(request))
    }
}

fn envelope(data: Value) -> RawResponse {
    RawResponse::new(200, json!({ "success": true, "data": data }).to_string())
}

pub fn controller(backend: &Arc<FakeBackend>) -> JobController {
    let transport: Arc<dyn Transport> = backend.clone();
    JobController::new(Arc::new(ResilientClient::with_transport(transport)))
}

pub fn running(progress: f64) -> Value {
    json!({ "status": "running", "progress": progress })
}

pub fn completed() -> Value {
    json!({ "status": "completed", "progress": 100 })
}
