//! In-memory REST backend for service tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use estate_client::{ClientConfig, EstateClient, ResourcePath, RestClient};
use estate_types::{EstateError, Result};
use serde_json::{json, Value};

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<Value>>,
    paged: Vec<String>,
    calls: Vec<String>,
    failures: HashMap<&'static str, VecDeque<EstateError>>,
    reject_deletes: bool,
    next_id: usize,
}

/// Records stored per collection root (`/api/leads`), answering the routes
/// the client uses. Every call is logged as `"<METHOD> <path>"`.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    latency: Duration,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long first (tokio time, so paused tests advance it)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn seed(&self, resource: &str, records: Vec<Value>) {
        let mut state = self.state.lock().unwrap();
        state.collections.insert(format!("/api/{}", resource), records);
    }

    /// Lists of `resource` come back as `{items, totalCount}`
    pub fn paginate(&self, resource: &str) {
        self.state.lock().unwrap().paged.push(format!("/api/{}", resource));
    }

    /// The next `method` call fails with `error`
    pub fn fail_next(&self, method: &'static str, error: EstateError) {
        let mut state = self.state.lock().unwrap();
        state.failures.entry(method).or_default().push_back(error);
    }

    pub fn reject_deletes(&self) {
        self.state.lock().unwrap().reject_deletes = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        let prefix = format!("{} ", method);
        self.calls().iter().filter(|c| c.starts_with(&prefix)).count()
    }

    pub fn records(&self, resource: &str) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(&format!("/api/{}", resource))
            .cloned()
            .unwrap_or_default()
    }

    pub fn client(&self) -> EstateClient {
        EstateClient::with_rest(ClientConfig::default(), Arc::new(self.clone()))
    }

    pub fn client_with(&self, config: ClientConfig) -> EstateClient {
        EstateClient::with_rest(config, Arc::new(self.clone()))
    }

    async fn handle(&self, method: &'static str, path: &ResourcePath, body: Option<Value>) -> Result<Value> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{} {}", method, path));
        if let Some(err) = state.failures.get_mut(method).and_then(VecDeque::pop_front) {
            return Err(err);
        }

        let base = path.base();
        let full = path.path();
        let rest: Vec<&str> = full[base.len()..]
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match (method, rest.as_slice()) {
            ("GET", []) => {
                let items: Vec<Value> = state
                    .collections
                    .get(&base)
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|record| matches_query(record, path.query()))
                    .collect();
                if state.paged.contains(&base) {
                    let total = items.len();
                    Ok(json!({ "items": items, "totalCount": total }))
                } else {
                    Ok(Value::Array(items))
                }
            }
            ("GET", [id]) => find(&state, &base, id).cloned().ok_or_else(|| not_found(&full)),
            ("POST", [action]) => {
                let body = body.unwrap_or_default();
                let user = body.get("userId").cloned().unwrap_or_default();
                let records = state.collections.entry(base).or_default();
                let mut updated = 0;
                for record in records.iter_mut().filter(|r| r.get("userId") == Some(&user)) {
                    let archived = record.get("status") == Some(&json!("archived"));
                    let read = record.get("isRead") == Some(&json!(true));
                    match *action {
                        "mark-all-read" if !read && !archived => {
                            merge(record, json!({ "isRead": true, "readAt": body["readAt"] }));
                            updated += 1;
                        }
                        "archive-read" if read && !archived => {
                            merge(
                                record,
                                json!({ "status": "archived", "archivedAt": body["archivedAt"] }),
                            );
                            updated += 1;
                        }
                        _ => {}
                    }
                }
                Ok(json!({ "updated": updated }))
            }
            ("POST", []) => {
                let mut record = body.unwrap_or_else(|| json!({}));
                if record.get("id").map_or(true, |id| id.as_str() == Some("")) {
                    state.next_id += 1;
                    record["id"] = json!(format!("new-{}", state.next_id));
                }
                state.collections.entry(base).or_default().push(record.clone());
                Ok(record)
            }
            ("PATCH", [id]) => {
                let record = find_mut(&mut state, &base, id).ok_or_else(|| not_found(&full))?;
                merge(record, body.unwrap_or_default());
                Ok(record.clone())
            }
            ("PATCH", [id, "steps", step_id]) => {
                let record = find_mut(&mut state, &base, id).ok_or_else(|| not_found(&full))?;
                let step = record["steps"]
                    .as_array_mut()
                    .and_then(|steps| steps.iter_mut().find(|s| s["id"] == json!(step_id)))
                    .ok_or_else(|| not_found(&full))?;
                merge(step, body.unwrap_or_default());
                Ok(step.clone())
            }
            ("PUT", [id]) => {
                let record = find_mut(&mut state, &base, id).ok_or_else(|| not_found(&full))?;
                *record = body.unwrap_or_default();
                Ok(record.clone())
            }
            ("DELETE", [id]) => {
                if state.reject_deletes {
                    return Ok(json!({ "success": false, "message": "record is referenced" }));
                }
                let records = state.collections.entry(base).or_default();
                let before = records.len();
                records.retain(|r| r["id"] != json!(id));
                Ok(json!({ "success": records.len() < before }))
            }
            _ => Err(EstateError::Validation(format!("unsupported route {} {}", method, full))),
        }
    }
}

fn not_found(path: &str) -> EstateError {
    EstateError::NotFound(path.to_string())
}

fn find<'a>(state: &'a State, base: &str, id: &str) -> Option<&'a Value> {
    state.collections.get(base)?.iter().find(|r| r["id"] == json!(id))
}

fn find_mut<'a>(state: &'a mut State, base: &str, id: &str) -> Option<&'a mut Value> {
    state
        .collections
        .get_mut(base)?
        .iter_mut()
        .find(|r| r["id"] == json!(id))
}

fn merge(target: &mut Value, patch: Value) {
    if let (Some(target), Value::Object(patch)) = (target.as_object_mut(), patch) {
        for (k, v) in patch {
            target.insert(k, v);
        }
    }
}

/// Equality on plain string fields; other params are left to the client
fn matches_query(record: &Value, query: &[(String, String)]) -> bool {
    query.iter().all(|(key, value)| match record.get(key) {
        Some(Value::String(actual)) => actual == value,
        _ => true,
    })
}

#[async_trait]
impl RestClient for MemoryBackend {
    async fn get(&self, path: &ResourcePath) -> Result<Value> {
        self.handle("GET", path, None).await
    }

    async fn post(&self, path: &ResourcePath, body: Value) -> Result<Value> {
        self.handle("POST", path, Some(body)).await
    }

    async fn patch(&self, path: &ResourcePath, body: Value) -> Result<Value> {
        self.handle("PATCH", path, Some(body)).await
    }

    async fn put(&self, path: &ResourcePath, body: Value) -> Result<Value> {
        self.handle("PUT", path, Some(body)).await
    }

    async fn delete(&self, path: &ResourcePath) -> Result<Value> {
        self.handle("DELETE", path, None).await
    }
}

/// Log output for a failing test: `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn lead(id: &str, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "phone": "+91 98000 00000",
        "email": format!("{}@example.com", name.to_lowercase()),
        "status": status,
        "source": "website",
        "priority": "medium",
        "createdAt": "2024-03-01T10:00:00Z"
    })
}

pub fn notification(id: &str, user_id: &str, is_read: bool) -> Value {
    json!({
        "id": id,
        "userId": user_id,
        "title": format!("Notification {}", id),
        "message": "",
        "category": "lead",
        "priority": "medium",
        "isRead": is_read,
        "status": "active",
        "createdAt": "2024-03-01T10:00:00Z"
    })
}

pub fn tracker(id: &str, statuses: &[&str]) -> Value {
    let steps: Vec<Value> = statuses
        .iter()
        .enumerate()
        .map(|(i, status)| {
            json!({
                "id": format!("s{}", i + 1),
                "title": format!("Step {}", i + 1),
                "status": status,
                "priority": "high"
            })
        })
        .collect();
    json!({
        "id": id,
        "propertyId": "p1",
        "title": "12 Palm Grove",
        "steps": steps,
        "createdAt": "2024-03-01T10:00:00Z"
    })
}
