//! Local stand-in for the Cloudflare API v4
//!
//! Serves the three endpoints the backend uses (zone lookup, record lookup,
//! record update) from an in-memory record table and counts every request.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use dnsman_core::BackendConfig;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE: &str = "example.com";
pub const ZONE_ID: &str = "zone-1";
pub const HOST: &str = "host.example.com";
pub const OLD_ADDR: &str = "203.0.113.5";
pub const NEW_ADDR: &str = "203.0.113.77";

#[derive(Default)]
struct ApiState {
    records: Mutex<Vec<Value>>,
    last_put: Mutex<Option<Value>>,
    zone_lookups: AtomicUsize,
    record_lookups: AtomicUsize,
    puts: AtomicUsize,
}

/// A running fake API bound to an ephemeral localhost port
pub struct FakeCloudflare {
    addr: SocketAddr,
    state: Arc<ApiState>,
    server: tokio::task::JoinHandle<()>,
}

impl FakeCloudflare {
    /// Start serving `records`
    pub async fn start(records: Vec<Value>) -> Self {
        let state = Arc::new(ApiState {
            records: Mutex::new(records),
            ..ApiState::default()
        });

        let app = Router::new()
            .route("/zones", get(list_zones))
            .route("/zones/{zone_id}/dns_records", get(list_records))
            .route("/zones/{zone_id}/dns_records/{record_id}", put(update_record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, server }
    }

    /// Backend configuration pointed at this server
    pub fn config(&self) -> BackendConfig {
        let mut config = BackendConfig::with_api_token("test-token");
        config.endpoint = Some(format!("http://{}", self.addr));
        config
    }

    pub fn put_count(&self) -> usize {
        self.state.puts.load(Ordering::SeqCst)
    }

    pub fn zone_lookup_count(&self) -> usize {
        self.state.zone_lookups.load(Ordering::SeqCst)
    }

    pub fn record_lookup_count(&self) -> usize {
        self.state.record_lookups.load(Ordering::SeqCst)
    }

    /// Body of the most recent PUT
    pub fn last_put(&self) -> Option<Value> {
        self.state.last_put.lock().unwrap().clone()
    }

    /// Current content of the record with `id`
    pub fn content_of(&self, id: &str) -> Option<String> {
        self.state
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r["id"] == id)
            .and_then(|r| r["content"].as_str().map(str::to_string))
    }
}

impl Drop for FakeCloudflare {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A record named `HOST`
pub fn record(id: &str, record_type: &str, content: &str) -> Value {
    json!({
        "id": id,
        "type": record_type,
        "name": HOST,
        "content": content,
        "ttl": 300,
        "proxied": false
    })
}

fn envelope(result: Value) -> Json<Value> {
    Json(json!({ "success": true, "errors": [], "result": result }))
}

fn unknown_zone(zone_id: &str) -> Json<Value> {
    Json(json!({
        "success": false,
        "errors": [{ "code": 7003, "message": format!("Could not route to /zones/{}", zone_id) }],
        "result": null
    }))
}

async fn list_zones(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.zone_lookups.fetch_add(1, Ordering::SeqCst);

    let zones = match query.get("name").map(String::as_str) {
        Some(ZONE) => json!([{ "id": ZONE_ID, "name": ZONE }]),
        _ => json!([]),
    };
    envelope(zones)
}

async fn list_records(
    State(state): State<Arc<ApiState>>,
    Path(zone_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record_lookups.fetch_add(1, Ordering::SeqCst);
    if zone_id != ZONE_ID {
        return unknown_zone(&zone_id);
    }

    let name = query.get("name").cloned().unwrap_or_default();
    let matches: Vec<Value> = state
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r["name"] == name.as_str())
        .cloned()
        .collect();
    envelope(Value::Array(matches))
}

async fn update_record(
    State(state): State<Arc<ApiState>>,
    Path((zone_id, record_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.puts.fetch_add(1, Ordering::SeqCst);
    *state.last_put.lock().unwrap() = Some(body.clone());
    if zone_id != ZONE_ID {
        return unknown_zone(&zone_id);
    }

    let mut records = state.records.lock().unwrap();
    match records.iter_mut().find(|r| r["id"] == record_id.as_str()) {
        Some(record) => {
            record["content"] = body["content"].clone();
            envelope(record.clone())
        }
        None => Json(json!({
            "success": false,
            "errors": [{ "code": 81044, "message": "Record does not exist." }],
            "result": null
        })),
    }
}
