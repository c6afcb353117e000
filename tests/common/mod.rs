//! Shared fixtures: a mock upstream API and recording exporters

#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use async_trait::async_trait;
use dte_extractor::config::{ApiConfig, ExtractorConfig};
use dte_extractor::downloader::{
    EnrichedRecord, ExtractionContext, PrimaryRecord, RateLimiter, RunStatistics,
};
use dte_extractor::fetcher::http::ApiHttpClient;
use dte_extractor::fetcher::retry::{RetryPolicy, RetryingFetcher};
use dte_extractor::fetcher::{ApiTransport, FetchError, FetchResult};
use dte_extractor::output::{OutputError, OutputResult, RecordExporter};

pub const USER_TOKEN: &str = "user-token";
pub const COMPANY_TOKEN: &str = "company-token";

/// Connection settings pointing at `server`
pub fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        user_token: USER_TOKEN.to_string(),
        company_token: COMPANY_TOKEN.to_string(),
    }
}

/// Fast tunables: no meaningful spacing, millisecond backoff
pub fn fast_config(data_dir: &Path) -> ExtractorConfig {
    ExtractorConfig {
        data_dir: data_dir.to_path_buf(),
        max_rps: 1000,
        backoff_base: Duration::from_millis(1),
        range_delay: Duration::from_millis(5),
        ..Default::default()
    }
}

/// Context talking to `server` over real HTTP
pub fn context(server: &MockServer, config: &ExtractorConfig) -> Arc<ExtractionContext> {
    let transport: Arc<dyn ApiTransport> =
        Arc::new(ApiHttpClient::new(&api_config(server)).expect("valid test config"));
    Arc::new(ExtractionContext::new(transport, config))
}

/// `{data: {<key>: items}, meta: {total_pages}}`
pub fn list_body(key: &str, items: Vec<Value>, total_pages: u32) -> Value {
    let mut data = serde_json::Map::new();
    data.insert(key.to_string(), Value::Array(items));
    json!({
        "data": data,
        "meta": { "current_page": 1, "total_pages": total_pages, "total_count": 0 }
    })
}

/// List record of a DTE
pub fn dte_json(id: i64, seller_id: Option<i64>) -> Value {
    json!({
        "id": id,
        "folio": 1000 + id,
        "type_document": 33,
        "seller_id": seller_id,
        "amount_total": 11900.0
    })
}

/// Serve every reference collection the DTE pipeline pre-populates; sellers
/// hold seller 1 only
pub async fn mount_reference_collections(server: &MockServer) {
    let collections = [
        ("/vendedores", "sellers", vec![json!({"id": 1, "first_name": "Ana", "last_name": "Rojas"})]),
        ("/forma_pagos", "type_payments", vec![json!({"id": 1, "name": "Contado"})]),
        ("/usuarios", "users", vec![]),
        ("/references", "references", vec![]),
        ("/clientes", "customers", vec![]),
        ("/ciudades", "cities", vec![]),
        ("/comunas", "communes", vec![]),
    ];
    for (route, key, items) in collections {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(key, items, 1)))
            .mount(server)
            .await;
    }
}

/// Serve `/dtes/{id}` echoing the requested id
pub async fn mount_dte_details(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/dtes/\d+$"))
        .respond_with(|request: &Request| {
            let id: i64 = request
                .url
                .path()
                .rsplit('/')
                .next()
                .and_then(|id| id.parse().ok())
                .unwrap_or_default();
            ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "id": id,
                    "folio": 1000 + id,
                    "products": [{"product_id": 1, "name": "Widget", "quantity": 1, "price": 10000}],
                    "emails": null
                }
            }))
        })
        .mount(server)
        .await;
}

/// Exporter that records what it was asked to write
#[derive(Default)]
pub struct RecordingExporter {
    calls: Mutex<Vec<(PathBuf, Vec<i64>)>>,
}

impl RecordingExporter {
    /// `(path, record ids)` per call
    pub fn calls(&self) -> Vec<(PathBuf, Vec<i64>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl<R: PrimaryRecord> RecordExporter<R> for RecordingExporter {
    fn export(&self, records: &[EnrichedRecord<R>], path: &Path) -> OutputResult<()> {
        let ids = records.iter().map(|r| r.id()).collect();
        self.calls.lock().unwrap().push((path.to_path_buf(), ids));
        Ok(())
    }
}

/// Exporter that always fails
pub struct FailingExporter;

impl<R: PrimaryRecord> RecordExporter<R> for FailingExporter {
    fn export(&self, _records: &[EnrichedRecord<R>], path: &Path) -> OutputResult<()> {
        Err(OutputError::IoError(format!("disk full writing {}", path.display())))
    }
}

type Script = dyn Fn(&str, usize) -> FetchResult<Value> + Send + Sync;

/// In-memory transport answering from a script and recording every call
///
/// The script receives the path and how many times that path was requested
/// before (0 on the first call).
pub struct ScriptedTransport {
    script: Box<Script>,
    calls: Mutex<Vec<(String, tokio::time::Instant)>>,
}

impl ScriptedTransport {
    pub fn new(script: impl Fn(&str, usize) -> FetchResult<Value> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(path, instant)` of every call, in call order
    pub fn calls(&self) -> Vec<(String, tokio::time::Instant)> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls made to `path`
    pub fn count(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(p, _)| p == path).count()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn get_json(&self, path: &str, _query: &[(&str, String)]) -> FetchResult<Value> {
        let previous = {
            let mut calls = self.calls.lock().unwrap();
            let previous = calls.iter().filter(|(p, _)| p == path).count();
            calls.push((path.to_string(), tokio::time::Instant::now()));
            previous
        };
        (self.script)(path, previous)
    }

    fn base_url(&self) -> &str {
        "scripted://"
    }
}

/// Error carrying `status` for `path`
pub fn status(status: u16, path: &str) -> FetchError {
    FetchError::Status {
        status,
        path: path.to_string(),
    }
}

/// Retrying fetcher over `transport` with its own limiter and statistics
pub fn fetcher(transport: Arc<ScriptedTransport>, max_rps: u32, max_attempts: u32, backoff_base: Duration) -> RetryingFetcher {
    RetryingFetcher::new(
        transport,
        Arc::new(RateLimiter::per_second(max_rps)),
        Arc::new(RunStatistics::new()),
        RetryPolicy {
            max_attempts,
            backoff_base,
            ..Default::default()
        },
    )
}
