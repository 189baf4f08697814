//! Mock Docs engine and federated instances
//!
//! Thin helpers over `wiremock` that mount the endpoints docbridge calls.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A wiremock server standing in for the Docs engine
pub struct MockEngine {
    pub server: MockServer,
}

impl MockEngine {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Absolute URL of a path on the mock
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}{}", self.server.uri(), file_path)
    }

    /// Serve `body` at `file_path`, the way the engine serves saved results
    pub async fn serve_file(&self, file_path: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(file_path))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&self.server)
            .await;
    }

    pub async fn healthy(&self, version: &str) {
        Mock::given(method("GET"))
            .and(path("/healthcheck"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .mount(&self.server)
            .await;
        self.command_response(json!({ "error": 0, "version": version })).await;
    }

    pub async fn command_response(&self, body: Value) {
        Mock::given(method("POST"))
            .and(path("/coauthoring/CommandService.ashx"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn converter_response(&self, body: Value) {
        Mock::given(method("POST"))
            .and(path("/converter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Finish every conversion with the result at `result_path`
    pub async fn converts_to(&self, result_path: &str, content: &[u8]) {
        self.converter_response(json!({
            "endConvert": true,
            "fileUrl": self.file_url(result_path),
            "percent": 100,
        }))
        .await;
        self.serve_file(result_path, content).await;
    }

    /// JSON bodies of the requests received on `request_path`
    pub async fn received_json(&self, request_path: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == request_path)
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }
}

/// A wiremock server standing in for a federated instance
pub struct MockRemote {
    pub server: MockServer,
}

impl MockRemote {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn origin(&self) -> String {
        self.server.uri()
    }

    pub async fn alive(&self, alive: bool) {
        Mock::given(method("GET"))
            .and(path("/api/v1/healthcheck"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "alive": alive })))
            .mount(&self.server)
            .await;
    }

    pub async fn respond(&self, endpoint: &str, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn received_json(&self, request_path: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == request_path)
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }
}
