//! Docs engine client tests against a mock engine

use std::time::Duration;

use assert_matches::assert_matches;
use docbridge::backend::engine::{ConvertRequest, EngineClient, EngineError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::*;

fn client(engine: &MockEngine, secret: Option<&str>) -> EngineClient {
    let mut builder = base_config(&engine.url());
    if let Some(secret) = secret {
        builder = builder.engine_secret(secret);
    }
    let config = builder.build().unwrap();
    EngineClient::new(config.engine, Duration::from_secs(300)).unwrap()
}

#[tokio::test]
async fn test_check_reports_version() {
    let engine = MockEngine::start().await;
    engine.healthy("8.2.1").await;

    let version = client(&engine, None).check().await.unwrap();
    assert_eq!(version, "8.2.1");
}

#[tokio::test]
async fn test_unhealthy_engine() {
    let engine = MockEngine::start().await;
    Mock::given(method("GET"))
        .and(path("/healthcheck"))
        .respond_with(ResponseTemplate::new(200).set_body_string("false"))
        .mount(&engine.server)
        .await;

    assert_matches!(client(&engine, None).check().await, Err(EngineError::BadResponse(_)));
}

#[tokio::test]
async fn test_http_error_status() {
    let engine = MockEngine::start().await;
    Mock::given(method("GET"))
        .and(path("/healthcheck"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&engine.server)
        .await;

    assert_matches!(client(&engine, None).healthcheck().await, Err(EngineError::Status(500)));
}

#[tokio::test]
async fn test_conversion_result_url() {
    let engine = MockEngine::start().await;
    engine.converts_to("/cache/out.pdf", b"pdf").await;

    let request = ConvertRequest::new("http://cloud.test/dl", "docx", "pdf", "42-1700000000");
    let url = client(&engine, None).convert(&request).await.unwrap();
    assert_eq!(url, engine.file_url("/cache/out.pdf"));

    let sent = engine.received_json("/converter").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["url"], "http://cloud.test/dl");
    assert_eq!(sent[0]["filetype"], "docx");
    assert_eq!(sent[0]["outputtype"], "pdf");
    assert_eq!(sent[0]["async"], false);
    assert!(sent[0].get("token").is_none());
}

#[tokio::test]
async fn test_conversion_error_code() {
    let engine = MockEngine::start().await;
    engine.converter_response(json!({ "error": -5 })).await;

    let request = ConvertRequest::new("http://cloud.test/dl", "docx", "pdf", "k");
    let error = client(&engine, None).convert(&request).await.unwrap_err();
    assert_matches!(error, EngineError::Conversion { code: -5 });
    assert_eq!(error.to_string(), "conversion failed (-5): Incorrect password");
}

#[tokio::test]
async fn test_unfinished_conversion() {
    let engine = MockEngine::start().await;
    engine
        .converter_response(json!({ "endConvert": false, "percent": 40 }))
        .await;

    let request = ConvertRequest::new("http://cloud.test/dl", "docx", "pdf", "k");
    assert_matches!(
        client(&engine, None).convert(&request).await,
        Err(EngineError::NotReady)
    );
}

#[tokio::test]
async fn test_command_error_code() {
    let engine = MockEngine::start().await;
    engine.command_response(json!({ "error": 1, "key": "abc" })).await;

    let error = client(&engine, None)
        .command("forcesave", Some(json!({ "key": "abc" })))
        .await
        .unwrap_err();
    assert_matches!(error, EngineError::Command { code: 1 });

    let sent = engine.received_json("/coauthoring/CommandService.ashx").await;
    assert_eq!(sent, vec![json!({ "c": "forcesave", "key": "abc" })]);
}

#[tokio::test]
async fn test_signed_requests_carry_both_tokens() {
    let engine = MockEngine::start().await;
    engine.healthy("8.2.1").await;

    client(&engine, Some(ENGINE_SECRET)).version().await.unwrap();

    let requests = engine.server.received_requests().await.unwrap();
    let command = requests
        .iter()
        .find(|request| request.url.path() == "/coauthoring/CommandService.ashx")
        .expect("command request sent");

    let header = command
        .headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .expect("signed header");
    let header_token = header.strip_prefix("Bearer ").expect("bearer scheme");
    let claims: Value = engine_codec().verify(header_token).unwrap();
    assert_eq!(claims["payload"]["c"], "version");

    let body: Value = serde_json::from_slice(&command.body).unwrap();
    assert_eq!(body["c"], "version");
    let body_claims: Value = engine_codec().verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(body_claims["c"], "version");
}

#[tokio::test]
async fn test_fetch_missing_file() {
    let engine = MockEngine::start().await;
    assert_matches!(
        client(&engine, None).fetch_bytes(&engine.file_url("/cache/none")).await,
        Err(EngineError::Status(404))
    );
}
