//! Download and blank-document callback tests

use axum::http::{header, StatusCode};
use bytes::Bytes;
use docbridge::backend::host::FileStore;
use docbridge::shared::DownloadClaims;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn test_download_current_content() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "report.docx", "current");

    let response = app
        .get(&format!("/callback/download?doc={}", download_token(DownloadClaims::new(file.id))))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"current"));
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.docx\""
    );
}

#[tokio::test]
async fn test_download_launch_url() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "report.docx", "current");
    let launch = app.state.launcher.prepare(file.id, "alice", true).await.unwrap();

    let path = launch.document_url.strip_prefix(STORAGE_URL).unwrap();
    let response = app.get(path).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"current"));
}

#[tokio::test]
async fn test_download_version_and_changes() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "report.docx", "v1");
    app.host.write(file.id, Bytes::from_static(b"v2")).await.unwrap();
    let version = file.mtime.to_string();
    app.state
        .ledger
        .save_history("alice", file.id, &version, &json!({}), Some(b"changes"), "0")
        .await
        .unwrap();

    let claims = DownloadClaims {
        version: Some(version.clone()),
        ..DownloadClaims::new(file.id)
    };
    let response = app.get(&format!("/callback/download?doc={}", download_token(claims))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"v1"));

    let claims = DownloadClaims {
        version: Some(version),
        changes: true,
        ..DownloadClaims::new(file.id)
    };
    let response = app.get(&format!("/callback/download?doc={}", download_token(claims))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"changes"));
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"changes.zip\""
    );
}

#[tokio::test]
async fn test_download_missing_changes() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "report.docx", "v1");

    let claims = DownloadClaims {
        version: Some("12345".to_string()),
        changes: true,
        ..DownloadClaims::new(file.id)
    };
    let response = app.get(&format!("/callback/download?doc={}", download_token(claims))).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let claims = DownloadClaims {
        changes: true,
        ..DownloadClaims::new(file.id)
    };
    let response = app.get(&format!("/callback/download?doc={}", download_token(claims))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_rejects_bad_tokens() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "report.docx", "v1");

    let response = app.get("/callback/download").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .get(&format!("/callback/download?doc={}", track_token(file.id, None)))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get("/callback/download?doc=not.a.token").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .get(&format!("/callback/download?doc={}", download_token(DownloadClaims::new(999))))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_of_shared_file() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "shared.docx", "public");
    app.host.add_share("share-1", file.id);

    let claims = DownloadClaims {
        share_token: Some("share-1".to_string()),
        ..DownloadClaims::new(file.id)
    };
    let response = app.get(&format!("/callback/download?doc={}", download_token(claims))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"public"));
}

#[tokio::test]
async fn test_signed_engine_must_authenticate_downloads() {
    let app = TestApp::signed().await;
    let file = app.host.add_file("alice", "report.docx", "secret");
    let uri = format!("/callback/download?doc={}", download_token(DownloadClaims::new(file.id)));

    let response = app.get(&uri).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .get_with(&uri, &[("Authorization", engine_bearer(json!({ "url": "x" })))])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"secret"));
}

#[tokio::test]
async fn test_empty_file_served_from_template() {
    let app = TestApp::new().await;
    app.host.add_blank_document("xlsx", "blank sheet");
    let file = app.host.add_file("alice", "Budget.XLSX", "");

    let launch = app.state.launcher.prepare(file.id, "alice", true).await.unwrap();
    assert!(launch.document_url.contains("/callback/emptyfile?doc="));

    let path = launch.document_url.strip_prefix(STORAGE_URL).unwrap();
    let response = app.get(path).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"blank sheet"));
}

#[tokio::test]
async fn test_emptied_file_launches_blank_document() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "notes.docx", "draft");

    let launch = app.state.launcher.prepare(file.id, "alice", true).await.unwrap();
    assert!(launch.document_url.contains("/callback/download?doc="));

    app.host.external_write(file.id, "").await.unwrap();
    let launch = app.state.launcher.prepare(file.id, "alice", true).await.unwrap();
    assert!(launch.document_url.contains("/callback/emptyfile?doc="));
}

#[tokio::test]
async fn test_download_template() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "report.docx", "current");
    let template_id = app.host.add_template("letter.docx", "TEMPLATE");

    let claims = DownloadClaims {
        template: true,
        ..DownloadClaims::new(template_id)
    };
    let response = app.get(&format!("/callback/download?doc={}", download_token(claims))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"TEMPLATE"));
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"letter.docx\""
    );

    let response = app
        .get(&format!("/callback/download?doc={}", download_token(DownloadClaims::new(file.id))))
        .await;
    assert_eq!(response.body, Bytes::from_static(b"current"));
}

#[tokio::test]
async fn test_download_template_errors() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "report.docx", "current");
    let template_id = app.host.add_template("letter.docx", "TEMPLATE");

    // A file id is not a template id
    let claims = DownloadClaims {
        template: true,
        ..DownloadClaims::new(file.id)
    };
    let response = app.get(&format!("/callback/download?doc={}", download_token(claims))).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let claims = DownloadClaims {
        template: true,
        version: Some("1".to_string()),
        ..DownloadClaims::new(template_id)
    };
    let response = app.get(&format!("/callback/download?doc={}", download_token(claims))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_file_requires_empty_token() {
    let app = TestApp::new().await;
    app.host.add_blank_document("docx", "blank");
    let file = app.host.add_file("alice", "new.docx", "");

    let response = app
        .get(&format!("/callback/emptyfile?doc={}", download_token(DownloadClaims::new(file.id))))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get(&format!("/callback/emptyfile?doc={}", empty_token(file.id))).await;
    assert_eq!(response.status, StatusCode::OK);

    let unknown = app.host.add_file("alice", "diagram.vsdx", "");
    let response = app.get(&format!("/callback/emptyfile?doc={}", empty_token(unknown.id))).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_answers_json() {
    let app = TestApp::new().await;
    let response = app.get("/nowhere").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.json().is_object());
}
