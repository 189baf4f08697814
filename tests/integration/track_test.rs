//! Track callback integration tests
//!
//! Drives the engine's status reports through `/callback/track` and checks
//! the resulting storage, lock and ledger state.

use axum::http::StatusCode;
use docbridge::backend::host::FileStore;
use docbridge::backend::tokens::TokenCodec;
use docbridge::shared::DownloadClaims;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

use crate::common::*;

#[tokio::test]
async fn test_edit_save_close_cycle() {
    let app = TestApp::new().await;
    app.host.add_user("alice", "Alice");
    let file = app.host.add_file("alice", "report.docx", "v1");
    let launch = app.state.launcher.prepare(file.id, "alice", true).await.unwrap();
    let doc = doc_param(&launch.callback_url);

    app.engine.serve_file("/cache/report.docx", b"v2").await;
    app.engine.serve_file("/cache/changes.zip", b"zip").await;

    // Editing locks the file and keeps the key
    let response = app
        .track(&doc, json!({ "key": launch.key, "status": 1, "users": ["docbridge_alice"] }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert!(app.state.registry.is_locked(file.id).await.unwrap());
    assert_eq!(app.state.registry.get_key(file.id).await.unwrap(), Some(launch.key.clone()));

    // MustSave writes the result and records history
    let response = app
        .track(
            &doc,
            json!({
                "key": launch.key,
                "status": 2,
                "url": app.engine.file_url("/cache/report.docx"),
                "changesurl": app.engine.file_url("/cache/changes.zip"),
                "filetype": "docx",
                "history": { "serverVersion": "8.1.0", "changes": [] },
                "users": ["docbridge_alice"],
            }),
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert_eq!(app.content(file.id).await, "v2");
    assert!(!app.state.registry.is_locked(file.id).await.unwrap());
    assert_eq!(app.state.registry.get_key(file.id).await.unwrap(), None);

    let version = app.mtime(file.id).await.to_string();
    let history = app
        .state
        .ledger
        .get_history("alice", file.id, &version, &file.mtime.to_string())
        .await
        .unwrap()
        .expect("history recorded");
    assert_eq!(history["serverVersion"], "8.1.0");
    assert_eq!(
        app.state.ledger.get_changes("alice", file.id, &version).await.unwrap(),
        Some(b"zip".to_vec())
    );
    let author = app.state.ledger.get_author("alice", file.id, &version).await.unwrap().unwrap();
    assert_eq!(author.id, "alice");
    assert_eq!(author.name, "Alice");

    // Closed leaves the file unlocked
    let response = app.track(&doc, json!({ "key": launch.key, "status": 4 })).await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert!(!app.state.registry.is_locked(file.id).await.unwrap());
}

#[tokio::test]
async fn test_forcesave_keeps_key_and_skips_history() {
    let app = TestApp::new().await;
    app.host.add_user("alice", "Alice");
    let file = app.host.add_file("alice", "notes.docx", "v1");
    let launch = app.state.launcher.prepare(file.id, "alice", true).await.unwrap();
    let doc = doc_param(&launch.callback_url);
    app.engine.serve_file("/cache/force.docx", b"v2").await;
    app.engine.serve_file("/cache/final.docx", b"v3").await;

    app.track(&doc, json!({ "key": launch.key, "status": 1 })).await;

    let response = app
        .track(
            &doc,
            json!({
                "key": launch.key,
                "status": 6,
                "forcesavetype": 0,
                "url": app.engine.file_url("/cache/force.docx"),
                "history": { "serverVersion": "8.1.0" },
                "users": ["docbridge_alice"],
            }),
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert_eq!(app.content(file.id).await, "v2");
    assert!(app.state.registry.is_locked(file.id).await.unwrap());
    assert!(app.state.registry.was_forcesave(file.id).await.unwrap());
    assert_eq!(app.state.registry.get_key(file.id).await.unwrap(), Some(launch.key.clone()));
    assert_eq!(app.state.ledger.history_count(file.id).await.unwrap(), 0);

    let forced_version = app.mtime(file.id).await.to_string();
    assert!(app
        .state
        .ledger
        .get_author("alice", file.id, &forced_version)
        .await
        .unwrap()
        .is_some());

    // The save closing a forcesave streak records no history either
    let response = app
        .track(
            &doc,
            json!({
                "key": launch.key,
                "status": 2,
                "url": app.engine.file_url("/cache/final.docx"),
                "history": { "serverVersion": "8.1.0" },
                "users": ["docbridge_alice"],
            }),
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert_eq!(app.content(file.id).await, "v3");
    assert_eq!(app.state.ledger.history_count(file.id).await.unwrap(), 0);
    assert!(!app.state.registry.was_forcesave(file.id).await.unwrap());
    assert!(!app.state.registry.is_locked(file.id).await.unwrap());
    assert_eq!(app.state.registry.get_key(file.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_button_forcesave_attributed_to_action_user() {
    let app = TestApp::new().await;
    app.host.add_user("alice", "Alice");
    app.host.add_user("bob", "Bob");
    let file = app.host.add_file("alice", "plan.docx", "v1");
    app.engine.serve_file("/cache/plan.docx", b"v2").await;

    let response = app
        .track(
            &track_token(file.id, Some("alice")),
            json!({
                "status": 6,
                "forcesavetype": 1,
                "url": app.engine.file_url("/cache/plan.docx"),
                "users": ["docbridge_alice"],
                "actions": [{ "type": 2, "userid": "docbridge_bob" }],
            }),
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));

    let version = app.mtime(file.id).await.to_string();
    let author = app.state.ledger.get_author("alice", file.id, &version).await.unwrap().unwrap();
    assert_eq!(author.id, "bob");
}

#[tokio::test]
async fn test_save_without_url_rejected_and_unlocked() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");
    let doc = track_token(file.id, Some("alice"));

    app.track(&doc, json!({ "status": 1 })).await;
    assert!(app.state.registry.is_locked(file.id).await.unwrap());

    let response = app.track(&doc, json!({ "status": 2 })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": 1 }));
    assert_eq!(app.content(file.id).await, "v1");
    assert!(!app.state.registry.is_locked(file.id).await.unwrap());
}

#[tokio::test]
async fn test_corrupted_save_still_written() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");
    app.engine.serve_file("/cache/a.docx", b"recovered").await;

    let response = app
        .track(
            &track_token(file.id, None),
            json!({ "status": 3, "url": app.engine.file_url("/cache/a.docx") }),
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert_eq!(app.content(file.id).await, "recovered");
    assert!(!app.state.registry.is_locked(file.id).await.unwrap());
}

#[tokio::test]
async fn test_write_retried_while_storage_locked() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");
    app.engine.serve_file("/cache/a.docx", b"v2").await;
    app.host.fail_next_writes(2);

    let response = app
        .track(
            &track_token(file.id, None),
            json!({ "status": 2, "url": app.engine.file_url("/cache/a.docx") }),
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert_eq!(app.content(file.id).await, "v2");
    assert_eq!(app.host.write_attempts(), 3);
    assert_eq!(app.host.advisory_lock_calls(), 3);
    assert!(!app.host.is_advisory_locked(file.id));
}

#[tokio::test]
async fn test_write_gives_up_after_retries() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");
    app.engine.serve_file("/cache/a.docx", b"v2").await;
    app.host.fail_next_writes(10);
    let doc = track_token(file.id, None);

    app.track(&doc, json!({ "status": 1 })).await;
    let response = app
        .track(&doc, json!({ "status": 2, "url": app.engine.file_url("/cache/a.docx") }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "error": 1 }));
    assert_eq!(app.content(file.id).await, "v1");
    assert_eq!(app.host.write_attempts(), 4);
    assert!(!app.state.registry.is_locked(file.id).await.unwrap());
    assert!(!app.host.is_advisory_locked(file.id));
}

#[tokio::test]
async fn test_unreachable_result_reports_error() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");

    let response = app
        .track(
            &track_token(file.id, None),
            json!({ "status": 2, "url": app.engine.file_url("/cache/missing.docx") }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "error": 1 }));
    assert_eq!(app.content(file.id).await, "v1");
}

#[tokio::test]
async fn test_foreign_result_converted_back() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "sheet.xlsx", "v1");
    app.engine.serve_file("/cache/result.ods", b"ods").await;
    app.engine.converts_to("/cache/converted.xlsx", b"xlsx").await;

    let response = app
        .track(
            &track_token(file.id, None),
            json!({
                "status": 2,
                "filetype": "ods",
                "url": app.engine.file_url("/cache/result.ods"),
            }),
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert_eq!(app.content(file.id).await, "xlsx");

    let requests = app.engine.received_json("/converter").await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["filetype"], "ods");
    assert_eq!(requests[0]["outputtype"], "xlsx");
}

#[tokio::test]
async fn test_version_history_disabled() {
    let app = TestApp::build(|config| config.version_history(false)).await;
    app.host.add_user("alice", "Alice");
    let file = app.host.add_file("alice", "a.docx", "v1");
    app.engine.serve_file("/cache/a.docx", b"v2").await;

    let response = app
        .track(
            &track_token(file.id, Some("alice")),
            json!({
                "status": 2,
                "url": app.engine.file_url("/cache/a.docx"),
                "history": { "serverVersion": "8.1.0" },
                "users": ["docbridge_alice"],
            }),
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));

    let version = app.mtime(file.id).await.to_string();
    assert_eq!(app.state.ledger.history_count(file.id).await.unwrap(), 0);
    assert_eq!(app.state.ledger.get_author("alice", file.id, &version).await.unwrap(), None);
}

#[tokio::test]
async fn test_token_for_other_action_rejected() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");

    let response = app
        .track(&download_token(DownloadClaims::new(file.id)), json!({ "status": 1 }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.json(), json!({ "error": 1 }));
    assert!(!app.state.registry.is_locked(file.id).await.unwrap());
}

#[tokio::test]
async fn test_forged_and_expired_tokens_rejected() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");

    let forged = TokenCodec::new("not-the-host-secret", Duration::from_secs(300))
        .sign(&docbridge::shared::SessionClaims::Track(docbridge::shared::TrackClaims {
            file_id: file.id,
            user_id: None,
            share_token: None,
            file_path: None,
        }))
        .unwrap();
    let response = app.track(&forged, json!({ "status": 1 })).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.track("", json!({ "status": 1 })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_doc_token_accepted_from_body() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");

    let response = app
        .post_json(
            "/callback/track",
            &json!({ "doc": track_token(file.id, None), "status": 1 }),
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert!(app.state.registry.is_locked(file.id).await.unwrap());
}

#[tokio::test]
async fn test_unknown_status_and_file() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");

    let response = app.track(&track_token(file.id, None), json!({ "status": 9 })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": 1 }));

    let response = app.track(&track_token(4242, None), json!({ "status": 1 })).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": 1 }));
}

#[tokio::test]
async fn test_engine_signature_required_when_configured() {
    let app = TestApp::signed().await;
    let file = app.host.add_file("alice", "a.docx", "v1");
    let doc = track_token(file.id, None);

    let response = app.track(&doc, json!({ "status": 1 })).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json(), json!({ "error": 1 }));

    let forged = TokenCodec::new("wrong", Duration::from_secs(300))
        .sign(&json!({ "status": 1 }))
        .unwrap();
    let response = app.track(&doc, json!({ "status": 1, "token": forged })).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(!app.state.registry.is_locked(file.id).await.unwrap());

    let signed = engine_codec().sign(&json!({ "key": "k", "status": 1 })).unwrap();
    let response = app.track(&doc, json!({ "status": 1, "token": signed })).await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert!(app.state.registry.is_locked(file.id).await.unwrap());
}

#[tokio::test]
async fn test_signed_fields_override_raw_report() {
    let app = TestApp::signed().await;
    let file = app.host.add_file("alice", "a.docx", "v1");
    app.engine.serve_file("/cache/evil.docx", b"evil").await;
    let doc = track_token(file.id, None);

    app.track(&doc, json!({ "status": 1, "token": engine_codec().sign(&json!({ "status": 1 })).unwrap() }))
        .await;

    // The raw body claims a save; the engine only signed a close
    let response = app
        .post_json_with(
            &format!("/callback/track?doc={}", doc),
            &json!({ "status": 2, "url": app.engine.file_url("/cache/evil.docx") }),
            &[("Authorization", engine_bearer(json!({ "status": 4 })))],
        )
        .await;
    assert_eq!(response.json(), json!({ "error": 0 }));
    assert_eq!(app.content(file.id).await, "v1");
    assert!(!app.state.registry.is_locked(file.id).await.unwrap());
}

#[tokio::test]
async fn test_external_write_during_session_keeps_key() {
    let app = TestApp::new().await;
    let file = app.host.add_file("alice", "a.docx", "v1");
    let launch = app.state.launcher.prepare(file.id, "alice", true).await.unwrap();
    let doc = doc_param(&launch.callback_url);

    app.track(&doc, json!({ "status": 1 })).await;
    app.host.external_write(file.id, "uploaded").await.unwrap();
    assert_eq!(app.state.registry.get_key(file.id).await.unwrap(), Some(launch.key.clone()));

    app.track(&doc, json!({ "status": 4 })).await;
    app.host.external_write(file.id, "uploaded again").await.unwrap();
    assert_eq!(app.state.registry.get_key(file.id).await.unwrap(), None);

    let relaunch = app.state.launcher.prepare(file.id, "alice", true).await.unwrap();
    assert_ne!(relaunch.key, launch.key);
    assert!(app.host.file(file.id).await.unwrap().is_some());
}
