//! Property-based tests for the lock state left behind by status reports
//!
//! Random sequences of reports without result URLs are applied to one file.
//! No content is ever written, so only the lock and forcesave bookkeeping
//! is exercised.

use docbridge::backend::callback::{TrackBody, TrackRequest};
use docbridge::backend::host::MemoryHost;
use docbridge::backend::server::{AppState, HostServices};
use docbridge::shared::{ServiceConfig, TrackClaims, TrackStatus};
use proptest::prelude::*;

use crate::common::test_pool;

fn status_code() -> impl Strategy<Value = i64> {
    prop::sample::select(vec![1i64, 2, 3, 4, 6, 7])
}

fn request(code: i64) -> TrackRequest {
    let body = TrackBody {
        status: Some(code),
        ..TrackBody::default()
    };
    TrackRequest::from_body(body, None).unwrap()
}

/// Apply `codes` in order, returning `(locked, forcesave)` afterwards
fn apply(codes: &[i64]) -> (bool, bool) {
    tokio_test::block_on(async {
        let config = ServiceConfig::builder()
            .instance_id("docbridge")
            .host_secret("secret")
            .storage_url("http://cloud.test")
            .engine_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let host = MemoryHost::new();
        let file = host.add_file("alice", "doc.docx", "v1");
        let state = AppState::new(config, test_pool().await, HostServices::from_memory(&host)).unwrap();
        let claims = TrackClaims {
            file_id: file.id,
            user_id: None,
            share_token: None,
            file_path: None,
        };

        for code in codes {
            state.coordinator.track(&claims, request(*code)).await;
        }

        (
            state.registry.is_locked(file.id).await.unwrap(),
            state.registry.was_forcesave(file.id).await.unwrap(),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_lock_follows_last_status(codes in prop::collection::vec(status_code(), 1..12)) {
        let (locked, _) = apply(&codes);
        let last = TrackStatus::try_from(*codes.last().unwrap()).unwrap();
        prop_assert_eq!(locked, last.leaves_locked());
    }

    #[test]
    fn test_forcesave_mark_follows_last_save(codes in prop::collection::vec(status_code(), 1..12)) {
        let (_, forcesave) = apply(&codes);
        let expected = codes
            .iter()
            .map(|code| TrackStatus::try_from(*code).unwrap())
            .filter(|status| status.triggers_save())
            .last()
            .map(TrackStatus::is_forcesave)
            .unwrap_or(false);
        prop_assert_eq!(forcesave, expected);
    }
}
