#![allow(clippy::unwrap_used)]
// Tests for the edit request surface: claims, unit iteration, activity
// recording and the HTTP status mapping.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gatecode_core::{
    AccessCodeEditRequest, AccessCodeOrchestrator, AccessCodeState, CodePolicy, Collaborators,
    CommandCenterConfig, CoreError, ErrorKind, HttpCommandCenterFactory, InMemoryAccessCodeStore,
    RentalState, RequestContext, TracingActivityLog, UnitId,
};

use common::{
    Call, Harness, OTHER_UNIT, SITE, UNIT, USER, claims, code, neighbour_code, seeded_directory,
};

fn request(units: &[u64], access_code: &str) -> AccessCodeEditRequest {
    AccessCodeEditRequest {
        user_id: USER.get(),
        unit_ids: units.to_vec(),
        access_code: access_code.into(),
        ..AccessCodeEditRequest::default()
    }
}

#[tokio::test]
async fn test_missing_claims_is_unauthorized() {
    let h = Harness::new();

    let err = h
        .orchestrator
        .edit_access_codes(None, &request(&[UNIT.get()], "445566"), &RequestContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.status_code(), 401);
    assert!(h.nothing_written());
}

#[tokio::test]
async fn test_edit_updates_every_unit_and_records_activity() {
    let h = Harness::with_codes([code("111111", OTHER_UNIT, AccessCodeState::Active)]);
    let claims = claims();

    let report = h
        .orchestrator
        .edit_access_codes(
            Some(&claims),
            &request(&[0, UNIT.get(), OTHER_UNIT.get()], "445566"),
            &RequestContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.user_id, USER);
    assert_eq!(report.updated, vec![UNIT, OTHER_UNIT]);
    assert!(report.unchanged.is_empty());
    assert_eq!(
        h.command_center.calls(),
        vec![
            Call::Set(SITE, vec![UNIT]),
            Call::Revoke(SITE, vec![OTHER_UNIT]),
            Call::Set(SITE, vec![OTHER_UNIT]),
        ]
    );

    let entries = h.activity.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor, claims.user_id);
    assert_eq!(entries[0].target_user, USER);
    assert_eq!(entries[0].site_uuid, "site-uuid-5");
    assert_eq!(entries[0].unit_ids, vec![UNIT, OTHER_UNIT]);
}

#[tokio::test]
async fn test_same_code_twice_is_reported_unchanged() {
    let h = Harness::new();
    let claims = claims();
    let ctx = RequestContext::new();
    let body = request(&[UNIT.get()], "445566");

    h.orchestrator
        .edit_access_codes(Some(&claims), &body, &ctx)
        .await
        .unwrap();
    let report = h
        .orchestrator
        .edit_access_codes(Some(&claims), &body, &ctx)
        .await
        .unwrap();

    assert_eq!(report.unchanged, vec![UNIT]);
    assert_eq!(h.command_center.calls().len(), 1);
    assert_eq!(h.activity.entries().len(), 2);
}

#[tokio::test]
async fn test_first_failing_unit_stops_the_request() {
    let h = Harness::new();
    h.set_rental_state(OTHER_UNIT, RentalState::Gatelock);
    let third = UnitId::new(300);

    let err = h
        .orchestrator
        .edit_access_codes(
            Some(&claims()),
            &request(&[UNIT.get(), OTHER_UNIT.get(), third.get()], "445566"),
            &RequestContext::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::UnitLocked { unit_id, .. } if unit_id == OTHER_UNIT));
    assert_eq!(err.status_code(), 403);
    // The first unit stays updated; nothing after the failure ran.
    assert_eq!(h.command_center.calls(), vec![Call::Set(SITE, vec![UNIT])]);
    assert!(h.activity.entries().is_empty());
}

#[tokio::test]
async fn test_unit_references_are_resolved() {
    let h = Harness::new();
    let body = AccessCodeEditRequest {
        user_uuid: USER.to_string(),
        unit_uuids: vec![UNIT.to_string()],
        access_code: "445566".into(),
        ..AccessCodeEditRequest::default()
    };

    let report = h
        .orchestrator
        .edit_access_codes(Some(&claims()), &body, &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(report.updated, vec![UNIT]);
}

#[tokio::test]
async fn test_bad_reference_is_rejected_before_lookups() {
    let h = Harness::new();
    let body = AccessCodeEditRequest {
        user_uuid: "not-a-number".into(),
        access_code: "445566".into(),
        ..AccessCodeEditRequest::default()
    };

    let err = h
        .orchestrator
        .edit_access_codes(Some(&claims()), &body, &RequestContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.to_string(), "Invalid UUID: not-a-number");
}

#[tokio::test]
async fn test_status_codes_per_failure() {
    let cases: Vec<(AccessCodeEditRequest, u16)> = vec![
        (
            AccessCodeEditRequest {
                user_id: 999,
                ..request(&[UNIT.get()], "445566")
            },
            404,
        ),
        (request(&[UnitId::new(999).get()], "445566"), 404),
        (request(&[UNIT.get()], "44a566"), 400),
        (request(&[UNIT.get()], "777777"), 409),
    ];

    for (body, status) in cases {
        let h = Harness::with_codes([neighbour_code(
            "777777",
            OTHER_UNIT,
            AccessCodeState::Pending,
        )]);
        let err = h
            .orchestrator
            .edit_access_codes(Some(&claims()), &body, &RequestContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), status, "{err}");
        assert!(h.activity.entries().is_empty());
    }
}

#[tokio::test]
async fn test_activity_failure_after_updates_is_internal() {
    let h = Harness::new();
    *h.activity.fail.lock().unwrap() = true;

    let err = h
        .orchestrator
        .edit_access_codes(
            Some(&claims()),
            &request(&[UNIT.get()], "445566"),
            &RequestContext::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ActivityRecordFailed { .. }));
    assert_eq!(err.status_code(), 500);
    assert_eq!(h.command_center.calls(), vec![Call::Set(SITE, vec![UNIT])]);
}

// ── HTTP command center ─────────────────────────────────────────────

#[tokio::test]
async fn test_edit_drives_http_command_center() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sites/5/access-codes/revoke"))
        .and(body_json(json!({ "unitIds": [100], "options": [] })))
        .and(header("X-API-KEY", "cc-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "ok" },
            "data": [{ "unitId": 100, "status": "revoked" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sites/5/access-codes/set"))
        .and(body_json(json!({ "unitIds": [100], "options": [] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "ok" },
            "data": [{ "unitId": 100, "status": "queued" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = CommandCenterConfig::new(Url::parse(&server.uri()).unwrap());
    config.api_key = Some("cc-key".to_owned().into());

    let store = Arc::new(InMemoryAccessCodeStore::from_codes([code(
        "111111",
        UNIT,
        AccessCodeState::Active,
    )]));
    let orchestrator = AccessCodeOrchestrator::new(
        Collaborators {
            directory: Arc::new(seeded_directory()),
            store: store.clone(),
            command_centers: Arc::new(HttpCommandCenterFactory::new(&config).unwrap()),
            activity: Arc::new(TracingActivityLog),
        },
        CodePolicy::default(),
    );

    orchestrator
        .edit_access_codes(
            Some(&claims()),
            &request(&[UNIT.get()], "445566"),
            &RequestContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        store.snapshot(),
        vec![
            code("111111", UNIT, AccessCodeState::Remove),
            code("445566", UNIT, AccessCodeState::Setup),
        ]
    );
}

#[tokio::test]
async fn test_http_error_envelope_surfaces_as_set_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sites/5/access-codes/set"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "error", "msg": "unit offline" }
        })))
        .mount(&server)
        .await;

    let config = CommandCenterConfig::new(Url::parse(&server.uri()).unwrap());
    let orchestrator = AccessCodeOrchestrator::new(
        Collaborators {
            directory: Arc::new(seeded_directory()),
            store: Arc::new(InMemoryAccessCodeStore::new()),
            command_centers: Arc::new(HttpCommandCenterFactory::new(&config).unwrap()),
            activity: Arc::new(TracingActivityLog),
        },
        CodePolicy::default(),
    );

    let err = orchestrator
        .update_unit_access_code(UNIT, USER, SITE, "445566", &RequestContext::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::SetFailed { .. }));
    // Collaborator detail stays out of the caller-facing message.
    assert!(!err.to_string().contains("unit offline"));
    assert_eq!(orchestrator.journal().len(), 1);
}
