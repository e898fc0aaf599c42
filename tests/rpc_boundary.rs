//! Catalog procedures: session and input checks happen before the service is reached.

mod common;

use axum::http::{Method, StatusCode};
use camp_api::config::Operation;
use common::{login_as, request, send, spy_app};
use serde_json::{json, Value};

fn invalid_input(op: Operation) -> Value {
    match op {
        Operation::Create => json!(42),
        Operation::List => json!({ "limit": "ten" }),
        Operation::Get | Operation::Delete => json!({ "id": "42" }),
        Operation::Update => json!({ "id": "42", "data": {} }),
    }
}

#[tokio::test]
async fn every_procedure_requires_a_session() {
    let (app, spy, state) = spy_app();
    let procedures: Vec<(String, Operation)> = state
        .catalog
        .procedures()
        .map(|(router, op)| (format!("{}.{}", router.id, op.as_str()), op))
        .collect();
    assert!(procedures.len() > 100);

    for (procedure, op) in &procedures {
        let uri = format!("/api/trpc/{}", procedure);
        let (status, body) = send(&app, request(Method::POST, &uri, Some("alpha"), None, Some(json!({})))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", procedure);
        assert_eq!(body["error"]["code"], "unauthenticated");

        if op.is_query() {
            let (status, _) = send(&app, request(Method::GET, &uri, Some("alpha"), None, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "GET {}", procedure);

            let bad_query = format!("{}?input=1&input=2", uri);
            let (status, body) = send(&app, request(Method::GET, &bad_query, Some("alpha"), None, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "GET {}", bad_query);
            assert_eq!(body["error"]["code"], "unauthenticated");
        }
    }
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn invalid_session_token_is_unauthenticated() {
    let (app, spy, _) = spy_app();
    let (status, _) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.list", None, Some("deadbeef"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn every_procedure_validates_before_the_service() {
    let (app, spy, state) = spy_app();
    let token = login_as(&app, "alpha", "lead@camp.org").await;
    let procedures: Vec<(String, Operation)> = state
        .catalog
        .procedures()
        .map(|(router, op)| (format!("{}.{}", router.id, op.as_str()), op))
        .collect();

    for (procedure, op) in &procedures {
        let uri = format!("/api/trpc/{}", procedure);
        let (status, body) = send(
            &app,
            request(Method::POST, &uri, None, Some(&token), Some(invalid_input(*op))),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", procedure);
        assert_eq!(body["error"]["code"], "validation_error");
    }

    let (status, _) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.create", None, Some(&token), Some(json!({ "name": "Dragon" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.create", None, Some(&token), Some(json!({
            "name": "Dragon", "type": "vehicle", "category": "art car", "color": "red"
        }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn unknown_and_disabled_procedures_are_not_found() {
    let (app, spy, _) = spy_app();
    for uri in ["/api/trpc/nope.list", "/api/trpc/assets.explode", "/api/trpc/applications.create"] {
        let (status, _) = send(&app, request(Method::POST, uri, None, None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn mutations_reject_get() {
    let (app, spy, _) = spy_app();
    let token = login_as(&app, "alpha", "lead@camp.org").await;
    let (status, _) = send(&app, request(Method::GET, "/api/trpc/assets.create", None, Some(&token), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn crud_round_trip_uses_camel_case() {
    let (app, spy, _) = spy_app();
    let token = login_as(&app, "alpha", "lead@camp.org").await;

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.create", None, Some(&token), Some(json!({
            "name": "Dragon", "type": "vehicle", "category": "art car", "serialNumber": "SN-1"
        }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["serialNumber"], "SN-1");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/trpc/assets.get?input={}", json!({ "id": id }));
    let uri = uri.replace('"', "%22").replace('{', "%7B").replace('}', "%7D").replace(':', "%3A");
    let (status, body) = send(&app, request(Method::GET, &uri, None, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Dragon");

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.update", None, Some(&token), Some(json!({
            "id": id, "data": { "status": "retired" }
        }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "retired");

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.list", None, Some(&token), Some(json!({ "filters": { "status": "retired" } }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 1);

    let (status, _) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.delete", None, Some(&token), Some(json!({ "id": id }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spy.calls(), 5);
}

#[tokio::test]
async fn duplicate_unique_field_conflicts() {
    let (app, _, _) = spy_app();
    let token = login_as(&app, "alpha", "lead@camp.org").await;
    let asset = json!({ "name": "Dragon", "type": "vehicle", "category": "art car", "serialNumber": "SN-1" });

    let (status, _) = send(&app, request(Method::POST, "/api/trpc/assets.create", None, Some(&token), Some(asset.clone()))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app, request(Method::POST, "/api/trpc/assets.create", None, Some(&token), Some(asset))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn tenants_are_isolated() {
    let (app, _, _) = spy_app();
    let alpha = login_as(&app, "alpha", "lead@alpha.org").await;
    let beta = login_as(&app, "beta", "lead@beta.org").await;

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.create", None, Some(&alpha), Some(json!({
            "name": "Dragon", "type": "vehicle", "category": "art car"
        }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // The tenant header never overrides the session's tenant.
    let (status, body) = send(&app, request(Method::POST, "/api/trpc/assets.list", Some("alpha"), Some(&beta), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, _) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.get", None, Some(&beta), Some(json!({ "id": id }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, request(Method::POST, "/api/trpc/assets.list", None, Some(&alpha), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 1);
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let (app, _, _) = spy_app();
    let token = login_as(&app, "alpha", "lead@camp.org").await;

    let (status, body) = send(&app, request(Method::GET, "/api/trpc/auth.me", None, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tenantId"], "alpha");

    let (status, _) = send(&app, request(Method::POST, "/api/trpc/auth.logout", None, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, request(Method::GET, "/api/trpc/auth.me", None, Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_unauthenticated() {
    let (app, _, _) = spy_app();
    login_as(&app, "alpha", "lead@camp.org").await;
    let (status, _) = send(
        &app,
        request(Method::POST, "/api/trpc/auth.login", Some("alpha"), None, Some(json!({
            "email": "lead@camp.org", "password": "wrong password"
        }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Same credentials, other tenant.
    let (status, _) = send(
        &app,
        request(Method::POST, "/api/trpc/auth.login", Some("beta"), None, Some(json!({
            "email": "lead@camp.org", "password": "correct horse battery"
        }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_query_string_is_a_validation_error() {
    let (app, spy, _) = spy_app();
    let token = login_as(&app, "alpha", "lead@camp.org").await;
    let (status, body) = send(
        &app,
        request(Method::GET, "/api/trpc/assets.list?input=1&input=2", None, Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn field_errors_are_keyed_by_camel_case_names() {
    let (app, _, _) = spy_app();
    let token = login_as(&app, "alpha", "lead@camp.org").await;
    let (status, body) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.create", None, Some(&token), Some(json!({
            "name": "Dragon", "type": "vehicle", "category": "art car", "serialNumber": 7
        }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "serialNumber");
}

#[tokio::test]
async fn missing_records_are_named_by_router_label() {
    let (app, _, _) = spy_app();
    let token = login_as(&app, "alpha", "lead@camp.org").await;
    let (status, body) = send(
        &app,
        request(Method::POST, "/api/trpc/assets.get", None, Some(&token), Some(json!({
            "id": "00000000-0000-4000-8000-000000000000"
        }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "not found: Assets 00000000-0000-4000-8000-000000000000");
}
