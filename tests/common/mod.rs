//! Shared helpers: in-memory app state, a spy entity service, request builders.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use camp_api::config::ResolvedRouter;
use camp_api::service::{EntityService, ListQuery, MemoryEntityService, Scope};
use camp_api::{app, parse_catalog, resolve, AppError, AppState, Settings, SiteConfig, BUILTIN_CATALOG};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Counts every call, then delegates to the in-memory service.
#[derive(Default)]
pub struct SpyEntityService {
    inner: MemoryEntityService,
    calls: AtomicUsize,
}

impl SpyEntityService {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntityService for SpyEntityService {
    async fn create(&self, scope: &Scope, router: &ResolvedRouter, input: Map<String, Value>) -> Result<Value, AppError> {
        self.record();
        self.inner.create(scope, router, input).await
    }

    async fn create_unless(
        &self,
        scope: &Scope,
        router: &ResolvedRouter,
        existing: &Map<String, Value>,
        input: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        self.record();
        self.inner.create_unless(scope, router, existing, input).await
    }

    async fn list(&self, scope: &Scope, router: &ResolvedRouter, query: &ListQuery) -> Result<Vec<Value>, AppError> {
        self.record();
        self.inner.list(scope, router, query).await
    }

    async fn get(&self, scope: &Scope, router: &ResolvedRouter, id: Uuid) -> Result<Value, AppError> {
        self.record();
        self.inner.get(scope, router, id).await
    }

    async fn update(
        &self,
        scope: &Scope,
        router: &ResolvedRouter,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Value, AppError> {
        self.record();
        self.inner.update(scope, router, id, patch).await
    }

    async fn delete(&self, scope: &Scope, router: &ResolvedRouter, id: Uuid) -> Result<Value, AppError> {
        self.record();
        self.inner.delete(scope, router, id).await
    }
}

pub fn test_state() -> AppState {
    let catalog = resolve(&parse_catalog(BUILTIN_CATALOG).unwrap()).unwrap();
    AppState::in_memory(Settings::default(), catalog, SiteConfig::default()).unwrap()
}

/// App over in-memory stores with a spy in front of the entity service.
pub fn spy_app() -> (Router, Arc<SpyEntityService>, AppState) {
    let spy = Arc::new(SpyEntityService::default());
    let state = test_state().with_entities(spy.clone());
    (app(state.clone()), spy, state)
}

pub fn request(method: Method, uri: &str, tenant: Option<&str>, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(tenant) = tenant {
        builder = builder.header("X-Tenant-ID", tenant);
    }
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

/// Sends one request; empty bodies come back as null.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers and logs in a member of `tenant`; returns the bearer token.
pub async fn login_as(app: &Router, tenant: &str, email: &str) -> String {
    let (status, _) = send(
        app,
        request(
            Method::POST,
            "/api/trpc/auth.register",
            Some(tenant),
            None,
            Some(json!({ "email": email, "password": "correct horse battery", "name": "Member" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/trpc/auth.login",
            Some(tenant),
            None,
            Some(json!({ "email": email, "password": "correct horse battery" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}
