//! HTTP binding for registered resources
//!
//! Routes:
//! - `GET /{resource}/{id}`
//! - `POST /{resource}`
//! - `PUT /{resource}` (id taken from the body)
//! - `PUT /{resource}/{id}` (path and body ids must agree)
//! - `DELETE /{resource}/{id}`
//!
//! Every non-success answer is an [`ApiMessage`](crate::core::ApiMessage)
//! JSON body, including unknown resources and unmatched routes. A known
//! path hit with the wrong method answers like an unmatched route (404).

use crate::core::auth::{AuthBinding, Authenticator, SharedIdentity};
use crate::core::outcome::Outcome;
use crate::server::registry::{ResourceEndpoint, ResourceRegistry};
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Shared, read-only state of the HTTP binding
#[derive(Clone)]
pub struct RestState {
    pub registry: Arc<ResourceRegistry>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl RestState {
    fn endpoint(&self, token: &str) -> Result<Arc<dyn ResourceEndpoint>, Response> {
        self.registry
            .endpoint(token)
            .ok_or_else(|| self.not_found())
    }

    fn not_found(&self) -> Response {
        Outcome::<Value>::not_found(self.registry.config().messages.not_found.clone())
            .into_response()
    }

    async fn identify(&self, headers: &HeaderMap) -> Option<SharedIdentity> {
        AuthBinding::resolve(self.authenticator.as_ref(), headers)
            .await
            .into_identity()
    }
}

fn parse_id(raw: &str) -> Result<u64, Response> {
    raw.parse::<u64>().map_err(|_| {
        Outcome::<Value>::bad_request(format!("Invalid resource ID: '{}'", raw)).into_response()
    })
}

/// Empty or non-JSON bodies decode to `None`
fn parse_body(body: &Bytes) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

/// Build the router serving every resource in `registry`
pub fn build_router(registry: Arc<ResourceRegistry>, authenticator: Arc<dyn Authenticator>) -> Router {
    let internal_error = registry.config().messages.internal_error.clone();
    let state = RestState {
        registry,
        authenticator,
    };

    Router::new()
        .route("/{resource}", post(create_resource).put(update_resource))
        .route(
            "/{resource}/{id}",
            get(get_resource)
                .put(update_resource_at)
                .delete(delete_resource),
        )
        .fallback(fallback)
        .method_not_allowed_fallback(fallback)
        .with_state(state)
        .layer(CatchPanicLayer::custom(
            move |_panic: Box<dyn Any + Send + 'static>| {
                tracing::error!("request handler panicked");
                Outcome::<Value>::server_error(internal_error.clone()).into_response()
            },
        ))
        .layer(TraceLayer::new_for_http())
}

async fn get_resource(
    State(state): State<RestState>,
    Path((token, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let endpoint = match state.endpoint(&token) {
        Ok(endpoint) => endpoint,
        Err(response) => return response,
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let identity = state.identify(&headers).await;
    endpoint.get(id, identity).await.into_response()
}

async fn create_resource(
    State(state): State<RestState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let endpoint = match state.endpoint(&token) {
        Ok(endpoint) => endpoint,
        Err(response) => return response,
    };

    let identity = state.identify(&headers).await;
    endpoint
        .create(parse_body(&body), identity)
        .await
        .into_response()
}

async fn update_resource(
    State(state): State<RestState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let endpoint = match state.endpoint(&token) {
        Ok(endpoint) => endpoint,
        Err(response) => return response,
    };

    let identity = state.identify(&headers).await;
    endpoint
        .update(None, parse_body(&body), identity)
        .await
        .into_response()
}

async fn update_resource_at(
    State(state): State<RestState>,
    Path((token, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let endpoint = match state.endpoint(&token) {
        Ok(endpoint) => endpoint,
        Err(response) => return response,
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let identity = state.identify(&headers).await;
    endpoint
        .update(Some(id), parse_body(&body), identity)
        .await
        .into_response()
}

async fn delete_resource(
    State(state): State<RestState>,
    Path((token, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let endpoint = match state.endpoint(&token) {
        Ok(endpoint) => endpoint,
        Err(response) => return response,
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let identity = state.identify(&headers).await;
    endpoint.delete(id, identity).await.into_response()
}

async fn fallback(State(state): State<RestState>) -> Response {
    state.not_found()
}
