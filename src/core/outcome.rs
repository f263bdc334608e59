//! Structured result of one dispatched operation

use crate::core::error::ApiMessage;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

/// Status classification of an [`Outcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    NotFound,
    Unauthorized,
    BadRequest,
    ServerError,
}

impl OutcomeStatus {
    /// Wire status code the transport writes for this classification
    pub fn status_code(&self) -> StatusCode {
        match self {
            OutcomeStatus::Success => StatusCode::OK,
            OutcomeStatus::NotFound => StatusCode::NOT_FOUND,
            OutcomeStatus::Unauthorized => StatusCode::UNAUTHORIZED,
            OutcomeStatus::BadRequest => StatusCode::BAD_REQUEST,
            OutcomeStatus::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success)
    }
}

/// Payload of an [`Outcome`]
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeBody<M> {
    /// A resource instance
    Resource(M),
    /// A bare message, written out as an [`ApiMessage`]
    Message(String),
}

/// Result of one Get/Create/Update/Delete, built fresh per request and
/// handed to the transport.
///
/// Hooks construct outcomes too, to short-circuit or override a result:
///
/// ```rust,ignore
/// async fn pre_delete(&self, fish: &Fish, _: Option<&dyn Identity>) -> Option<Outcome<Fish>> {
///     fish.is_immortal
///         .then(|| Outcome::unauthorized("Foolish mortal, you cannot kill an immortal fish."))
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<M> {
    status: OutcomeStatus,
    body: OutcomeBody<M>,
}

impl<M> Outcome<M> {
    /// Success carrying a resource instance
    pub fn success(resource: M) -> Self {
        Self {
            status: OutcomeStatus::Success,
            body: OutcomeBody::Resource(resource),
        }
    }

    /// Any classification carrying a message
    pub fn message(status: OutcomeStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            body: OutcomeBody::Message(message.into()),
        }
    }

    pub fn ok_message(message: impl Into<String>) -> Self {
        Self::message(OutcomeStatus::Success, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::message(OutcomeStatus::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::message(OutcomeStatus::Unauthorized, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::message(OutcomeStatus::BadRequest, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::message(OutcomeStatus::ServerError, message)
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn body(&self) -> &OutcomeBody<M> {
        &self.body
    }

    pub fn into_body(self) -> OutcomeBody<M> {
        self.body
    }

    /// The resource payload, if this outcome carries one
    pub fn resource(&self) -> Option<&M> {
        match &self.body {
            OutcomeBody::Resource(m) => Some(m),
            OutcomeBody::Message(_) => None,
        }
    }

    pub fn into_resource(self) -> Option<M> {
        match self.body {
            OutcomeBody::Resource(m) => Some(m),
            OutcomeBody::Message(_) => None,
        }
    }

    /// The message payload, if this outcome carries one
    pub fn message_text(&self) -> Option<&str> {
        match &self.body {
            OutcomeBody::Message(msg) => Some(msg),
            OutcomeBody::Resource(_) => None,
        }
    }

    /// The standard error payload for message outcomes
    pub fn api_message(&self) -> Option<ApiMessage> {
        self.message_text()
            .map(|msg| ApiMessage::new(self.status.status_code(), msg))
    }

    /// Transform the resource payload, keeping the classification
    pub fn map<N>(self, f: impl FnOnce(M) -> N) -> Outcome<N> {
        let body = match self.body {
            OutcomeBody::Resource(m) => OutcomeBody::Resource(f(m)),
            OutcomeBody::Message(msg) => OutcomeBody::Message(msg),
        };
        Outcome {
            status: self.status,
            body,
        }
    }
}

impl<M: Serialize> Outcome<M> {
    /// Serialize the resource payload into JSON
    pub fn into_json(self) -> Result<Outcome<Value>, serde_json::Error> {
        let body = match self.body {
            OutcomeBody::Resource(m) => OutcomeBody::Resource(serde_json::to_value(m)?),
            OutcomeBody::Message(msg) => OutcomeBody::Message(msg),
        };
        Ok(Outcome {
            status: self.status,
            body,
        })
    }
}

impl<M: Serialize> IntoResponse for Outcome<M> {
    fn into_response(self) -> Response {
        let status = self.status.status_code();
        match self.body {
            OutcomeBody::Resource(m) => (status, Json(m)).into_response(),
            OutcomeBody::Message(msg) => (status, Json(ApiMessage::new(status, msg))).into_response(),
        }
    }
}
