//! Authentication for crudgate
//!
//! Provides:
//! - [`Identity`]: what an authenticated caller must expose
//! - [`Credentials`]: credentials extracted from a request (HTTP Basic)
//! - [`Authenticator`]: the host-supplied function mapping credentials to an identity
//! - [`AuthBinding`]: the per-request result of authentication, bound to a dispatcher
//!
//! An unauthenticated request is represented by an absent identity
//! (`None`), never by a placeholder user.

use crate::core::dispatcher::Dispatcher;
use crate::core::provider::{RegisteredProvider, ResourceProvider};
use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::sync::Arc;

/// An authenticated caller.
///
/// Kept object safe so it can be bound to a request as `Arc<dyn Identity>`.
/// A user type that is also served as a resource implements both traits and
/// gets [`UserResource`](crate::core::resource::UserResource) for free.
pub trait Identity: Send + Sync + 'static {
    /// Identifier of the caller, comparable with `Resource::unique_id`
    fn identity_id(&self) -> u64;

    /// Whether the caller holds elevated privileges
    fn has_admin_privileges(&self) -> bool;
}

impl fmt::Debug for dyn Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.identity_id())
            .field("admin", &self.has_admin_privileges())
            .finish()
    }
}

/// Shared handle to an authenticated caller
pub type SharedIdentity = Arc<dyn Identity>;

/// Credentials presented by a request
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP Basic authentication
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Credentials::Basic { username, .. } => username,
        }
    }

    /// Extract credentials from an `Authorization: Basic ...` header.
    ///
    /// Missing, non-Basic or malformed headers yield `None`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self::basic(username, password))
    }

    /// Encode as an `Authorization` header value
    pub fn to_header_value(&self) -> String {
        match self {
            Credentials::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
            }
        }
    }
}

/// Host-supplied authentication function, installed once at startup and
/// invoked at most once per request.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve credentials to an identity; `None` if they are not accepted
    async fn authenticate(&self, credentials: &Credentials) -> Option<SharedIdentity>;
}

#[async_trait]
impl<F> Authenticator for F
where
    F: Fn(&Credentials) -> Option<SharedIdentity> + Send + Sync,
{
    async fn authenticate(&self, credentials: &Credentials) -> Option<SharedIdentity> {
        self(credentials)
    }
}

/// Authenticator that accepts nobody (every request is anonymous)
pub struct NoAuthenticator;

#[async_trait]
impl Authenticator for NoAuthenticator {
    async fn authenticate(&self, _credentials: &Credentials) -> Option<SharedIdentity> {
        None
    }
}

/// Identity resolved for one request.
///
/// Built once per request and consumed by the dispatcher for that request
/// only; nothing here outlives the request.
#[derive(Debug, Clone, Default)]
pub struct AuthBinding {
    identity: Option<SharedIdentity>,
}

impl AuthBinding {
    /// Extract credentials from the headers and run the authenticator on them
    pub async fn resolve(authenticator: &dyn Authenticator, headers: &HeaderMap) -> Self {
        let identity = match Credentials::from_headers(headers) {
            Some(credentials) => {
                let identity = authenticator.authenticate(&credentials).await;
                if identity.is_none() {
                    tracing::debug!(username = credentials.username(), "credentials rejected");
                }
                identity
            }
            None => None,
        };
        Self { identity }
    }

    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: SharedIdentity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn identity(&self) -> Option<&dyn Identity> {
        self.identity.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn into_identity(self) -> Option<SharedIdentity> {
        self.identity
    }

    /// Bind this identity and a provider into a dispatcher for this request
    pub fn dispatcher<'a, P: ResourceProvider>(
        &self,
        registration: &'a RegisteredProvider<P>,
    ) -> Dispatcher<'a, P> {
        Dispatcher::new(registration, self.identity.clone())
    }
}
