//! # crudgate
//!
//! A generic CRUD mediation engine for building RESTful APIs in Rust.
//!
//! ## Features
//!
//! - **Pluggable resources**: any type implementing [`Resource`](core::Resource) can be served
//! - **Instance-scoped authorization**: every operation asks the candidate instance who may touch it
//! - **Immutable fields**: server-owned fields are re-asserted on every update
//! - **Lifecycle hooks**: optional pre/post interception for each operation
//! - **Capability hiding**: disabled operations look exactly like missing resources
//! - **Configuration-Based**: messages and operation switches via YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crudgate::prelude::*;
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Fish {
//!     id: u64,
//!     color: String,
//!     create_date: DateTime<Utc>,
//! }
//!
//! struct FishProvider { pond: Pond }
//!
//! #[async_trait]
//! impl ResourceProvider for FishProvider {
//!     type Model = Fish;
//!
//!     fn model_factory(&self) -> Fish { Fish::default() }
//!     async fn get_model_by_id(&self, id: u64) -> Result<Option<Fish>> { Ok(self.pond.get(id)) }
//!
//!     fn enable_get(&self) -> bool { true }
//!     fn enable_create(&self) -> bool { true }
//!     fn enable_update(&self) -> bool { true }
//!     fn enable_delete(&self) -> bool { true }
//!
//!     fn schema(&self) -> ResourceSchema<Fish> {
//!         immutable_fields!(Fish => [id, create_date]).mutable("color").build()
//!     }
//! }
//!
//! ServerBuilder::new()
//!     .with_authenticator(authenticate)
//!     .register("fish", FishProvider { pond })?
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        auth::{AuthBinding, Authenticator, Credentials, Identity, NoAuthenticator, SharedIdentity},
        dispatcher::Dispatcher,
        hooks::{CreateHooks, DeleteHooks, GetHooks, HookSet, UpdateHooks},
        outcome::{Outcome, OutcomeBody, OutcomeStatus},
        provider::{Operation, RegisteredProvider, ResourceProvider, decode_onto},
        resource::{Resource, UserResource},
        schema::{CopyImmutableAttributes, FieldKind, ResourceSchema, ResourceSchemaBuilder},
    };

    // === Errors ===
    pub use crate::core::error::{
        ApiMessage, ConfigError, CrudError, CrudResult, DispatchError, FieldValidationError,
        PreservationError, first_validation_error,
    };

    // === Macros ===
    pub use crate::{immutable_fields, impl_identity};

    // === Config ===
    pub use crate::config::{ApiConfig, MessagesConfig};

    // === Server ===
    pub use crate::server::{ResourceEndpoint, ResourceRegistry, ServerBuilder, build_router};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};

    // === Axum ===
    pub use axum::{Router, http::HeaderMap};
}
