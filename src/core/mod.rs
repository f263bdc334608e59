//! Core module containing the resource contract and the dispatch engine

pub mod auth;
pub mod dispatcher;
pub mod error;
pub mod hooks;
pub mod outcome;
pub mod provider;
pub mod resource;
pub mod schema;

pub use auth::{AuthBinding, Authenticator, Credentials, Identity, NoAuthenticator, SharedIdentity};
pub use dispatcher::Dispatcher;
pub use error::{
    ApiMessage, ConfigError, CrudError, CrudResult, DispatchError, FieldValidationError,
    PreservationError, first_validation_error,
};
pub use hooks::{CreateHooks, DeleteHooks, GetHooks, HookSet, UpdateHooks};
pub use outcome::{Outcome, OutcomeBody, OutcomeStatus};
pub use provider::{Operation, RegisteredProvider, ResourceProvider, decode_onto};
pub use resource::{Resource, UserResource};
pub use schema::{CopyImmutableAttributes, FieldDescriptor, FieldKind, ResourceSchema, ResourceSchemaBuilder};
