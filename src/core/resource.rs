//! The resource contract every served type satisfies

use crate::core::auth::Identity;
use crate::core::error::FieldValidationError;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A unit of data managed by one CRUD endpoint.
///
/// Authorization is instance-scoped: every predicate is evaluated on the
/// candidate instance itself, so a type can express rules like "can modify
/// its own record, or any record if admin". An absent identity (`None`) is
/// an unauthenticated caller and should be treated as the most restrictive
/// case.
///
/// Persistence is opaque: `save` and `delete` talk to whatever store the
/// host uses. `save` may assign the identifier of a new instance.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl Resource for User {
///     fn resource_name() -> &'static str { "User" }
///     fn unique_id(&self) -> u64 { self.id }
///
///     fn can_be_viewed_by(&self, _: Option<&dyn Identity>) -> bool { true }
///     fn can_be_created_by(&self, user: Option<&dyn Identity>) -> bool { self.can_be_modified_by(user) }
///     fn can_be_modified_by(&self, user: Option<&dyn Identity>) -> bool {
///         user.is_some_and(|u| u.has_admin_privileges() || u.identity_id() == self.id)
///     }
///     fn can_be_deleted_by(&self, user: Option<&dyn Identity>) -> bool { self.can_be_modified_by(user) }
///
///     fn validate(&self) -> Vec<FieldValidationError> { vec![] }
///     async fn save(&mut self) -> anyhow::Result<()> { USERS.put(self) }
///     async fn delete(&self) -> anyhow::Result<()> { USERS.remove(self.id) }
/// }
/// ```
#[async_trait]
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Type name used in client-facing messages (e.g. "Fish")
    fn resource_name() -> &'static str;

    /// Identifier, unique within the type. Never changed by an update.
    fn unique_id(&self) -> u64;

    fn can_be_viewed_by(&self, user: Option<&dyn Identity>) -> bool;

    fn can_be_created_by(&self, user: Option<&dyn Identity>) -> bool;

    fn can_be_modified_by(&self, user: Option<&dyn Identity>) -> bool;

    fn can_be_deleted_by(&self, user: Option<&dyn Identity>) -> bool;

    /// Field-level validation errors; empty when valid
    fn validate(&self) -> Vec<FieldValidationError>;

    /// Persist this instance. Errors surface to the client as bad requests.
    async fn save(&mut self) -> Result<()>;

    /// Remove this instance from the store
    async fn delete(&self) -> Result<()>;
}

/// A resource that can also act as the caller of a request.
///
/// User types implement both [`Resource`] and [`Identity`], so the same
/// record that authenticates a request can itself be served, and its
/// `identity_id` is its `unique_id`. Implemented automatically for every
/// such type.
pub trait UserResource: Resource + Identity {
    /// This user as the identity bound to a request
    fn as_identity(&self) -> &dyn Identity;
}

impl<T: Resource + Identity> UserResource for T {
    fn as_identity(&self) -> &dyn Identity {
        self
    }
}
