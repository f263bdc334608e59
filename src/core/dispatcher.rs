//! Generic resource dispatcher
//!
//! Runs one Get/Create/Update/Delete end to end for a single request:
//! enable check, pre-hook, lookup, preservation (update only), authorization,
//! mutation, post-hook, outcome.
//!
//! A dispatcher is built per request from a [`RegisteredProvider`] and the
//! identity resolved for that request. It holds nothing else, so concurrent
//! requests never observe each other's identity.
//!
//! Every path ends in an [`Outcome`]. Nothing is retried, and all enable and
//! authorization checks complete before any mutating call begins.

use crate::core::auth::{Identity, SharedIdentity};
use crate::core::error::DispatchError;
use crate::core::outcome::Outcome;
use crate::core::provider::{Operation, RegisteredProvider, ResourceProvider};
use crate::core::resource::Resource;

type Model<P> = <P as ResourceProvider>::Model;

pub struct Dispatcher<'a, P: ResourceProvider> {
    registration: &'a RegisteredProvider<P>,
    identity: Option<SharedIdentity>,
}

impl<'a, P: ResourceProvider> Dispatcher<'a, P> {
    pub fn new(registration: &'a RegisteredProvider<P>, identity: Option<SharedIdentity>) -> Self {
        Self {
            registration,
            identity,
        }
    }

    /// The caller bound to this dispatcher, `None` when unauthenticated
    pub fn identity(&self) -> Option<&dyn Identity> {
        self.identity.as_deref()
    }

    fn resource_name() -> &'static str {
        Model::<P>::resource_name()
    }

    fn fail(&self, err: DispatchError) -> Outcome<Model<P>> {
        match &err {
            DispatchError::Internal { message } => {
                tracing::error!(
                    resource = Self::resource_name(),
                    error = %message,
                    "internal error while dispatching"
                );
            }
            other => {
                tracing::debug!(
                    resource = Self::resource_name(),
                    reason = %other,
                    "request refused"
                );
            }
        }
        Outcome::message(err.status(), err.client_message(self.registration.messages()))
    }

    fn check_enabled(&self, operation: Operation) -> Result<(), Outcome<Model<P>>> {
        if self.registration.is_enabled(operation) {
            return Ok(());
        }
        Err(self.fail(DispatchError::Disabled {
            resource: Self::resource_name(),
            operation: operation.as_str(),
        }))
    }

    async fn lookup(&self, id: u64) -> Result<Option<Model<P>>, DispatchError> {
        self.registration
            .provider()
            .get_model_by_id(id)
            .await
            .map_err(|e| DispatchError::Internal {
                message: format!("lookup of {} {} failed: {:#}", Self::resource_name(), id, e),
            })
    }

    fn short_circuited(operation: Operation, outcome: Outcome<Model<P>>) -> Outcome<Model<P>> {
        tracing::debug!(
            resource = Self::resource_name(),
            operation = %operation,
            status = ?outcome.status(),
            "pre-hook short-circuited"
        );
        outcome
    }

    /// Fetch one instance by id
    pub async fn get(&self, id: u64) -> Outcome<Model<P>> {
        if let Err(outcome) = self.check_enabled(Operation::Get) {
            return outcome;
        }

        let user = self.identity();
        let hooks = self.registration.hooks().get.as_deref();

        if let Some(hooks) = hooks
            && let Some(outcome) = hooks.pre_get(id, user).await
        {
            return Self::short_circuited(Operation::Get, outcome);
        }

        let resource = match self.lookup(id).await {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                return self.fail(DispatchError::NotFound {
                    resource: Self::resource_name(),
                    id,
                });
            }
            Err(e) => return self.fail(e),
        };

        if !resource.can_be_viewed_by(user) {
            return self.fail(DispatchError::Unauthorized {
                message: format!(
                    "Unauthorized to view {} with ID {}",
                    Self::resource_name(),
                    id
                ),
            });
        }

        if let Some(hooks) = hooks
            && let Some(outcome) = hooks.post_get(&resource, user).await
        {
            return outcome;
        }

        Outcome::success(resource)
    }

    /// Persist a new instance decoded from the request body.
    ///
    /// `None` means the body could not be decoded.
    pub async fn create(&self, incoming: Option<Model<P>>) -> Outcome<Model<P>> {
        if let Err(outcome) = self.check_enabled(Operation::Create) {
            return outcome;
        }

        let Some(mut resource) = incoming else {
            return self.fail(DispatchError::MalformedBody);
        };

        let user = self.identity();
        let hooks = self.registration.hooks().create.as_deref();

        if let Some(hooks) = hooks
            && let Some(outcome) = hooks.pre_create(&resource, user).await
        {
            return Self::short_circuited(Operation::Create, outcome);
        }

        if !resource.can_be_created_by(user) {
            return self.fail(DispatchError::Unauthorized {
                message: format!("Not authorized to create this {}", Self::resource_name()),
            });
        }

        let error = resource.save().await.err();

        if let Some(hooks) = hooks
            && let Some(outcome) = hooks.post_create(&resource, user, error.as_ref()).await
        {
            return outcome;
        }

        match error {
            Some(e) => self.fail(DispatchError::BadRequest {
                message: e.to_string(),
            }),
            None => Outcome::success(resource),
        }
    }

    /// Replace an existing instance with one decoded from the request body.
    ///
    /// The record is located by the body's id. When the route also carries
    /// an id (`path_id`), the two must agree. Immutable fields of the stored
    /// record are copied onto the incoming one before anything else sees it.
    pub async fn update(&self, path_id: Option<u64>, incoming: Option<Model<P>>) -> Outcome<Model<P>> {
        if let Err(outcome) = self.check_enabled(Operation::Update) {
            return outcome;
        }

        let Some(mut incoming) = incoming else {
            return self.fail(DispatchError::MalformedBody);
        };

        let id = incoming.unique_id();
        if let Some(path_id) = path_id
            && path_id != id
        {
            return self.fail(DispatchError::BadRequest {
                message: format!(
                    "ID in path ({}) does not match ID in body ({})",
                    path_id, id
                ),
            });
        }

        let existing = match self.lookup(id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => {
                return self.fail(DispatchError::BadRequest {
                    message: format!("{} with ID {} does not exist", Self::resource_name(), id),
                });
            }
            Err(e) => return self.fail(e),
        };

        if let Err(e) = self
            .registration
            .schema()
            .copy_immutable(&existing, &mut incoming)
        {
            return self.fail(DispatchError::Internal {
                message: format!(
                    "preserving immutable fields of {} {}: {}",
                    Self::resource_name(),
                    id,
                    e
                ),
            });
        }

        let user = self.identity();
        let hooks = self.registration.hooks().update.as_deref();

        if let Some(hooks) = hooks
            && let Some(outcome) = hooks.pre_update(&incoming, &existing, user).await
        {
            return Self::short_circuited(Operation::Update, outcome);
        }

        if !incoming.can_be_modified_by(user) {
            return self.fail(DispatchError::Unauthorized {
                message: format!("Not authorized to modify this {}", Self::resource_name()),
            });
        }

        let error = incoming.save().await.err();

        if let Some(hooks) = hooks
            && let Some(outcome) = hooks
                .post_update(&incoming, &existing, user, error.as_ref())
                .await
        {
            return outcome;
        }

        match error {
            Some(e) => self.fail(DispatchError::BadRequest {
                message: e.to_string(),
            }),
            None => Outcome::success(incoming),
        }
    }

    /// Remove an instance. A successful delete answers with the configured
    /// confirmation message, not the removed record.
    pub async fn delete(&self, id: u64) -> Outcome<Model<P>> {
        if let Err(outcome) = self.check_enabled(Operation::Delete) {
            return outcome;
        }

        let resource = match self.lookup(id).await {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                return self.fail(DispatchError::NotFound {
                    resource: Self::resource_name(),
                    id,
                });
            }
            Err(e) => return self.fail(e),
        };

        let user = self.identity();
        let hooks = self.registration.hooks().delete.as_deref();

        if let Some(hooks) = hooks
            && let Some(outcome) = hooks.pre_delete(&resource, user).await
        {
            return Self::short_circuited(Operation::Delete, outcome);
        }

        if !resource.can_be_deleted_by(user) {
            return self.fail(DispatchError::Unauthorized {
                message: format!("Not authorized to delete this {}", Self::resource_name()),
            });
        }

        let error = resource.delete().await.err();

        if let Some(hooks) = hooks
            && let Some(outcome) = hooks.post_delete(&resource, user, error.as_ref()).await
        {
            return outcome;
        }

        match error {
            Some(e) => self.fail(DispatchError::BadRequest {
                message: e.to_string(),
            }),
            None => Outcome::ok_message(self.registration.messages().deleted.clone()),
        }
    }
}
