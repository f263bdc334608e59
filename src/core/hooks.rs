//! Optional per-operation lifecycle hooks
//!
//! A provider may supply hooks for any subset of the four operations. Each
//! hook returns `Option<Outcome<M>>`:
//!
//! - `None` lets the default flow continue (or keeps the default result for
//!   post-hooks)
//! - `Some(outcome)` short-circuits a pre-hook or overrides the result of a
//!   post-hook
//!
//! Every method has a `None` default, so an implementation only writes the
//! hooks it cares about. Post-hooks receive the persistence error, if any.
//!
//! # Example
//!
//! ```rust,ignore
//! struct ImmortalFish;
//!
//! #[async_trait]
//! impl DeleteHooks<Fish> for ImmortalFish {
//!     async fn pre_delete(&self, fish: &Fish, _: Option<&dyn Identity>) -> Option<Outcome<Fish>> {
//!         fish.is_immortal
//!             .then(|| Outcome::unauthorized("Foolish mortal, you cannot kill an immortal fish."))
//!     }
//! }
//!
//! let hooks = HookSet::none().on_delete(ImmortalFish);
//! ```

use crate::core::auth::Identity;
use crate::core::outcome::Outcome;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait GetHooks<M: Send + Sync + 'static>: Send + Sync {
    /// Runs before the lookup
    async fn pre_get(&self, _id: u64, _user: Option<&dyn Identity>) -> Option<Outcome<M>> {
        None
    }

    /// Runs once the record is found and viewable
    async fn post_get(&self, _resource: &M, _user: Option<&dyn Identity>) -> Option<Outcome<M>> {
        None
    }
}

#[async_trait]
pub trait CreateHooks<M: Send + Sync + 'static>: Send + Sync {
    /// Runs on the decoded body, before the authorization check
    async fn pre_create(&self, _resource: &M, _user: Option<&dyn Identity>) -> Option<Outcome<M>> {
        None
    }

    /// Runs after `save`, whether it succeeded or not
    async fn post_create(
        &self,
        _resource: &M,
        _user: Option<&dyn Identity>,
        _error: Option<&anyhow::Error>,
    ) -> Option<Outcome<M>> {
        None
    }
}

#[async_trait]
pub trait UpdateHooks<M: Send + Sync + 'static>: Send + Sync {
    /// Runs after immutable fields have been preserved onto `incoming`
    async fn pre_update(
        &self,
        _incoming: &M,
        _existing: &M,
        _user: Option<&dyn Identity>,
    ) -> Option<Outcome<M>> {
        None
    }

    /// Runs after `save`, whether it succeeded or not
    async fn post_update(
        &self,
        _incoming: &M,
        _existing: &M,
        _user: Option<&dyn Identity>,
        _error: Option<&anyhow::Error>,
    ) -> Option<Outcome<M>> {
        None
    }
}

#[async_trait]
pub trait DeleteHooks<M: Send + Sync + 'static>: Send + Sync {
    /// Runs on the stored record, before the authorization check
    async fn pre_delete(&self, _resource: &M, _user: Option<&dyn Identity>) -> Option<Outcome<M>> {
        None
    }

    /// Runs after `delete`, whether it succeeded or not
    async fn post_delete(
        &self,
        _resource: &M,
        _user: Option<&dyn Identity>,
        _error: Option<&anyhow::Error>,
    ) -> Option<Outcome<M>> {
        None
    }
}

/// Hook implementations for one resource type, resolved once at registration.
///
/// Absent entries are never called.
pub struct HookSet<M: Send + Sync + 'static> {
    pub get: Option<Arc<dyn GetHooks<M>>>,
    pub create: Option<Arc<dyn CreateHooks<M>>>,
    pub update: Option<Arc<dyn UpdateHooks<M>>>,
    pub delete: Option<Arc<dyn DeleteHooks<M>>>,
}

impl<M: Send + Sync + 'static> Clone for HookSet<M> {
    fn clone(&self) -> Self {
        Self {
            get: self.get.clone(),
            create: self.create.clone(),
            update: self.update.clone(),
            delete: self.delete.clone(),
        }
    }
}

impl<M: Send + Sync + 'static> Default for HookSet<M> {
    fn default() -> Self {
        Self::none()
    }
}

impl<M: Send + Sync + 'static> HookSet<M> {
    pub fn none() -> Self {
        Self {
            get: None,
            create: None,
            update: None,
            delete: None,
        }
    }

    pub fn on_get(mut self, hooks: impl GetHooks<M> + 'static) -> Self {
        self.get = Some(Arc::new(hooks));
        self
    }

    pub fn on_create(mut self, hooks: impl CreateHooks<M> + 'static) -> Self {
        self.create = Some(Arc::new(hooks));
        self
    }

    pub fn on_update(mut self, hooks: impl UpdateHooks<M> + 'static) -> Self {
        self.update = Some(Arc::new(hooks));
        self
    }

    pub fn on_delete(mut self, hooks: impl DeleteHooks<M> + 'static) -> Self {
        self.delete = Some(Arc::new(hooks));
        self
    }

    /// Names of the operations that have hooks installed
    pub fn installed(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.get.is_some() {
            names.push("get");
        }
        if self.create.is_some() {
            names.push("create");
        }
        if self.update.is_some() {
            names.push("update");
        }
        if self.delete.is_some() {
            names.push("delete");
        }
        names
    }
}
