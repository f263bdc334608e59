//! Per-type provider binding and its registration-time resolution

use crate::config::{ApiConfig, MessagesConfig};
use crate::core::auth::SharedIdentity;
use crate::core::dispatcher::Dispatcher;
use crate::core::error::{ConfigError, CrudResult};
use crate::core::hooks::HookSet;
use crate::core::resource::Resource;
use crate::core::schema::ResourceSchema;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::map::Entry;
use std::fmt;
use std::sync::Arc;

/// The four dispatchable operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Get,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binding between one resource type and its store.
///
/// Supplies a factory for empty instances, a lookup by identifier and four
/// independent enable flags. A disabled operation is not exposed at all,
/// regardless of authorization.
///
/// Optional capabilities (`schema`, `hooks`) are queried exactly once, when
/// the provider is registered.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl ResourceProvider for FishProvider {
///     type Model = Fish;
///
///     fn model_factory(&self) -> Fish { Fish::default() }
///
///     async fn get_model_by_id(&self, id: u64) -> anyhow::Result<Option<Fish>> {
///         Ok(self.pond.get(id))
///     }
///
///     fn enable_get(&self) -> bool { true }
///     fn enable_create(&self) -> bool { true }
///     fn enable_update(&self) -> bool { true }
///     fn enable_delete(&self) -> bool { false }
///
///     fn schema(&self) -> ResourceSchema<Fish> {
///         immutable_fields!(Fish => [id, create_date]).build()
///     }
/// }
/// ```
#[async_trait]
pub trait ResourceProvider: Send + Sync + 'static {
    type Model: Resource;

    /// A zero-value instance for the Create path
    fn model_factory(&self) -> Self::Model;

    /// Look up an existing instance; `Ok(None)` when absent
    async fn get_model_by_id(&self, id: u64) -> Result<Option<Self::Model>>;

    fn enable_get(&self) -> bool;

    fn enable_create(&self) -> bool;

    fn enable_update(&self) -> bool;

    fn enable_delete(&self) -> bool;

    /// Field descriptors used to preserve immutable fields on update
    fn schema(&self) -> ResourceSchema<Self::Model> {
        ResourceSchema::empty()
    }

    /// Optional lifecycle hooks
    fn hooks(&self) -> HookSet<Self::Model> {
        HookSet::none()
    }

    /// Build an instance from a submitted JSON body.
    ///
    /// Override to attach state that is not serialized, such as a store handle.
    fn decode(&self, body: Value) -> Result<Self::Model, serde_json::Error> {
        decode_onto(self.model_factory(), body)
    }
}

/// Overlay a JSON object on top of `base`.
///
/// Keys missing from `body` keep the value they have in `base`, at every
/// depth: nested objects are merged key by key. A non-object body replaces
/// `base` wholesale and must decode on its own.
pub fn decode_onto<M: Resource>(base: M, body: Value) -> Result<M, serde_json::Error> {
    let mut merged = serde_json::to_value(base)?;
    merge_json(&mut merged, body);
    serde_json::from_value(merged)
}

fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(fields)) => {
            for (key, value) in fields {
                match target.entry(key) {
                    Entry::Occupied(mut slot) => merge_json(slot.get_mut(), value),
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// A provider resolved at registration: schema built, hooks resolved,
/// configuration applied. Read-only afterwards and shared by all requests.
pub struct RegisteredProvider<P: ResourceProvider> {
    token: String,
    provider: Arc<P>,
    schema: ResourceSchema<P::Model>,
    hooks: HookSet<P::Model>,
    disabled: Vec<Operation>,
    messages: Arc<MessagesConfig>,
}

impl<P: ResourceProvider> fmt::Debug for RegisteredProvider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("token", &self.token)
            .field("resource", &P::Model::resource_name())
            .field("schema", &self.schema)
            .field("hooks", &self.hooks.installed())
            .field("disabled", &self.disabled)
            .finish()
    }
}

impl<P: ResourceProvider> RegisteredProvider<P> {
    /// Resolve `provider` for `token`.
    ///
    /// Fails on an empty token, a token containing `/`, or a malformed schema.
    pub fn new(token: impl Into<String>, provider: P, config: &ApiConfig) -> CrudResult<Self> {
        let token = token.into();
        if token.trim().is_empty() || token.contains('/') {
            return Err(ConfigError::InvalidToken { token }.into());
        }

        let schema = provider.schema();
        schema.check(P::Model::resource_name())?;
        let hooks = provider.hooks();
        let disabled = config.disabled_operations(&token);

        tracing::info!(
            token = %token,
            resource = P::Model::resource_name(),
            immutable = ?schema.immutable_fields(),
            hooks = ?hooks.installed(),
            "registered resource provider"
        );

        Ok(Self {
            token,
            provider: Arc::new(provider),
            schema,
            hooks,
            disabled,
            messages: Arc::new(config.messages.clone()),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn schema(&self) -> &ResourceSchema<P::Model> {
        &self.schema
    }

    pub fn hooks(&self) -> &HookSet<P::Model> {
        &self.hooks
    }

    pub fn messages(&self) -> &MessagesConfig {
        &self.messages
    }

    /// Exposed only when the provider enables it and configuration does not disable it
    pub fn is_enabled(&self, operation: Operation) -> bool {
        let flag = match operation {
            Operation::Get => self.provider.enable_get(),
            Operation::Create => self.provider.enable_create(),
            Operation::Update => self.provider.enable_update(),
            Operation::Delete => self.provider.enable_delete(),
        };
        flag && !self.disabled.contains(&operation)
    }

    /// A dispatcher bound to `identity` for one request
    pub fn dispatcher(&self, identity: Option<SharedIdentity>) -> Dispatcher<'_, P> {
        Dispatcher::new(self, identity)
    }
}
