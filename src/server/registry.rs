//! Resource registry mapping resource tokens to type-erased endpoints

use crate::config::ApiConfig;
use crate::core::auth::SharedIdentity;
use crate::core::error::{ConfigError, CrudResult};
use crate::core::outcome::Outcome;
use crate::core::provider::{Operation, RegisteredProvider, ResourceProvider};
use crate::core::resource::Resource;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One registered resource type behind a JSON boundary.
///
/// Bodies arrive as JSON values and outcomes leave as `Outcome<Value>`, so
/// the router can hold every resource type in one map.
#[async_trait]
pub trait ResourceEndpoint: Send + Sync {
    /// Token the type was registered under (e.g. "fish")
    fn token(&self) -> &str;

    /// Type name used in messages (e.g. "Fish")
    fn resource_name(&self) -> &'static str;

    async fn get(&self, id: u64, identity: Option<SharedIdentity>) -> Outcome<Value>;

    async fn create(&self, body: Option<Value>, identity: Option<SharedIdentity>) -> Outcome<Value>;

    async fn update(
        &self,
        path_id: Option<u64>,
        body: Option<Value>,
        identity: Option<SharedIdentity>,
    ) -> Outcome<Value>;

    async fn delete(&self, id: u64, identity: Option<SharedIdentity>) -> Outcome<Value>;

    /// Dispatch by operation. Get and Delete need an id; Update uses it
    /// when present.
    async fn dispatch(
        &self,
        operation: Operation,
        id: Option<u64>,
        body: Option<Value>,
        identity: Option<SharedIdentity>,
    ) -> Outcome<Value> {
        match (operation, id) {
            (Operation::Get, Some(id)) => self.get(id, identity).await,
            (Operation::Delete, Some(id)) => self.delete(id, identity).await,
            (Operation::Get | Operation::Delete, None) => {
                Outcome::bad_request(format!("{} ID is required", self.resource_name()))
            }
            (Operation::Create, _) => self.create(body, identity).await,
            (Operation::Update, id) => self.update(id, body, identity).await,
        }
    }
}

impl<P: ResourceProvider> RegisteredProvider<P> {
    fn decode_body(&self, body: Option<Value>) -> Option<P::Model> {
        let body = body?;
        match self.provider().decode(body) {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::debug!(
                    resource = P::Model::resource_name(),
                    error = %e,
                    "request body does not decode"
                );
                None
            }
        }
    }

    fn erase(&self, outcome: Outcome<P::Model>) -> Outcome<Value> {
        outcome.into_json().unwrap_or_else(|e| {
            tracing::error!(
                resource = P::Model::resource_name(),
                error = %e,
                "failed to serialize outcome"
            );
            Outcome::server_error(self.messages().internal_error.clone())
        })
    }
}

#[async_trait]
impl<P: ResourceProvider> ResourceEndpoint for RegisteredProvider<P> {
    fn token(&self) -> &str {
        RegisteredProvider::token(self)
    }

    fn resource_name(&self) -> &'static str {
        P::Model::resource_name()
    }

    async fn get(&self, id: u64, identity: Option<SharedIdentity>) -> Outcome<Value> {
        let outcome = self.dispatcher(identity).get(id).await;
        self.erase(outcome)
    }

    async fn create(&self, body: Option<Value>, identity: Option<SharedIdentity>) -> Outcome<Value> {
        let incoming = self.decode_body(body);
        let outcome = self.dispatcher(identity).create(incoming).await;
        self.erase(outcome)
    }

    async fn update(
        &self,
        path_id: Option<u64>,
        body: Option<Value>,
        identity: Option<SharedIdentity>,
    ) -> Outcome<Value> {
        let incoming = self.decode_body(body);
        let outcome = self.dispatcher(identity).update(path_id, incoming).await;
        self.erase(outcome)
    }

    async fn delete(&self, id: u64, identity: Option<SharedIdentity>) -> Outcome<Value> {
        let outcome = self.dispatcher(identity).delete(id).await;
        self.erase(outcome)
    }
}

/// Registry for all resource types in the application
///
/// Built once during startup, then shared read-only by every request.
pub struct ResourceRegistry {
    endpoints: HashMap<String, Arc<dyn ResourceEndpoint>>,
    config: Arc<ApiConfig>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new(ApiConfig::default())
    }
}

impl ResourceRegistry {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            endpoints: HashMap::new(),
            config: Arc::new(config),
        }
    }

    /// Register a provider under `token`
    ///
    /// A token can be registered once; a second registration is an error.
    pub fn register<P: ResourceProvider>(
        &mut self,
        token: impl Into<String>,
        provider: P,
    ) -> CrudResult<()> {
        let token = token.into();
        if self.endpoints.contains_key(&token) {
            return Err(ConfigError::DuplicateResource { token }.into());
        }

        let registered = RegisteredProvider::new(token.clone(), provider, &self.config)?;
        self.endpoints.insert(token, Arc::new(registered));
        Ok(())
    }

    pub fn endpoint(&self, token: &str) -> Option<Arc<dyn ResourceEndpoint>> {
        self.endpoints.get(token).cloned()
    }

    /// Get all registered tokens, sorted
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.endpoints.keys().map(|s| s.as_str()).collect();
        tokens.sort_unstable();
        tokens
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
