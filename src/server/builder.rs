//! ServerBuilder for fluent API to build HTTP servers

use super::registry::ResourceRegistry;
use super::rest::build_router;
use crate::config::ApiConfig;
use crate::core::auth::{Authenticator, NoAuthenticator};
use crate::core::error::CrudResult;
use crate::core::provider::ResourceProvider;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for creating HTTP servers over registered resources
///
/// Configuration is fixed when the builder is created; every provider
/// registered afterwards is resolved against it.
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::from_config(ApiConfig::from_yaml_file("api.yaml")?)
///     .with_authenticator(authenticate)
///     .register("fish", FishProvider::new(pond))?
///     .register("users", UserProvider::new(users))?
///     .build();
/// ```
pub struct ServerBuilder {
    registry: ResourceRegistry,
    authenticator: Arc<dyn Authenticator>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with the default configuration
    pub fn new() -> Self {
        Self::from_config(ApiConfig::default())
    }

    pub fn from_config(config: ApiConfig) -> Self {
        Self {
            registry: ResourceRegistry::new(config),
            authenticator: Arc::new(NoAuthenticator),
            custom_routes: Vec::new(),
        }
    }

    /// Set the function that maps request credentials to an identity.
    ///
    /// Without one, every request is anonymous.
    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Arc::new(authenticator);
        self
    }

    /// Add routes that sit beside the resource routes (login, health checks...)
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Register a provider under `token`, served at `/{token}`
    pub fn register<P: ResourceProvider>(
        mut self,
        token: impl Into<String>,
        provider: P,
    ) -> CrudResult<Self> {
        self.registry.register(token, provider)?;
        Ok(self)
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Build the final router
    pub fn build(self) -> Router {
        if self.registry.is_empty() {
            tracing::warn!("building a server with no registered resources");
        }

        let mut app = build_router(Arc::new(self.registry), self.authenticator);
        for routes in self.custom_routes {
            app = app.merge(routes);
        }
        app
    }

    /// Serve the application with graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .register("fish", provider)?
    ///     .serve("127.0.0.1:3000").await?;
    /// ```
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
