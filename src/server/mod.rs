//! Server module for serving registered resources over HTTP
//!
//! - [`ResourceRegistry`]: token to type-erased endpoint map, immutable after startup
//! - [`build_router`]: the axum binding
//! - [`ServerBuilder`]: fluent setup plus graceful `serve`

pub mod builder;
pub mod registry;
pub mod rest;

pub use builder::ServerBuilder;
pub use registry::{ResourceEndpoint, ResourceRegistry};
pub use rest::{RestState, build_router};
