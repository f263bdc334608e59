//! Declarative helpers for resource types

pub mod macros;
