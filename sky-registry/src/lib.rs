//! Module registry and operation discovery for skyquery.
//!
//! The registry maps short module ids (`simbad`, `vizier`, ...) to service
//! backends, constructs each backend lazily exactly once, and exposes the
//! operations it discovers from the backend's declared member table.

#![warn(missing_docs, clippy::pedantic)]

pub mod auth;
pub mod builtin;
pub mod discover;
pub mod registry;
pub mod suggest;

pub use auth::{CredentialProvider, EnvCredentials};
pub use builtin::builtin_registry;
pub use discover::{discover_operations, parse_parameter_docs};
pub use registry::{
    ModuleFactory, OperationRegistry, RegistryError, RegistryResult, ResolvedModule,
};
pub use suggest::{closest_match, suggestion_for};
