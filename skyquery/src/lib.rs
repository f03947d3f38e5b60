//! Dynamic operation registry and execution pipeline for astronomical
//! services.
//!
//! Depend on this crate via `cargo add skyquery`. It bundles the internal
//! workspace crates behind feature flags so downstream users can enable only
//! the layers they need.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use skyquery::primitives::ExecutionRequest;
//! use skyquery::registry::{EnvCredentials, builtin_registry};
//! use skyquery::executor::Executor;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = builtin_registry(Arc::new(EnvCredentials))?;
//! let executor = Executor::new(Arc::new(registry));
//!
//! let mut arguments = serde_json::Map::new();
//! arguments.insert("object_name".into(), "M 31".into());
//! let request = ExecutionRequest::new("simbad", "query_object", arguments);
//! let result = executor.submit(&request).await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use sky_primitives as primitives;

/// Argument coercion and result normalization (enabled by `convert`).
#[cfg(feature = "convert")]
pub use sky_convert as convert;

/// Service backends: SIMBAD, VizieR, NED, HEASARC, IRSA, ADS (enabled by
/// `services`).
#[cfg(feature = "services")]
pub use sky_services as services;

/// Module registry and operation discovery (enabled by `registry`).
#[cfg(feature = "registry")]
pub use sky_registry as registry;

/// Execution pipeline and error classification (enabled by `executor`).
#[cfg(feature = "executor")]
pub use sky_executor as executor;
