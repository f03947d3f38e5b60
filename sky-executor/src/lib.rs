//! Execution pipeline for skyquery.
//!
//! Takes an [`ExecutionRequest`](sky_primitives::ExecutionRequest), runs it
//! through validation, coercion, backend invocation, and normalization
//! against a shared [`OperationRegistry`](sky_registry::OperationRegistry),
//! and always returns a classified
//! [`ExecutionResult`](sky_primitives::ExecutionResult).

#![warn(missing_docs, clippy::pedantic)]

pub mod classify;
pub mod executor;

pub use classify::{classify_coercion, classify_normalize, classify_registry, classify_service};
pub use executor::Executor;
