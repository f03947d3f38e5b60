//! Loosely-typed argument coercion and JSON-safe result normalization.
//!
//! Both halves are pure and data-driven: the coercion table never touches a
//! service backend, and the normalizer never performs I/O, so each is
//! independently testable.

#![warn(missing_docs, clippy::pedantic)]

mod coerce;
mod normalize;

/// Ordered first-match-wins coercion rules.
pub use coerce::{CoercionError, CoercionRule, CoercionTable};
/// Recursive normalization of backend values into JSON-safe structures.
pub use normalize::{normalize, NormalizeError};
