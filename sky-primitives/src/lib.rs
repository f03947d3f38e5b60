//! Core shared types for the skyquery operation registry.

#![warn(missing_docs, clippy::pedantic)]

mod descriptor;
mod error;
mod outcome;
mod table;
mod value;

/// Static descriptors for modules, operations, and parameters.
pub use descriptor::{ModuleDescriptor, OperationDescriptor, ParameterDescriptor};
/// Error type and result alias shared across the workspace primitives.
pub use error::{Error, Result};
/// Tagged invocation outcome and the failure taxonomy.
pub use outcome::{ExecutionRequest, ExecutionResult, Failure, FailureCode};
/// Tabular return values produced by service backends.
pub use table::{Cell, ColumnSpec, TableValue};
/// Domain value types flowing through coercion and normalization.
pub use value::{
    AngularQuantity, AngularUnit, Argument, ArgumentMap, ServiceValue, SkyPosition, DEFAULT_FRAME,
};
