//! Shared error definitions for skyquery primitives.

use thiserror::Error;

/// Result alias used throughout the primitives crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// Module identifier failed validation.
    #[error("invalid module id `{id}`: {reason}")]
    InvalidModuleId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// An angular unit string could not be recognized.
    #[error("unknown angular unit `{unit}`")]
    UnknownUnit {
        /// The unit string that failed to parse.
        unit: String,
    },
}
