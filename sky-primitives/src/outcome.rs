//! Tagged execution outcomes and the failure taxonomy.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable failure codes returned at the executor boundary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    /// Unknown module id.
    ModuleNotFound,
    /// Unknown operation in a known module.
    OperationNotFound,
    /// Missing required argument(s).
    ValidationError,
    /// Coercion rejected a supplied value.
    InvalidArgument,
    /// Required credential missing or invalid.
    AuthError,
    /// The underlying call raised (network, remote 4xx/5xx, timeout).
    UpstreamError,
    /// The normalizer could not represent the result.
    SerializationError,
    /// The target backend could not be loaded at discovery time.
    LoadError,
}

impl FailureCode {
    /// Canonical wire spelling of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModuleNotFound => "MODULE_NOT_FOUND",
            Self::OperationNotFound => "OPERATION_NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::AuthError => "AUTH_ERROR",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::LoadError => "LOAD_ERROR",
        }
    }

    /// Default recoverability for the code. Only upstream failures are
    /// retryable by default; the classifier may refine this per error.
    #[must_use]
    pub const fn default_recoverable(self) -> bool {
        matches!(self, Self::UpstreamError)
    }
}

impl Display for FailureCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully classified execution failure, returned as data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    code: FailureCode,
    message: String,
    module_id: String,
    recoverable: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    suggestion: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    details: Map<String, Value>,
}

impl Failure {
    /// Creates a failure with the code's default recoverability.
    #[must_use]
    pub fn new(code: FailureCode, message: impl Into<String>, module_id: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            module_id: module_id.into(),
            recoverable: code.default_recoverable(),
            suggestion: String::new(),
            details: Map::new(),
        }
    }

    /// Attaches an actionable suggestion for the caller.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    /// Overrides the recoverability flag.
    #[must_use]
    pub const fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Adds a machine-readable detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// Returns the failure code.
    #[must_use]
    pub const fn code(&self) -> FailureCode {
        self.code
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the owning module id.
    #[must_use]
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// Whether a retry may succeed.
    #[must_use]
    pub const fn recoverable(&self) -> bool {
        self.recoverable
    }

    /// Returns the suggestion text (may be empty).
    #[must_use]
    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    /// Returns the machine-readable details.
    #[must_use]
    pub const fn details(&self) -> &Map<String, Value> {
        &self.details
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.module_id, self.message)
    }
}

/// One invocation request: module, operation, and loosely-typed arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Short module id (e.g. `simbad`).
    pub module_id: String,
    /// Operation name within the module (e.g. `query_object`).
    pub operation_name: String,
    /// Raw argument mapping supplied by the caller.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ExecutionRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        module_id: impl Into<String>,
        operation_name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            module_id: module_id.into(),
            operation_name: operation_name.into(),
            arguments,
        }
    }
}

/// The outcome of one execution: exactly one of success or failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// The operation completed and its result was normalized.
    Success {
        /// JSON-safe normalized payload.
        payload: Value,
    },
    /// The operation failed; the failure is fully classified.
    Failure(Failure),
}

impl ExecutionResult {
    /// Wraps a normalized payload.
    #[must_use]
    pub const fn success(payload: Value) -> Self {
        Self::Success { payload }
    }

    /// Wraps a classified failure.
    #[must_use]
    pub const fn failure(failure: Failure) -> Self {
        Self::Failure(failure)
    }

    /// Whether this is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the failure, if this is one.
    #[must_use]
    pub const fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Success { .. } => None,
        }
    }

    /// Returns the payload, if this is a success.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload } => Some(payload),
            Self::Failure(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_codes_serialize_screaming() {
        let json = serde_json::to_value(FailureCode::ModuleNotFound).unwrap();
        assert_eq!(json, json!("MODULE_NOT_FOUND"));
        assert_eq!(FailureCode::UpstreamError.to_string(), "UPSTREAM_ERROR");
    }

    #[test]
    fn only_upstream_is_recoverable_by_default() {
        assert!(FailureCode::UpstreamError.default_recoverable());
        assert!(!FailureCode::ValidationError.default_recoverable());
        assert!(!FailureCode::AuthError.default_recoverable());
    }

    #[test]
    fn result_is_exactly_one_variant() {
        let ok = ExecutionResult::success(json!({"rows": 3}));
        assert!(ok.is_success());
        assert!(ok.as_failure().is_none());

        let failure = Failure::new(FailureCode::ValidationError, "missing", "simbad")
            .with_suggestion("provide object_name")
            .with_detail("missing", json!(["object_name"]));
        let err = ExecutionResult::failure(failure);
        assert!(!err.is_success());
        assert_eq!(
            err.as_failure().unwrap().code(),
            FailureCode::ValidationError
        );
    }

    #[test]
    fn result_round_trips_through_json() {
        let failure = Failure::new(FailureCode::UpstreamError, "timeout", "vizier");
        let result = ExecutionResult::failure(failure);
        let encoded = serde_json::to_string(&result).unwrap();
        assert!(encoded.contains("\"status\":\"failure\""));
        assert!(encoded.contains("UPSTREAM_ERROR"));

        let decoded: ExecutionResult = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, result);
    }
}
