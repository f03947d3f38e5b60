//! Shared backend trait, member declarations, and error type.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use sky_primitives::{ArgumentMap, ServiceValue};

/// Result alias used by service backends.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error type shared by backend implementations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Backend is misconfigured (bad endpoint, missing credential).
    #[error("service not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// A supplied argument was unusable for the invoked operation.
    #[error("invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: String,
        /// Reason the value was rejected.
        reason: String,
    },

    /// The operation name matched no dispatchable member.
    #[error("operation `{operation}` is not dispatchable on this backend")]
    UnknownOperation {
        /// The requested operation name.
        operation: String,
    },

    /// The remote service did not answer within the request timeout.
    #[error("request to {service} timed out after {seconds}s")]
    Timeout {
        /// Service identifier.
        service: String,
        /// Timeout that elapsed, in seconds.
        seconds: u64,
    },

    /// Transport-level failure (connect, TLS, read).
    #[error("transport error talking to {service}: {reason}")]
    Transport {
        /// Service identifier.
        service: String,
        /// Additional context about the error.
        reason: String,
    },

    /// The remote service answered with a non-success HTTP status.
    #[error("{service} returned HTTP {status}: {reason}")]
    Status {
        /// Service identifier.
        service: String,
        /// HTTP status code.
        status: u16,
        /// Response body excerpt or status text.
        reason: String,
    },

    /// The remote response could not be decoded.
    #[error("failed to decode {service} response: {reason}")]
    Decode {
        /// Service identifier.
        service: String,
        /// Additional context about the decode failure.
        reason: String,
    },

    /// The remote service rejected the supplied credential.
    #[error("authentication rejected by {service}: {reason}")]
    Auth {
        /// Service identifier.
        service: String,
        /// Additional context about the rejection.
        reason: String,
    },
}

impl ServiceError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for rejected parameters.
    #[must_use]
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for unknown operations.
    #[must_use]
    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for decode failures.
    #[must_use]
    pub fn decode(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

/// Declared parameter of a backend member.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    name: &'static str,
    type_hint: &'static str,
    default: Option<Value>,
    variadic: bool,
}

impl ParamSpec {
    /// Declares a parameter with no bound default.
    #[must_use]
    pub const fn required(name: &'static str, type_hint: &'static str) -> Self {
        Self {
            name,
            type_hint,
            default: None,
            variadic: false,
        }
    }

    /// Declares a parameter carrying a default value.
    #[must_use]
    pub const fn optional(name: &'static str, type_hint: &'static str, default: Value) -> Self {
        Self {
            name,
            type_hint,
            default: Some(default),
            variadic: false,
        }
    }

    /// Declares a variable-arity keyword marker.
    #[must_use]
    pub const fn variadic() -> Self {
        Self {
            name: "**kwargs",
            type_hint: "mapping",
            default: None,
            variadic: true,
        }
    }

    /// Returns the declared parameter name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the advisory type hint.
    #[must_use]
    pub const fn type_hint(&self) -> &'static str {
        self.type_hint
    }

    /// Returns the bound default, if any.
    #[must_use]
    pub const fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether this is a variable-arity marker.
    #[must_use]
    pub const fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// One declared member of a backend: name, documentation, and parameters.
///
/// The declared table replaces live reflection: discovery filters and
/// enriches these entries into operation descriptors.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberSpec {
    name: &'static str,
    doc: &'static str,
    params: Vec<ParamSpec>,
}

impl MemberSpec {
    /// Declares a member with its documentation text.
    #[must_use]
    pub const fn new(name: &'static str, doc: &'static str) -> Self {
        Self {
            name,
            doc,
            params: Vec::new(),
        }
    }

    /// Appends a parameter declaration (declaration order is positional
    /// order).
    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Returns the member name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the full documentation text.
    #[must_use]
    pub const fn doc(&self) -> &'static str {
        self.doc
    }

    /// Returns the declared parameters in positional order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

/// Trait implemented by every service backend.
///
/// Backends are stateless with respect to individual calls: they hold only
/// immutable configuration and a pooled HTTP client, so a shared instance
/// tolerates concurrent invocation without external locking.
#[async_trait]
pub trait ServiceTarget: Send + Sync {
    /// Short service identifier used in logs and error messages.
    fn service_name(&self) -> &str;

    /// Declares the member table discovery operates on.
    fn members(&self) -> Vec<MemberSpec>;

    /// Invokes a member by operation name with coerced arguments.
    async fn invoke(&self, operation: &str, args: &ArgumentMap) -> ServiceResult<ServiceValue>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn member_declaration_preserves_parameter_order() {
        let member = MemberSpec::new("query_object", "Query one object.")
            .param(ParamSpec::required("object_name", "str"))
            .param(ParamSpec::optional("wildcard", "bool", json!(false)))
            .param(ParamSpec::variadic());

        let names: Vec<_> = member.params().iter().map(ParamSpec::name).collect();
        assert_eq!(names, vec!["object_name", "wildcard", "**kwargs"]);
        assert!(member.params()[2].is_variadic());
        assert_eq!(member.params()[1].default(), Some(&json!(false)));
    }
}
