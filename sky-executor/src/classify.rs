//! Maps collaborator errors into the stable failure taxonomy.
//!
//! Every error that can surface during execution ends here; nothing leaves
//! the executor boundary unclassified.

use serde_json::json;

use sky_convert::{CoercionError, NormalizeError};
use sky_primitives::{Failure, FailureCode};
use sky_registry::RegistryError;
use sky_services::ServiceError;

/// Classifies a registry lookup or construction error.
#[must_use]
pub fn classify_registry(error: &RegistryError) -> Failure {
    match error {
        RegistryError::ModuleNotFound { id, suggestion } => {
            Failure::new(FailureCode::ModuleNotFound, error.to_string(), id)
                .with_suggestion(suggestion.clone())
        }
        RegistryError::OperationNotFound {
            module_id,
            operation,
            suggestion,
        } => Failure::new(FailureCode::OperationNotFound, error.to_string(), module_id)
            .with_detail("operation", json!(operation))
            .with_suggestion(suggestion.clone()),
        RegistryError::MissingCredential { module_id, env_key } => {
            Failure::new(FailureCode::AuthError, error.to_string(), module_id)
                .with_suggestion(format!("set the `{env_key}` environment variable"))
                .with_detail("env_key", json!(env_key))
        }
        RegistryError::DuplicateModule { id } => {
            Failure::new(FailureCode::LoadError, error.to_string(), id)
        }
        RegistryError::Load { module_id, .. } => {
            Failure::new(FailureCode::LoadError, error.to_string(), module_id)
        }
    }
}

/// Classifies an error raised by a backend invocation.
#[must_use]
pub fn classify_service(module_id: &str, error: &ServiceError) -> Failure {
    match error {
        ServiceError::Configuration { .. } => {
            Failure::new(FailureCode::LoadError, error.to_string(), module_id)
        }
        ServiceError::InvalidParameter { parameter, .. } => {
            Failure::new(FailureCode::ValidationError, error.to_string(), module_id)
                .with_detail("parameter", json!(parameter))
        }
        ServiceError::UnknownOperation { operation } => {
            Failure::new(FailureCode::OperationNotFound, error.to_string(), module_id)
                .with_detail("operation", json!(operation))
        }
        ServiceError::Timeout { seconds, .. } => {
            Failure::new(FailureCode::UpstreamError, error.to_string(), module_id)
                .with_detail("timeout_seconds", json!(seconds))
        }
        ServiceError::Transport { .. } => {
            Failure::new(FailureCode::UpstreamError, error.to_string(), module_id)
        }
        // Remote 4xx is a permanent failure of this request; 5xx may clear.
        ServiceError::Status { status, .. } => {
            Failure::new(FailureCode::UpstreamError, error.to_string(), module_id)
                .with_recoverable(*status >= 500)
                .with_detail("http_status", json!(status))
        }
        ServiceError::Decode { .. } => {
            Failure::new(FailureCode::UpstreamError, error.to_string(), module_id)
                .with_recoverable(false)
        }
        ServiceError::Auth { .. } => {
            Failure::new(FailureCode::AuthError, error.to_string(), module_id)
        }
    }
}

/// Classifies a rejected argument coercion.
#[must_use]
pub fn classify_coercion(module_id: &str, error: &CoercionError) -> Failure {
    Failure::new(FailureCode::InvalidArgument, error.to_string(), module_id)
        .with_detail("parameter", json!(error.parameter()))
        .with_detail("raw_value", error.raw_value().clone())
}

/// Classifies a normalization failure.
#[must_use]
pub fn classify_normalize(module_id: &str, error: &NormalizeError) -> Failure {
    Failure::new(FailureCode::SerializationError, error.to_string(), module_id)
}
