//! The execution pipeline.
//!
//! One request flows strictly in order: resolve module, look up operation,
//! validate required arguments, coerce supplied arguments, invoke, classify
//! any invocation error, normalize the result. Failures are returned as
//! data; nothing escapes as a raw error.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{debug, info};

use sky_convert::{CoercionTable, normalize};
use sky_primitives::{
    Argument, ArgumentMap, ExecutionRequest, ExecutionResult, Failure, FailureCode,
    OperationDescriptor,
};
use sky_registry::{OperationRegistry, RegistryError, ResolvedModule, suggestion_for};

use crate::classify;

/// Drives requests through the full pipeline against a shared registry.
pub struct Executor {
    registry: Arc<OperationRegistry>,
    coercions: CoercionTable,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Creates an executor with the built-in coercion rule table.
    #[must_use]
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self {
            registry,
            coercions: CoercionTable::builtin(),
        }
    }

    /// Overrides the coercion rule table.
    #[must_use]
    pub fn with_coercions(mut self, coercions: CoercionTable) -> Self {
        self.coercions = coercions;
        self
    }

    /// Returns the registry this executor resolves against.
    #[must_use]
    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    /// Executes one request.
    pub async fn submit(&self, request: &ExecutionRequest) -> ExecutionResult {
        self.execute(
            &request.module_id,
            &request.operation_name,
            &request.arguments,
        )
        .await
    }

    /// Executes an operation with the supplied raw arguments.
    pub async fn execute(
        &self,
        module_id: &str,
        operation_name: &str,
        arguments: &Map<String, Value>,
    ) -> ExecutionResult {
        debug!(module = module_id, operation = operation_name, "executing");

        let resolved = match self.registry.resolve(module_id).await {
            Ok(resolved) => resolved,
            Err(err) => return ExecutionResult::failure(classify::classify_registry(&err)),
        };
        // From here on, use the registered id rather than the caller's
        // spelling so failures name the canonical module.
        let module_id = resolved.target().service_name().to_owned();

        let Some(operation) = resolved.operation(operation_name) else {
            return ExecutionResult::failure(operation_not_found(
                &resolved,
                &module_id,
                operation_name,
            ));
        };

        if let Some(failure) = validate(&module_id, operation, arguments) {
            return ExecutionResult::failure(failure);
        }

        let args = match self.coerce_all(&module_id, arguments) {
            Ok(args) => args,
            Err(failure) => return ExecutionResult::failure(failure),
        };

        let value = match resolved.target().invoke(operation.name(), &args).await {
            Ok(value) => value,
            Err(err) => {
                return ExecutionResult::failure(classify::classify_service(&module_id, &err));
            }
        };

        match normalize(&value) {
            Ok(payload) => {
                info!(module = %module_id, operation = operation_name, "execution succeeded");
                ExecutionResult::success(payload)
            }
            Err(err) => ExecutionResult::failure(classify::classify_normalize(&module_id, &err)),
        }
    }

    // Every supplied argument is coerced, including ones the descriptor
    // does not declare; unmatched values pass through to the backend.
    fn coerce_all(
        &self,
        module_id: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ArgumentMap, Failure> {
        let mut args = ArgumentMap::new();
        for (name, raw) in arguments {
            let coerced: Argument = self
                .coercions
                .coerce(name, raw)
                .map_err(|err| classify::classify_coercion(module_id, &err))?;
            args.insert(name.clone(), coerced);
        }
        Ok(args)
    }
}

// All missing required parameters are reported in one failure.
fn validate(
    module_id: &str,
    operation: &OperationDescriptor,
    arguments: &Map<String, Value>,
) -> Option<Failure> {
    let missing: Vec<&str> = operation
        .required_parameters()
        .map(sky_primitives::ParameterDescriptor::name)
        .filter(|name| !arguments.contains_key(*name))
        .collect();
    if missing.is_empty() {
        return None;
    }

    let listed = missing.join(", ");
    Some(
        Failure::new(
            FailureCode::ValidationError,
            format!(
                "operation `{}` is missing required argument(s): {listed}",
                operation.name()
            ),
            module_id,
        )
        .with_suggestion(format!("supply: {listed}"))
        .with_detail("missing", json!(missing))
        .with_detail("operation", json!(operation.name())),
    )
}

fn operation_not_found(
    resolved: &ResolvedModule,
    module_id: &str,
    operation_name: &str,
) -> Failure {
    let names = resolved
        .operations()
        .iter()
        .map(OperationDescriptor::name);
    classify::classify_registry(&RegistryError::OperationNotFound {
        module_id: module_id.to_owned(),
        operation: operation_name.to_owned(),
        suggestion: suggestion_for(names, operation_name),
    })
}
