//! Descriptors for modules, operations, and parameters.
//!
//! The descriptor set is the stable contract surface of the registry:
//! module ids, operation names, and parameter names must not change shape
//! without a compatibility note.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

const MAX_MODULE_ID_LEN: usize = 48;

/// Maps a short module id to the backend that serves it.
///
/// The descriptor set is fixed at startup; one descriptor exists per
/// supported service and is immutable after registration.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    id: String,
    target_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_env: Option<String>,
}

impl ModuleDescriptor {
    /// Creates a descriptor after validating the module identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidModuleId`] if the id is empty, too long, or
    /// contains characters outside lowercase alphanumerics and underscore.
    pub fn new(id: impl Into<String>, target_path: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_module_id(&id)?;
        Ok(Self {
            id,
            target_path: target_path.into(),
            token_env: None,
        })
    }

    /// Declares the environment variable holding this module's credential.
    #[must_use]
    pub fn with_token_env(mut self, env_var: impl Into<String>) -> Self {
        self.token_env = Some(env_var.into());
        self
    }

    /// Returns the short module identifier (e.g. `simbad`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the fully-qualified location of the backend implementation.
    #[must_use]
    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// Returns the credential environment variable, if the module needs one.
    #[must_use]
    pub fn token_env(&self) -> Option<&str> {
        self.token_env.as_deref()
    }
}

fn validate_module_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidModuleId {
            id: String::new(),
            reason: "identifier cannot be empty".into(),
        });
    }

    if id.len() > MAX_MODULE_ID_LEN {
        return Err(Error::InvalidModuleId {
            id: id.into(),
            reason: format!("identifier length must be <= {MAX_MODULE_ID_LEN}"),
        });
    }

    if !id
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
    {
        return Err(Error::InvalidModuleId {
            id: id.into(),
            reason: "identifier must contain lowercase alphanumerics or underscore".into(),
        });
    }

    Ok(())
}

/// Describes a single parameter of a discovered operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    name: String,
    /// Advisory type hint; never enforced.
    type_hint: String,
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    position: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
}

impl ParameterDescriptor {
    /// Creates a descriptor for a parameter with no bound default.
    #[must_use]
    pub fn required(name: impl Into<String>, type_hint: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            type_hint: type_hint.into(),
            required: true,
            default: None,
            position,
            description: String::new(),
        }
    }

    /// Creates a descriptor for a parameter carrying a default value.
    #[must_use]
    pub fn optional(
        name: impl Into<String>,
        type_hint: impl Into<String>,
        default: Value,
        position: usize,
    ) -> Self {
        Self {
            name: name.into(),
            type_hint: type_hint.into(),
            required: false,
            default: Some(default),
            position,
            description: String::new(),
        }
    }

    /// Attaches a best-effort description extracted from documentation.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the advisory type hint (may be empty).
    #[must_use]
    pub fn type_hint(&self) -> &str {
        &self.type_hint
    }

    /// Whether the underlying callable binds no default for this parameter.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the bound default value, if any.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the positional index in the underlying signature.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the doc-derived description (empty when parsing failed).
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Describes one callable operation discovered on a module's backend.
///
/// Built once per module on first access; thereafter immutable and shared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    name: String,
    owner_module: String,
    parameters: Vec<ParameterDescriptor>,
    summary: String,
}

impl OperationDescriptor {
    /// Creates a descriptor for the named operation.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        owner_module: impl Into<String>,
        parameters: Vec<ParameterDescriptor>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            owner_module: owner_module.into(),
            parameters,
            summary: summary.into(),
        }
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the id of the module that owns this operation.
    #[must_use]
    pub fn owner_module(&self) -> &str {
        &self.owner_module
    }

    /// Returns the ordered parameter descriptors.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Returns the one-line summary extracted from documentation.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Looks up a parameter descriptor by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    /// Iterates over parameters with no bound default.
    pub fn required_parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| p.is_required())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn module_id_rejects_uppercase() {
        let err = ModuleDescriptor::new("SIMBAD", "sky_services::simbad").expect_err("uppercase");
        assert!(matches!(err, Error::InvalidModuleId { .. }));
    }

    #[test]
    fn module_descriptor_carries_token_env() {
        let descriptor = ModuleDescriptor::new("ads", "sky_services::ads::AdsService")
            .expect("valid id")
            .with_token_env("ADS_TOKEN");
        assert_eq!(descriptor.token_env(), Some("ADS_TOKEN"));
    }

    #[test]
    fn required_parameters_are_those_without_defaults() {
        let operation = OperationDescriptor::new(
            "query_object",
            "simbad",
            vec![
                ParameterDescriptor::required("object_name", "str", 0),
                ParameterDescriptor::optional("wildcard", "bool", json!(false), 1),
            ],
            "Query a single object.",
        );

        let required: Vec<_> = operation.required_parameters().map(|p| p.name()).collect();
        assert_eq!(required, vec!["object_name"]);
        assert!(!operation.parameter("wildcard").unwrap().is_required());
    }
}
