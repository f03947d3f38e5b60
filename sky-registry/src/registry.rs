//! The operation registry: module table, lazy construction, and lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

use sky_primitives::{ModuleDescriptor, OperationDescriptor};
use sky_services::{ServiceResult, ServiceTarget};

use crate::auth::CredentialProvider;
use crate::discover::discover_operations;
use crate::suggest::suggestion_for;

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Constructs a backend instance, given the module's credential when the
/// descriptor declares one.
pub type ModuleFactory =
    Box<dyn Fn(Option<&str>) -> ServiceResult<Arc<dyn ServiceTarget>> + Send + Sync>;

/// Errors produced by registration and lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Requested module id matched no registration.
    #[error("module `{id}` is not registered")]
    ModuleNotFound {
        /// The requested id.
        id: String,
        /// Nearest registered id, or the full id list when nothing is
        /// close; never empty.
        suggestion: String,
    },

    /// Module id collided with an existing registration.
    #[error("module `{id}` is already registered")]
    DuplicateModule {
        /// The colliding id.
        id: String,
    },

    /// Requested operation matched nothing the module exposes.
    #[error("module `{module_id}` has no operation `{operation}`")]
    OperationNotFound {
        /// Owning module id.
        module_id: String,
        /// The requested operation name.
        operation: String,
        /// Nearest discovered operation, or the full operation list when
        /// nothing is close; never empty.
        suggestion: String,
    },

    /// The module requires a credential the provider could not supply.
    #[error("module `{module_id}` requires a credential in `{env_key}`")]
    MissingCredential {
        /// Owning module id.
        module_id: String,
        /// Environment variable the descriptor names.
        env_key: String,
    },

    /// Backend construction failed.
    #[error("failed to load module `{module_id}`: {reason}")]
    Load {
        /// Owning module id.
        module_id: String,
        /// Construction failure detail.
        reason: String,
    },
}

/// A constructed module: shared backend plus its discovered operations.
///
/// Built at most once per registered module; shared across every subsequent
/// lookup.
pub struct ResolvedModule {
    target: Arc<dyn ServiceTarget>,
    operations: Vec<OperationDescriptor>,
}

impl fmt::Debug for ResolvedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedModule")
            .field("service", &self.target.service_name())
            .field("operations", &self.operations.len())
            .finish()
    }
}

impl ResolvedModule {
    /// Returns the shared backend instance.
    #[must_use]
    pub fn target(&self) -> &Arc<dyn ServiceTarget> {
        &self.target
    }

    /// Returns the discovered operations, sorted by name.
    #[must_use]
    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    /// Looks up one discovered operation by name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.name() == name)
    }
}

struct ModuleEntry {
    descriptor: ModuleDescriptor,
    factory: ModuleFactory,
    cell: OnceCell<Arc<ResolvedModule>>,
}

/// Registry mapping module ids to lazily constructed backends.
pub struct OperationRegistry {
    modules: BTreeMap<String, ModuleEntry>,
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<_> = self.modules.keys().collect();
        f.debug_struct("OperationRegistry")
            .field("modules", &ids)
            .finish_non_exhaustive()
    }
}

impl OperationRegistry {
    /// Creates an empty registry using the supplied credential provider.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            modules: BTreeMap::new(),
            credentials,
        }
    }

    /// Registers a module descriptor with its backend factory.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateModule`] if the id is already
    /// present.
    pub fn register(
        &mut self,
        descriptor: ModuleDescriptor,
        factory: ModuleFactory,
    ) -> RegistryResult<()> {
        let id = descriptor.id().to_owned();
        if self.modules.contains_key(&id) {
            return Err(RegistryError::DuplicateModule { id });
        }
        self.modules.insert(
            id,
            ModuleEntry {
                descriptor,
                factory,
                cell: OnceCell::new(),
            },
        );
        Ok(())
    }

    /// Returns the registered module descriptors in id order.
    #[must_use]
    pub fn list_modules(&self) -> Vec<&ModuleDescriptor> {
        self.modules.values().map(|entry| &entry.descriptor).collect()
    }

    /// Looks up a module descriptor without constructing the backend.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ModuleNotFound`] with a nearest-id
    /// suggestion when the id is unknown.
    pub fn descriptor(&self, module_id: &str) -> RegistryResult<&ModuleDescriptor> {
        self.entry(module_id).map(|entry| &entry.descriptor)
    }

    /// Resolves a module, constructing its backend on first access.
    ///
    /// Concurrent first accesses are serialized per module; exactly one
    /// construction runs and every caller shares its result. Lookup is
    /// exact first, then case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ModuleNotFound`],
    /// [`RegistryError::MissingCredential`], or [`RegistryError::Load`].
    pub async fn resolve(&self, module_id: &str) -> RegistryResult<Arc<ResolvedModule>> {
        let entry = self.entry(module_id)?;
        let resolved = entry
            .cell
            .get_or_try_init(|| self.construct(entry))
            .await?;
        Ok(Arc::clone(resolved))
    }

    /// Lists the operations a module exposes, constructing it if needed.
    ///
    /// # Errors
    ///
    /// Propagates the same errors as [`Self::resolve`].
    pub async fn list_operations(
        &self,
        module_id: &str,
    ) -> RegistryResult<Vec<OperationDescriptor>> {
        let resolved = self.resolve(module_id).await?;
        Ok(resolved.operations().to_vec())
    }

    /// Returns the descriptor of a single operation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::OperationNotFound`] with a nearest-name
    /// suggestion when the module exposes no such operation.
    pub async fn describe_operation(
        &self,
        module_id: &str,
        operation: &str,
    ) -> RegistryResult<OperationDescriptor> {
        let resolved = self.resolve(module_id).await?;
        resolved.operation(operation).cloned().ok_or_else(|| {
            let names = resolved.operations().iter().map(OperationDescriptor::name);
            RegistryError::OperationNotFound {
                module_id: resolved.target().service_name().to_owned(),
                operation: operation.to_owned(),
                suggestion: suggestion_for(names, operation),
            }
        })
    }

    fn entry(&self, module_id: &str) -> RegistryResult<&ModuleEntry> {
        if let Some(entry) = self.modules.get(module_id) {
            return Ok(entry);
        }
        let folded = module_id.to_lowercase();
        self.modules
            .get(&folded)
            .ok_or_else(|| RegistryError::ModuleNotFound {
                id: module_id.to_owned(),
                suggestion: suggestion_for(
                    self.modules.keys().map(String::as_str),
                    module_id,
                ),
            })
    }

    async fn construct(&self, entry: &ModuleEntry) -> RegistryResult<Arc<ResolvedModule>> {
        let module_id = entry.descriptor.id();
        let token = match entry.descriptor.token_env() {
            None => None,
            Some(env_key) => Some(self.credentials.credential(env_key).ok_or_else(|| {
                RegistryError::MissingCredential {
                    module_id: module_id.to_owned(),
                    env_key: env_key.to_owned(),
                }
            })?),
        };

        let target =
            (entry.factory)(token.as_deref()).map_err(|err| RegistryError::Load {
                module_id: module_id.to_owned(),
                reason: err.to_string(),
            })?;
        let operations = discover_operations(module_id, &target.members());
        debug!(module = module_id, operations = operations.len(), "module constructed");

        Ok(Arc::new(ResolvedModule { target, operations }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use sky_primitives::{ArgumentMap, ServiceValue};
    use sky_services::{MemberSpec, ParamSpec};

    struct MockTarget;

    #[async_trait]
    impl ServiceTarget for MockTarget {
        fn service_name(&self) -> &str {
            "mock"
        }

        fn members(&self) -> Vec<MemberSpec> {
            vec![
                MemberSpec::new("query_object", "Query one object.\n")
                    .param(ParamSpec::required("object_name", "str")),
            ]
        }

        async fn invoke(
            &self,
            _operation: &str,
            _args: &ArgumentMap,
        ) -> ServiceResult<ServiceValue> {
            Ok(ServiceValue::Null)
        }
    }

    struct NoCredentials;

    impl CredentialProvider for NoCredentials {
        fn credential(&self, _key: &str) -> Option<String> {
            None
        }
    }

    fn mock_registry() -> OperationRegistry {
        let mut registry = OperationRegistry::new(Arc::new(NoCredentials));
        registry
            .register(
                ModuleDescriptor::new("mock", "sky_services::mock").unwrap(),
                Box::new(|_| Ok(Arc::new(MockTarget))),
            )
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn duplicate_registration_errors() {
        let mut registry = mock_registry();
        let err = registry
            .register(
                ModuleDescriptor::new("mock", "sky_services::mock").unwrap(),
                Box::new(|_| Ok(Arc::new(MockTarget))),
            )
            .expect_err("duplicate registration should fail");
        assert!(matches!(err, RegistryError::DuplicateModule { id } if id == "mock"));
    }

    #[tokio::test]
    async fn unknown_module_carries_suggestion() {
        let registry = mock_registry();
        let err = registry.resolve("mok").await.expect_err("unknown module");
        let RegistryError::ModuleNotFound { id, suggestion } = err else {
            panic!("expected ModuleNotFound");
        };
        assert_eq!(id, "mok");
        assert_eq!(suggestion, "did you mean `mock`?");
    }

    #[tokio::test]
    async fn far_off_module_id_still_names_the_registered_ids() {
        let registry = mock_registry();
        let err = registry
            .resolve("nonexistent")
            .await
            .expect_err("unknown module");
        let RegistryError::ModuleNotFound { suggestion, .. } = err else {
            panic!("expected ModuleNotFound");
        };
        assert!(!suggestion.is_empty());
        assert!(suggestion.contains("mock"));
    }

    #[tokio::test]
    async fn resolve_memoizes_and_folds_case() {
        let registry = mock_registry();
        let first = registry.resolve("mock").await.unwrap();
        let second = registry.resolve("MOCK").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn construction_runs_exactly_once() {
        static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

        let mut registry = OperationRegistry::new(Arc::new(NoCredentials));
        registry
            .register(
                ModuleDescriptor::new("mock", "sky_services::mock").unwrap(),
                Box::new(|_| {
                    CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(MockTarget))
                }),
            )
            .unwrap();

        registry.resolve("mock").await.unwrap();
        registry.resolve("mock").await.unwrap();
        assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_credential_blocks_construction() {
        let mut registry = OperationRegistry::new(Arc::new(NoCredentials));
        registry
            .register(
                ModuleDescriptor::new("ads", "sky_services::ads")
                    .unwrap()
                    .with_token_env("ADS_TOKEN"),
                Box::new(|_| Ok(Arc::new(MockTarget))),
            )
            .unwrap();

        let err = registry.resolve("ads").await.expect_err("no credential");
        assert!(matches!(err, RegistryError::MissingCredential { env_key, .. } if env_key == "ADS_TOKEN"));
    }

    #[tokio::test]
    async fn describe_operation_suggests_near_misses() {
        let registry = mock_registry();
        let err = registry
            .describe_operation("mock", "query_objcet")
            .await
            .expect_err("typo should miss");
        let RegistryError::OperationNotFound { suggestion, .. } = err else {
            panic!("expected OperationNotFound");
        };
        assert_eq!(suggestion, "did you mean `query_object`?");
    }
}
