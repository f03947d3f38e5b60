//! The built-in module table.

use std::sync::Arc;

use sky_primitives::ModuleDescriptor;
use sky_services::{
    ServiceTarget, ads::AdsService, heasarc::HeasarcService, irsa::IrsaService,
    mast::MastService, ned::NedService, simbad::SimbadService, vizier::VizierService,
};

use crate::auth::CredentialProvider;
use crate::registry::{OperationRegistry, RegistryResult};

/// Environment variable holding the ADS API token.
pub const ADS_TOKEN_ENV: &str = "ADS_TOKEN";

/// Builds a registry populated with every supported service module.
///
/// Backends are constructed lazily: building the registry performs no I/O
/// and reads no credentials.
///
/// # Errors
///
/// Returns [`crate::RegistryError::DuplicateModule`] if the static table is
/// inconsistent.
pub fn builtin_registry(
    credentials: Arc<dyn CredentialProvider>,
) -> RegistryResult<OperationRegistry> {
    let mut registry = OperationRegistry::new(credentials);

    registry.register(
        descriptor("simbad", "sky_services::simbad::SimbadService"),
        Box::new(|_| {
            let target: Arc<dyn ServiceTarget> = Arc::new(SimbadService::new()?);
            Ok(target)
        }),
    )?;
    registry.register(
        descriptor("vizier", "sky_services::vizier::VizierService"),
        Box::new(|_| {
            let target: Arc<dyn ServiceTarget> = Arc::new(VizierService::new()?);
            Ok(target)
        }),
    )?;
    registry.register(
        descriptor("ned", "sky_services::ned::NedService"),
        Box::new(|_| {
            let target: Arc<dyn ServiceTarget> = Arc::new(NedService::new()?);
            Ok(target)
        }),
    )?;
    registry.register(
        descriptor("mast", "sky_services::mast::MastService"),
        Box::new(|_| {
            let target: Arc<dyn ServiceTarget> = Arc::new(MastService::new()?);
            Ok(target)
        }),
    )?;
    registry.register(
        descriptor("heasarc", "sky_services::heasarc::HeasarcService"),
        Box::new(|_| {
            let target: Arc<dyn ServiceTarget> = Arc::new(HeasarcService::new()?);
            Ok(target)
        }),
    )?;
    registry.register(
        descriptor("irsa", "sky_services::irsa::IrsaService"),
        Box::new(|_| {
            let target: Arc<dyn ServiceTarget> = Arc::new(IrsaService::new()?);
            Ok(target)
        }),
    )?;
    registry.register(
        descriptor("ads", "sky_services::ads::AdsService").with_token_env(ADS_TOKEN_ENV),
        Box::new(|token| {
            let target: Arc<dyn ServiceTarget> =
                Arc::new(AdsService::new(token.unwrap_or_default())?);
            Ok(target)
        }),
    )?;

    Ok(registry)
}

// Table ids are static and pre-validated; a failure here is a programming
// error caught by the module_table_is_valid test.
fn descriptor(id: &str, target_path: &str) -> ModuleDescriptor {
    ModuleDescriptor::new(id, target_path)
        .unwrap_or_else(|_| unreachable!("built-in module id `{id}` failed validation"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::EnvCredentials;

    #[test]
    fn module_table_is_valid() {
        let registry = builtin_registry(Arc::new(EnvCredentials)).unwrap();
        let ids: Vec<_> = registry
            .list_modules()
            .iter()
            .map(|descriptor| descriptor.id())
            .collect();
        assert_eq!(
            ids,
            vec!["ads", "heasarc", "irsa", "mast", "ned", "simbad", "vizier"]
        );
    }

    #[test]
    fn only_ads_requires_a_credential() {
        let registry = builtin_registry(Arc::new(EnvCredentials)).unwrap();
        for descriptor in registry.list_modules() {
            if descriptor.id() == "ads" {
                assert_eq!(descriptor.token_env(), Some(ADS_TOKEN_ENV));
            } else {
                assert_eq!(descriptor.token_env(), None);
            }
        }
    }
}
