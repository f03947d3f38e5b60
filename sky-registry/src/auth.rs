//! Credential lookup for modules that require an API token.

use std::env;

/// Supplies credentials to module construction.
///
/// The registry consults the provider when a module descriptor names a
/// credential environment variable.
pub trait CredentialProvider: Send + Sync {
    /// Returns the credential stored under `key`, if present and non-empty.
    fn credential(&self, key: &str) -> Option<String>;
}

/// Provider backed by process environment variables.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn credential(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_provider_ignores_blank_values() {
        // SAFETY: test-local variable name, no other thread reads it.
        unsafe {
            env::set_var("SKYQUERY_TEST_BLANK_TOKEN", "   ");
        }
        assert_eq!(EnvCredentials.credential("SKYQUERY_TEST_BLANK_TOKEN"), None);
        assert_eq!(EnvCredentials.credential("SKYQUERY_TEST_UNSET_TOKEN"), None);
    }
}
