//! Adapters between the reconciliation engine and the outside world
//!
//! - [`GhStore`] exposes a [`ghkit::Client`] as a [`RemoteStore`]
//! - [`EnvSecrets`] resolves secret values from environment variables

use anyhow::{Context, Result, anyhow, bail};
use declarative::{RemoteStore, ValueSource};
use ghkit::ErrorCategory;
use std::collections::{BTreeMap, BTreeSet};

/// Remote store backed by the GitHub CLI
pub struct GhStore {
    client: ghkit::Client,
}

impl GhStore {
    pub fn new(client: ghkit::Client) -> Self {
        Self { client }
    }
}

/// Flatten a gh error into one report line, with advice where there is some
fn explain(e: ghkit::Error) -> anyhow::Error {
    match e {
        ghkit::Error::CommandFailed { message, stderr } if !stderr.is_empty() => {
            anyhow!("{message}: {stderr}")
        }
        e if e.category() == ErrorCategory::Other => anyhow::Error::new(e),
        e => anyhow!("{e} ({})", e.category().advice()),
    }
}

impl RemoteStore for GhStore {
    fn list_variables(&self) -> Result<BTreeMap<String, String>> {
        let vars = self.client.list_variables().map_err(explain)?;
        Ok(vars.into_iter().map(|v| (v.name, v.value)).collect())
    }

    fn list_secret_names(&self) -> Result<BTreeSet<String>> {
        let names = self.client.list_secrets().map_err(explain)?;
        Ok(names.into_iter().map(|s| s.name).collect())
    }

    fn upsert_variable(&self, name: &str, value: &str) -> Result<()> {
        self.client.set_variable(name, value).map_err(explain)
    }

    fn upsert_secret(&self, name: &str, value: &str) -> Result<()> {
        self.client.set_secret(name, value).map_err(explain)
    }

    fn delete_variable(&self, name: &str) -> Result<()> {
        self.client.delete_variable(name).map_err(explain)
    }

    fn delete_secret(&self, name: &str) -> Result<()> {
        self.client.delete_secret(name).map_err(explain)
    }
}

/// Secret values read from the environment at apply time
///
/// Values are read only when a worker asks for one and are never cached.
pub struct EnvSecrets {
    /// Secret name to environment variable name
    sources: BTreeMap<String, String>,
}

impl EnvSecrets {
    pub fn new(sources: BTreeMap<String, String>) -> Self {
        Self { sources }
    }

    /// Declared secrets whose environment variable is unset
    pub fn missing(&self) -> Vec<(&str, &str)> {
        self.sources
            .iter()
            .filter(|(_, env)| std::env::var_os(env).is_none())
            .map(|(name, env)| (name.as_str(), env.as_str()))
            .collect()
    }
}

impl ValueSource for EnvSecrets {
    fn value_for(&self, name: &str) -> Result<String> {
        let Some(env) = self.sources.get(name) else {
            bail!("secret {name} is not declared");
        };
        std::env::var(env).with_context(|| format!("environment variable {env} is not set"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghkit::backend::Backend;
    use ghkit::{Access, OrgSettings, SecretApp, SecretName, Variable};

    struct FixedBackend;

    impl Backend for FixedBackend {
        fn list_variables(&self, _org: &str) -> ghkit::Result<Vec<Variable>> {
            Ok(vec![Variable {
                name: "REGION".to_string(),
                value: "eu".to_string(),
                visibility: None,
            }])
        }
        fn list_secrets(&self, _org: &str, _app: SecretApp) -> ghkit::Result<Vec<SecretName>> {
            Ok(vec![SecretName {
                name: "TOKEN".to_string(),
                visibility: None,
            }])
        }
        fn set_variable(
            &self,
            _org: &str,
            _name: &str,
            _value: &str,
            _access: Option<&Access>,
        ) -> ghkit::Result<()> {
            Ok(())
        }
        fn set_secret(
            &self,
            _org: &str,
            _app: SecretApp,
            _name: &str,
            _value: &str,
            _access: Option<&Access>,
        ) -> ghkit::Result<()> {
            Err(ghkit::Error::from_gh_output(
                "HTTP 403: Resource not accessible by integration",
                Some("TOKEN"),
            ))
        }
        fn variable_repos(&self, _org: &str, _name: &str) -> ghkit::Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn secret_repos(
            &self,
            _org: &str,
            _app: SecretApp,
            _name: &str,
        ) -> ghkit::Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn delete_variable(&self, _org: &str, _name: &str) -> ghkit::Result<()> {
            Ok(())
        }
        fn delete_secret(&self, _org: &str, _app: SecretApp, _name: &str) -> ghkit::Result<()> {
            Ok(())
        }
    }

    fn store() -> GhStore {
        GhStore::new(ghkit::Client::with_backend(
            Box::new(FixedBackend),
            "acme",
            OrgSettings::default(),
        ))
    }

    #[test]
    fn test_gh_store_lists() {
        let store = store();
        assert_eq!(store.list_variables().unwrap()["REGION"], "eu");
        assert!(store.list_secret_names().unwrap().contains("TOKEN"));
    }

    #[test]
    fn test_gh_store_error_carries_advice() {
        let err = store().upsert_secret("TOKEN", "x").unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("admin:org"), "{text}");
        assert!(text.contains("permission denied"), "{text}");
    }

    #[test]
    fn test_env_secrets_reads_named_variable() {
        // SAFETY: variable name is unique to this test
        unsafe { std::env::set_var("ORGSYNC_STORE_TEST_SECRET", "hunter2") };
        let sources = BTreeMap::from([(
            "DB_PASSWORD".to_string(),
            "ORGSYNC_STORE_TEST_SECRET".to_string(),
        )]);
        let secrets = EnvSecrets::new(sources);
        assert_eq!(secrets.value_for("DB_PASSWORD").unwrap(), "hunter2");
        assert!(secrets.missing().is_empty());
    }

    #[test]
    fn test_env_secrets_unset_and_undeclared() {
        let sources = BTreeMap::from([(
            "API_KEY".to_string(),
            "ORGSYNC_STORE_TEST_UNSET_12345".to_string(),
        )]);
        let secrets = EnvSecrets::new(sources);
        let err = secrets.value_for("API_KEY").unwrap_err();
        assert!(err.to_string().contains("ORGSYNC_STORE_TEST_UNSET_12345"));
        assert!(secrets.value_for("OTHER").is_err());
        assert_eq!(
            secrets.missing(),
            vec![("API_KEY", "ORGSYNC_STORE_TEST_UNSET_12345")]
        );
    }
}
