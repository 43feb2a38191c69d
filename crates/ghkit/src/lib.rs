//! # ghkit
//!
//! GitHub organization variables and secrets through the `gh` CLI.
//!
//! This crate provides functionality for:
//! - Listing organization variables (with values) and secret names
//! - Creating, updating, and deleting variables and secrets
//! - Classifying `gh` failures into actionable error categories
//!
//! Secret values are written to `gh` on stdin and never appear in process
//! arguments.
//!
//! Unless the settings force a visibility, a write keeps the visibility (and
//! the repository selection) the entry had when it was last listed.
//!
//! ## Example
//!
//! ```no_run
//! use ghkit::{Client, OrgSettings};
//!
//! let client = Client::new("acme", OrgSettings::default()).expect("gh not available");
//!
//! for var in client.list_variables().expect("list failed") {
//!     println!("{} = {}", var.name, var.value);
//! }
//!
//! client.set_secret("NPM_TOKEN", "s3cr3t").expect("set failed");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{Access, OrgSettings, SecretApp, SecretName, Variable, Visibility};

use backend::{Backend, gh::GhBackend};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Visibility of each entry as last listed
#[derive(Debug, Default)]
struct Listed {
    variables: BTreeMap<String, Visibility>,
    secrets: BTreeMap<String, Visibility>,
}

/// High-level client bound to one organization.
///
/// The client wraps a backend and applies the organization settings
/// (visibility, secret app) to every call.
pub struct Client {
    backend: Box<dyn Backend>,
    org: String,
    settings: OrgSettings,
    listed: Mutex<Listed>,
}

impl Client {
    /// Create a new Client with the default backend.
    ///
    /// Returns an error if `gh` is not installed.
    pub fn new(org: impl Into<String>, settings: OrgSettings) -> Result<Self> {
        let backend = GhBackend::new()?;
        Ok(Self::with_backend(Box::new(backend), org, settings))
    }

    /// Create a Client with a custom backend.
    pub fn with_backend(
        backend: Box<dyn Backend>,
        org: impl Into<String>,
        settings: OrgSettings,
    ) -> Self {
        Self {
            backend,
            org: org.into(),
            settings,
            listed: Mutex::new(Listed::default()),
        }
    }

    /// Organization this client targets.
    pub fn org(&self) -> &str {
        &self.org
    }

    fn listed(&self) -> std::sync::MutexGuard<'_, Listed> {
        self.listed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// List all organization variables.
    pub fn list_variables(&self) -> Result<Vec<Variable>> {
        let vars = self.backend.list_variables(&self.org)?;
        self.listed().variables = vars
            .iter()
            .filter_map(|v| Some((v.name.clone(), v.visibility?)))
            .collect();
        Ok(vars)
    }

    /// List all organization secret names.
    pub fn list_secrets(&self) -> Result<Vec<SecretName>> {
        let names = self.backend.list_secrets(&self.org, self.settings.secret_app)?;
        self.listed().secrets = names
            .iter()
            .filter_map(|s| Some((s.name.clone(), s.visibility?)))
            .collect();
        Ok(names)
    }

    /// Access to pass on a write: the forced visibility, else the listed one.
    ///
    /// A `selected` entry gets its current repositories back, since setting
    /// `selected` alone would leave it with none.
    fn access(
        &self,
        listed: Option<Visibility>,
        repos: impl FnOnce() -> Result<Vec<String>>,
    ) -> Result<Option<Access>> {
        let access = match (self.settings.visibility, listed) {
            (Some(forced), _) => Some(Access::new(forced)),
            (None, Some(Visibility::Selected)) => Some(Access {
                visibility: Visibility::Selected,
                repos: repos()?,
            }),
            (None, Some(current)) => Some(Access::new(current)),
            (None, None) => None,
        };
        Ok(access)
    }

    /// Create or update a variable.
    pub fn set_variable(&self, name: &str, value: &str) -> Result<()> {
        log::debug!("Setting variable {name} in {}", self.org);
        let listed = self.listed().variables.get(name).copied();
        let access = self.access(listed, || self.backend.variable_repos(&self.org, name))?;
        self.backend
            .set_variable(&self.org, name, value, access.as_ref())
    }

    /// Create or update a secret.
    pub fn set_secret(&self, name: &str, value: &str) -> Result<()> {
        log::debug!("Setting secret {name} in {}", self.org);
        let app = self.settings.secret_app;
        let listed = self.listed().secrets.get(name).copied();
        let access = self.access(listed, || self.backend.secret_repos(&self.org, app, name))?;
        self.backend
            .set_secret(&self.org, app, name, value, access.as_ref())
    }

    /// Delete a variable.
    pub fn delete_variable(&self, name: &str) -> Result<()> {
        log::debug!("Deleting variable {name} from {}", self.org);
        self.backend.delete_variable(&self.org, name)
    }

    /// Delete a secret.
    pub fn delete_secret(&self, name: &str) -> Result<()> {
        log::debug!("Deleting secret {name} from {}", self.org);
        self.backend
            .delete_secret(&self.org, self.settings.secret_app, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Records calls so the client's argument plumbing can be checked.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingBackend {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn describe(access: Option<&Access>) -> String {
        match access {
            None => "default".to_string(),
            Some(a) if a.repos.is_empty() => a.visibility.to_string(),
            Some(a) => format!("{}:{}", a.visibility, a.repos.join(",")),
        }
    }

    impl Backend for RecordingBackend {
        fn list_variables(&self, org: &str) -> Result<Vec<Variable>> {
            self.record(format!("list_variables {org}"));
            Ok(vec![
                Variable {
                    name: "REGION".to_string(),
                    value: "eu".to_string(),
                    visibility: Some(Visibility::All),
                },
                Variable {
                    name: "TEAM".to_string(),
                    value: "core".to_string(),
                    visibility: Some(Visibility::Selected),
                },
            ])
        }

        fn list_secrets(&self, org: &str, app: SecretApp) -> Result<Vec<SecretName>> {
            self.record(format!("list_secrets {org} {app}"));
            Ok(vec![SecretName {
                name: "TOKEN".to_string(),
                visibility: Some(Visibility::Selected),
            }])
        }

        fn set_variable(
            &self,
            org: &str,
            name: &str,
            value: &str,
            access: Option<&Access>,
        ) -> Result<()> {
            self.record(format!("set_variable {org} {name}={value} {}", describe(access)));
            Ok(())
        }

        fn set_secret(
            &self,
            org: &str,
            app: SecretApp,
            name: &str,
            _value: &str,
            access: Option<&Access>,
        ) -> Result<()> {
            self.record(format!("set_secret {org} {app} {name} {}", describe(access)));
            Ok(())
        }

        fn variable_repos(&self, org: &str, name: &str) -> Result<Vec<String>> {
            self.record(format!("variable_repos {org} {name}"));
            Ok(vec!["web".to_string()])
        }

        fn secret_repos(&self, org: &str, app: SecretApp, name: &str) -> Result<Vec<String>> {
            self.record(format!("secret_repos {org} {app} {name}"));
            Ok(vec!["api".to_string(), "web".to_string()])
        }

        fn delete_variable(&self, org: &str, name: &str) -> Result<()> {
            Err(Error::NotFound {
                name: format!("{org}/{name}"),
            })
        }

        fn delete_secret(&self, org: &str, app: SecretApp, name: &str) -> Result<()> {
            self.record(format!("delete_secret {org} {app} {name}"));
            Ok(())
        }
    }

    fn client(settings: OrgSettings) -> (Client, Arc<RecordingBackend>) {
        let backend = Arc::new(RecordingBackend::default());
        let client = Client::with_backend(Box::new(ArcBackend(backend.clone())), "acme", settings);
        (client, backend)
    }

    #[test]
    fn test_client_applies_settings() {
        let (client, backend) = client(OrgSettings {
            visibility: Some(Visibility::Private),
            secret_app: SecretApp::Dependabot,
        });

        assert_eq!(client.list_variables().unwrap().len(), 2);
        client.set_variable("TEAM", "platform").unwrap();
        client.set_secret("TOKEN", "hidden").unwrap();
        client.delete_secret("OLD").unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                "list_variables acme",
                "set_variable acme TEAM=platform private",
                "set_secret acme dependabot TOKEN private",
                "delete_secret acme dependabot OLD",
            ]
        );
    }

    #[test]
    fn test_writes_keep_listed_visibility() {
        let (client, backend) = client(OrgSettings::default());

        client.list_variables().unwrap();
        client.list_secrets().unwrap();
        client.set_variable("REGION", "us").unwrap();
        client.set_variable("TEAM", "platform").unwrap();
        client.set_secret("TOKEN", "hidden").unwrap();

        let calls = backend.calls();
        assert_eq!(
            &calls[2..],
            &[
                "set_variable acme REGION=us all",
                "variable_repos acme TEAM",
                "set_variable acme TEAM=platform selected:web",
                "secret_repos acme actions TOKEN",
                "set_secret acme actions TOKEN selected:api,web",
            ]
        );
    }

    #[test]
    fn test_new_entry_uses_gh_default() {
        let (client, backend) = client(OrgSettings::default());

        client.list_variables().unwrap();
        client.set_variable("NEW", "1").unwrap();

        assert_eq!(backend.calls()[1], "set_variable acme NEW=1 default");
    }

    #[test]
    fn test_client_propagates_backend_errors() {
        let client = Client::with_backend(
            Box::new(RecordingBackend::default()),
            "acme",
            OrgSettings::default(),
        );
        let err = client.delete_variable("GONE").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(client.org(), "acme");
    }

    /// Shares a backend between the client and the test body.
    struct ArcBackend(Arc<RecordingBackend>);

    impl Backend for ArcBackend {
        fn list_variables(&self, org: &str) -> Result<Vec<Variable>> {
            self.0.list_variables(org)
        }
        fn list_secrets(&self, org: &str, app: SecretApp) -> Result<Vec<SecretName>> {
            self.0.list_secrets(org, app)
        }
        fn set_variable(
            &self,
            org: &str,
            name: &str,
            value: &str,
            access: Option<&Access>,
        ) -> Result<()> {
            self.0.set_variable(org, name, value, access)
        }
        fn set_secret(
            &self,
            org: &str,
            app: SecretApp,
            name: &str,
            value: &str,
            access: Option<&Access>,
        ) -> Result<()> {
            self.0.set_secret(org, app, name, value, access)
        }
        fn variable_repos(&self, org: &str, name: &str) -> Result<Vec<String>> {
            self.0.variable_repos(org, name)
        }
        fn secret_repos(&self, org: &str, app: SecretApp, name: &str) -> Result<Vec<String>> {
            self.0.secret_repos(org, app, name)
        }
        fn delete_variable(&self, org: &str, name: &str) -> Result<()> {
            self.0.delete_variable(org, name)
        }
        fn delete_secret(&self, org: &str, app: SecretApp, name: &str) -> Result<()> {
            self.0.delete_secret(org, app, name)
        }
    }
}
