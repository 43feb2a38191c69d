//! Backend abstraction for organization variables and secrets.
//!
//! The [`Backend`] trait defines the calls needed against GitHub, allowing
//! for different implementations (the `gh` CLI today).

pub mod gh;

use crate::error::Result;
use crate::types::{Access, SecretApp, SecretName, Variable};

/// Backend trait for organization-level variables and secrets.
pub trait Backend: Send + Sync {
    /// List all organization variables with their values.
    fn list_variables(&self, org: &str) -> Result<Vec<Variable>>;

    /// List all organization secret names for an app.
    fn list_secrets(&self, org: &str, app: SecretApp) -> Result<Vec<SecretName>>;

    /// Create or update a variable. `None` access leaves gh's default.
    fn set_variable(
        &self,
        org: &str,
        name: &str,
        value: &str,
        access: Option<&Access>,
    ) -> Result<()>;

    /// Create or update a secret. `None` access leaves gh's default.
    fn set_secret(
        &self,
        org: &str,
        app: SecretApp,
        name: &str,
        value: &str,
        access: Option<&Access>,
    ) -> Result<()>;

    /// Repositories selected for a variable with `selected` visibility.
    fn variable_repos(&self, org: &str, name: &str) -> Result<Vec<String>>;

    /// Repositories selected for a secret with `selected` visibility.
    fn secret_repos(&self, org: &str, app: SecretApp, name: &str) -> Result<Vec<String>>;

    /// Delete a variable.
    fn delete_variable(&self, org: &str, name: &str) -> Result<()>;

    /// Delete a secret.
    fn delete_secret(&self, org: &str, app: SecretApp, name: &str) -> Result<()>;
}
