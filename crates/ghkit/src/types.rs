//! Core types for organization variables and secrets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An organization variable as listed by GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Variable {
    /// Variable name
    pub name: String,
    /// Current value
    pub value: String,
    /// Current visibility, when gh reports it
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

/// An organization secret as listed by GitHub (name only).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretName {
    /// Secret name
    pub name: String,
    /// Current visibility, when gh reports it
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

/// Which repositories in the organization can use an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// All repositories
    All,
    /// Private and internal repositories
    Private,
    /// Explicitly selected repositories
    Selected,
}

impl Visibility {
    /// Value for `gh --visibility`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Private => "private",
            Self::Selected => "selected",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which GitHub feature a secret belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretApp {
    /// GitHub Actions
    #[default]
    Actions,
    /// Dependabot
    Dependabot,
    /// Codespaces
    Codespaces,
}

impl SecretApp {
    /// Value for `gh --app`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actions => "actions",
            Self::Dependabot => "dependabot",
            Self::Codespaces => "codespaces",
        }
    }
}

impl fmt::Display for SecretApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository access passed on set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Access {
    /// Visibility for `--visibility`
    pub visibility: Visibility,
    /// Repository names for `--repos`; only used with `Selected`
    pub repos: Vec<String>,
}

impl Access {
    /// Access with no repository list
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            repos: Vec::new(),
        }
    }
}

/// Settings applied to every write for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrgSettings {
    /// Visibility forced on every set; `None` keeps each entry's current one
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Secret application
    #[serde(default)]
    pub secret_app: SecretApp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_variable_ignores_extra_fields() {
        let v: Variable = serde_json::from_str(
            r#"{"name":"REGION","value":"eu","updatedAt":"2024-01-01T00:00:00Z","visibility":"all"}"#,
        )
        .unwrap();
        assert_eq!(v.name, "REGION");
        assert_eq!(v.value, "eu");
        assert_eq!(v.visibility, Some(Visibility::All));
    }

    #[test]
    fn test_deserialize_secret_without_visibility() {
        let s: SecretName = serde_json::from_str(r#"{"name":"TOKEN"}"#).unwrap();
        assert_eq!(s.visibility, None);
    }

    #[test]
    fn test_settings_defaults() {
        let s = OrgSettings::default();
        assert_eq!(s.visibility, None);
        assert_eq!(s.secret_app, SecretApp::Actions);
    }

    #[test]
    fn test_visibility_from_str() {
        let v: Visibility = serde_json::from_str("\"selected\"").unwrap();
        assert_eq!(v, Visibility::Selected);
        assert_eq!(v.as_str(), "selected");
    }
}
