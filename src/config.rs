//! Declared state loading
//!
//! The config directory holds:
//! - `variables.toml` - `NAME = scalar` per organization variable
//! - `secrets.toml` - `NAME = "ENV_VAR"` or `NAME = true` per secret
//! - `orgsync.toml` - optional run settings
//!
//! Everything is validated up front so a bad file fails the run before any
//! remote call is made.

use declarative::DeclaredState;
use ghkit::{SecretApp, Visibility};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use toml::Value;

pub const VARIABLES_FILE: &str = "variables.toml";
pub const SECRETS_FILE: &str = "secrets.toml";
pub const SETTINGS_FILE: &str = "orgsync.toml";

/// Names as GitHub stores them: it upper-cases organization variable and
/// secret names, so a lowercase declaration would never match its remote key
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("static name regex"));

/// Prefix GitHub reserves for its own variables
const RESERVED_PREFIX: &str = "GITHUB_";

/// Fatal configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} not found", path.display())]
    Missing { path: PathBuf },

    #[error("could not read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("no organization given (use --org, ORGSYNC_ORG or `organization` in orgsync.toml)")]
    NoOrganization,
}

impl ConfigError {
    fn malformed(path: &Path, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Optional run settings from `orgsync.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub organization: Option<String>,
    pub deletion_threshold: Option<usize>,
    pub jobs: Option<usize>,
    pub visibility: Option<Visibility>,
    pub secret_app: SecretApp,
}

/// Everything loaded from the config directory
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub dir: PathBuf,
    pub declared: DeclaredState,
    /// Secret name to the environment variable holding its value
    pub secret_sources: BTreeMap<String, String>,
    pub settings: Settings,
}

impl Config {
    /// Load and validate the config directory
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let variables_path = dir.join(VARIABLES_FILE);
        let variables = parse_variables(&variables_path, &read(&variables_path)?)?;

        let secrets_path = dir.join(SECRETS_FILE);
        let secret_sources = parse_secrets(&secrets_path, &read(&secrets_path)?)?;

        let settings_path = dir.join(SETTINGS_FILE);
        let settings = if settings_path.exists() {
            parse_settings(&settings_path, &read(&settings_path)?)?
        } else {
            Settings::default()
        };

        log::info!(
            "Loaded {} variables and {} secrets from {}",
            variables.len(),
            secret_sources.len(),
            dir.display()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            declared: DeclaredState {
                variables,
                secrets: secret_sources.keys().cloned().collect(),
            },
            secret_sources,
            settings,
        })
    }

    /// Pick the organization: flag/env first, then the settings file
    pub fn organization(&self, flag: Option<&str>) -> Result<String, ConfigError> {
        flag.map(str::to_string)
            .or_else(|| self.settings.organization.clone())
            .filter(|org| !org.trim().is_empty())
            .ok_or(ConfigError::NoOrganization)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn parse_table(path: &Path, content: &str) -> Result<toml::Table, ConfigError> {
    toml::from_str::<toml::Table>(content)
        .map_err(|e| ConfigError::malformed(path, e.to_string().trim().to_string()))
}

/// Check a name is usable as an organization variable or secret
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(format!(
            "invalid name '{name}': GitHub stores names upper-cased, write it as '{}'",
            name.to_ascii_uppercase()
        ));
    }
    if !NAME_RE.is_match(name) {
        return Err(format!(
            "invalid name '{name}': use upper-case letters, digits and underscores, not starting with a digit"
        ));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(format!(
            "invalid name '{name}': the {RESERVED_PREFIX} prefix is reserved"
        ));
    }
    Ok(())
}

/// Parse `variables.toml` into name → value
pub fn parse_variables(
    path: &Path,
    content: &str,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let table = parse_table(path, content)?;
    let mut variables = BTreeMap::new();

    for (name, value) in table {
        validate_name(&name).map_err(|m| ConfigError::malformed(path, m))?;
        let rendered = render_scalar(&value).ok_or_else(|| {
            ConfigError::malformed(
                path,
                format!(
                    "variable '{name}' must be a string, number or boolean, found {}",
                    value.type_str()
                ),
            )
        })?;
        variables.insert(name, rendered);
    }

    Ok(variables)
}

/// Parse `secrets.toml` into secret name → environment variable name
pub fn parse_secrets(path: &Path, content: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let table = parse_table(path, content)?;
    let mut secrets = BTreeMap::new();

    for (name, value) in table {
        validate_name(&name).map_err(|m| ConfigError::malformed(path, m))?;
        let source = match value {
            Value::String(env) if !env.trim().is_empty() => env,
            Value::Boolean(true) => name.clone(),
            other => {
                return Err(ConfigError::malformed(
                    path,
                    format!(
                        "secret '{name}' must name an environment variable or be `true`, found {}",
                        describe(&other)
                    ),
                ));
            }
        };
        secrets.insert(name, source);
    }

    Ok(secrets)
}

/// Parse `orgsync.toml`
pub fn parse_settings(path: &Path, content: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = toml::from_str(content)
        .map_err(|e| ConfigError::malformed(path, e.to_string().trim().to_string()))?;

    // A forced `selected` would clear each entry's repository list
    if settings.visibility == Some(Visibility::Selected) {
        return Err(ConfigError::malformed(
            path,
            "visibility = \"selected\" cannot be forced; leave it unset to keep each entry's repositories",
        ));
    }
    Ok(settings)
}

/// Render a TOML scalar the way it is written; `None` for non-scalars
fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(format!("{f:.1}")),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(_) | Value::Array(_) | Value::Table(_) => None,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(_) => "an empty string".to_string(),
        Value::Boolean(false) => "`false`".to_string(),
        other => format!("a {}", other.type_str()),
    }
}

// ============================================================================
// Tests
// ============================================================================
