//! GitHub CLI backend using `gh variable` and `gh secret` commands.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{Access, SecretApp, SecretName, Variable, Visibility};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

/// Backend that executes real `gh` commands.
pub struct GhBackend {
    /// Path to the gh executable
    gh_path: PathBuf,
}

impl GhBackend {
    /// Create a new GhBackend.
    ///
    /// Returns an error if `gh` is not on PATH.
    pub fn new() -> Result<Self> {
        let gh_path = which::which("gh").map_err(|_| Error::GhNotFound)?;
        log::debug!("Using gh at {}", gh_path.display());
        Ok(Self { gh_path })
    }

    /// Create a backend for a specific gh executable.
    pub fn with_path(gh_path: impl Into<PathBuf>) -> Self {
        Self {
            gh_path: gh_path.into(),
        }
    }

    /// Run gh, optionally feeding `stdin`.
    fn run_gh(&self, args: &[String], stdin: Option<&str>) -> Result<Output> {
        log::trace!("gh {}", args.join(" "));

        let mut cmd = Command::new(&self.gh_path);
        cmd.args(args)
            .env("GH_PROMPT_DISABLED", "1")
            .env("NO_COLOR", "1")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let Some(input) = stdin else {
            return Ok(cmd.stdin(Stdio::null()).output()?);
        };

        let mut child = cmd.stdin(Stdio::piped()).spawn()?;
        let written = child
            .stdin
            .take()
            .map_or(Ok(()), |mut pipe| pipe.write_all(input.as_bytes()));
        let output = child.wait_with_output()?;

        // gh may exit before reading its input; its stderr explains why
        if let Err(e) = written {
            if output.status.success() {
                return Err(e.into());
            }
            log::debug!("gh closed stdin early: {e}");
        }
        Ok(output)
    }

    /// Run gh and check for success, returning stdout.
    fn run_gh_checked(
        &self,
        args: &[String],
        stdin: Option<&str>,
        subject: Option<&str>,
    ) -> Result<String> {
        let output = self.run_gh(args, stdin)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_gh_output(&stderr, subject));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Backend for GhBackend {
    fn list_variables(&self, org: &str) -> Result<Vec<Variable>> {
        let stdout = self.run_gh_checked(&variable_list_args(org), None, Some(org))?;
        parse_variables(&stdout)
    }

    fn list_secrets(&self, org: &str, app: SecretApp) -> Result<Vec<SecretName>> {
        let stdout = self.run_gh_checked(&secret_list_args(org, app), None, Some(org))?;
        parse_secret_names(&stdout)
    }

    fn set_variable(
        &self,
        org: &str,
        name: &str,
        value: &str,
        access: Option<&Access>,
    ) -> Result<()> {
        // Not on stdin: gh trims a trailing newline from piped bodies
        self.run_gh_checked(&variable_set_args(org, name, value, access), None, Some(name))?;
        Ok(())
    }

    fn set_secret(
        &self,
        org: &str,
        app: SecretApp,
        name: &str,
        value: &str,
        access: Option<&Access>,
    ) -> Result<()> {
        // Never pass the secret on the command line
        self.run_gh_checked(
            &secret_set_args(org, app, name, access),
            Some(value),
            Some(name),
        )?;
        Ok(())
    }

    fn variable_repos(&self, org: &str, name: &str) -> Result<Vec<String>> {
        let path = format!("orgs/{org}/actions/variables/{name}/repositories");
        let stdout = self.run_gh_checked(&repos_args(&path), None, Some(name))?;
        Ok(parse_repo_names(&stdout))
    }

    fn secret_repos(&self, org: &str, app: SecretApp, name: &str) -> Result<Vec<String>> {
        let path = format!("orgs/{org}/{app}/secrets/{name}/repositories");
        let stdout = self.run_gh_checked(&repos_args(&path), None, Some(name))?;
        Ok(parse_repo_names(&stdout))
    }

    fn delete_variable(&self, org: &str, name: &str) -> Result<()> {
        let args = vec![
            "variable".to_string(),
            "delete".to_string(),
            name.to_string(),
            "--org".to_string(),
            org.to_string(),
        ];
        self.run_gh_checked(&args, None, Some(name))?;
        Ok(())
    }

    fn delete_secret(&self, org: &str, app: SecretApp, name: &str) -> Result<()> {
        let args = vec![
            "secret".to_string(),
            "delete".to_string(),
            name.to_string(),
            "--org".to_string(),
            org.to_string(),
            "--app".to_string(),
            app.as_str().to_string(),
        ];
        self.run_gh_checked(&args, None, Some(name))?;
        Ok(())
    }
}

fn variable_list_args(org: &str) -> Vec<String> {
    ["variable", "list", "--org", org, "--json", "name,value,visibility"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn secret_list_args(org: &str, app: SecretApp) -> Vec<String> {
    [
        "secret",
        "list",
        "--org",
        org,
        "--app",
        app.as_str(),
        "--json",
        "name,visibility",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn repos_args(path: &str) -> Vec<String> {
    ["api", "--paginate", path, "--jq", ".repositories[].name"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// `--body=` keeps values that start with '-' from being read as flags.
fn variable_set_args(org: &str, name: &str, value: &str, access: Option<&Access>) -> Vec<String> {
    let mut args: Vec<String> = ["variable", "set", name, "--org", org]
        .iter()
        .map(ToString::to_string)
        .collect();
    args.push(format!("--body={value}"));
    push_access(&mut args, access);
    args
}

fn secret_set_args(
    org: &str,
    app: SecretApp,
    name: &str,
    access: Option<&Access>,
) -> Vec<String> {
    let mut args: Vec<String> = ["secret", "set", name, "--org", org, "--app", app.as_str()]
        .iter()
        .map(ToString::to_string)
        .collect();
    push_access(&mut args, access);
    args
}

fn push_access(args: &mut Vec<String>, access: Option<&Access>) {
    let Some(access) = access else {
        return;
    };
    args.push("--visibility".to_string());
    args.push(access.visibility.as_str().to_string());
    if access.visibility == Visibility::Selected && !access.repos.is_empty() {
        args.push("--repos".to_string());
        args.push(access.repos.join(","));
    }
}

/// Parse `gh variable list --json name,value,visibility` output.
pub fn parse_variables(json: &str) -> Result<Vec<Variable>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(json)?)
}

/// Parse `gh secret list --json name,visibility` output.
pub fn parse_secret_names(json: &str) -> Result<Vec<SecretName>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(json)?)
}

/// One repository name per line, as printed by `--jq`.
fn parse_repo_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
