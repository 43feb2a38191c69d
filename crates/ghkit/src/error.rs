//! Error types for GitHub CLI operations.
//!
//! Errors are categorized from `gh` output so callers can report what went
//! wrong and how to fix it.

use thiserror::Error;

/// Categories of `gh` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Not logged in or token rejected
    Auth,
    /// Organization or entry not found
    NotFound,
    /// API rate limit hit
    RateLimited,
    /// Network-related errors (transient)
    Network,
    /// Token lacks the required scope or role
    Permission,
    /// `gh` not installed
    GhNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient.
    ///
    /// Advisory only: callers decide whether to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::RateLimited)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Auth => "Authentication failed",
            Self::NotFound => "Not found",
            Self::RateLimited => "Rate limited",
            Self::Network => "Network connectivity issue",
            Self::Permission => "Permission denied",
            Self::GhNotFound => "GitHub CLI not installed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Auth => "Run 'gh auth login' or set GH_TOKEN",
            Self::NotFound => "Check the organization name and that the entry exists",
            Self::RateLimited => "Wait for the rate limit window to reset or lower --jobs",
            Self::Network => "Check your internet connection and try again",
            Self::Permission => "The token needs the admin:org scope and an org owner role",
            Self::GhNotFound => "Install the GitHub CLI from https://cli.github.com",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur talking to GitHub through `gh`.
#[derive(Debug, Error)]
pub enum Error {
    /// `gh` is not installed or not on PATH
    #[error("GitHub CLI (gh) not found. Install it from https://cli.github.com")]
    GhNotFound,

    /// Authentication error
    #[error("authentication failed: {message}")]
    Auth {
        /// Message from gh
        message: String,
    },

    /// Organization or entry not found
    #[error("not found: {name}")]
    NotFound {
        /// What was not found
        name: String,
    },

    /// Rate limit exceeded
    #[error("rate limited: {message}")]
    RateLimited {
        /// Message from gh
        message: String,
    },

    /// Network-related error
    #[error("network error: {message}")]
    Network {
        /// Message from gh
        message: String,
    },

    /// Insufficient permissions
    #[error("permission denied: {message}")]
    Permission {
        /// Message from gh
        message: String,
    },

    /// Command execution failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what failed
        message: String,
        /// Standard error output from gh
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::GhNotFound => ErrorCategory::GhNotFound,
            Error::Auth { .. } => ErrorCategory::Auth,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::RateLimited { .. } => ErrorCategory::RateLimited,
            Error::Network { .. } => ErrorCategory::Network,
            Error::Permission { .. } => ErrorCategory::Permission,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Classify a failed `gh` invocation from its stderr.
    ///
    /// `subject` names the entry the command was about, if any.
    pub fn from_gh_output(stderr: &str, subject: Option<&str>) -> Self {
        let message = stderr.trim().to_string();
        let lower = message.to_lowercase();

        if lower.contains("rate limit") {
            Error::RateLimited { message }
        } else if lower.contains("http 401")
            || lower.contains("gh auth login")
            || lower.contains("bad credentials")
        {
            Error::Auth { message }
        } else if lower.contains("http 404") || lower.contains("not found") {
            Error::NotFound {
                name: subject.map_or(message, str::to_string),
            }
        } else if lower.contains("http 403")
            || lower.contains("resource not accessible")
            || lower.contains("admin:org")
        {
            Error::Permission { message }
        } else if lower.contains("could not resolve host")
            || lower.contains("connection refused")
            || lower.contains("connection reset")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("tls handshake")
        {
            Error::Network { message }
        } else {
            Error::CommandFailed {
                message: match subject {
                    Some(name) => format!("gh failed for {name}"),
                    None => "gh failed".to_string(),
                },
                stderr: message,
            }
        }
    }
}

/// Result type for ghkit operations
pub type Result<T> = std::result::Result<T, Error>;
