//! Startup validation for a loaded configuration.
//!
//! Errors here are fatal: the service refuses to start with missing secrets
//! rather than discovering the gap on the first vault call.

use crate::{env_subst::has_unresolved_placeholder, schema::VetrinaConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "secrets.encryption_secret"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(path: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(path: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validate a loaded config, returning all diagnostics at once.
///
/// The two secrets are independently required outside demo mode; one never
/// substitutes for the other.
#[must_use]
pub fn validate(config: &VetrinaConfig) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    if !config.demo_mode {
        if config.secrets.encryption_secret.trim().is_empty() {
            diags.push(Diagnostic::error(
                "secrets.encryption_secret",
                "required for credential encryption at rest",
            ));
        }
        if config.secrets.session_secret.trim().is_empty() {
            diags.push(Diagnostic::error(
                "secrets.session_secret",
                "required for signing OAuth state",
            ));
        }
        if !config.instagram.is_configured() {
            diags.push(Diagnostic::error(
                "instagram",
                "client_id, client_secret, and redirect_uri are required unless demo_mode is enabled",
            ));
        }
        if !config.shopify.is_configured() {
            diags.push(Diagnostic::warning(
                "shopify",
                "not configured; Shopify connect requests will fail",
            ));
        }
    }

    // A `${VAR}` that survived substitution means the variable was unset
    // and no default was given. Better to name it here than to encrypt
    // credentials under a literal "${...}" key.
    for (path, value) in [
        ("secrets.encryption_secret", &config.secrets.encryption_secret),
        ("secrets.session_secret", &config.secrets.session_secret),
        ("instagram.client_secret", &config.instagram.client_secret),
        ("shopify.client_secret", &config.shopify.client_secret),
    ] {
        if has_unresolved_placeholder(value) {
            diags.push(Diagnostic::error(
                path,
                format!("unresolved placeholder {value}; set the variable or add a :-default"),
            ));
        }
    }

    if config.http.timeout_secs == 0 {
        diags.push(Diagnostic::error(
            "http.timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.demo_mode {
        diags.push(Diagnostic::warning(
            "demo_mode",
            "demo mode enabled; no real provider calls will be made",
        ));
    }

    diags
}

/// Returns `true` if any diagnostic is fatal.
#[must_use]
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}
