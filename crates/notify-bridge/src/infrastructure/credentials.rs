//! Loading the Pushover credentials.
//!
//! The two secrets can come from a TOML file, from the command line, or from
//! the environment (clap maps `PUSHOVER_APP_TOKEN` / `PUSHOVER_USER_TOKEN` onto
//! the CLI flags).  Values given on the command line or in the environment win
//! over values read from the file.
//!
//! ```toml
//! app_token = "azGDORePK8gMaC0QOYAMyEEuzJnyUi"
//! user_token = "uQiRzpo4DXghDmr9QzzfQu27cmVRsG"
//! ```
//!
//! Unlike an optional settings file, a credentials file that was named
//! explicitly but does not exist is an error: starting without credentials
//! would only fail later, on the first notification.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::Credentials;

/// Error type for credential resolution.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// The credentials file could not be read.
    #[error("I/O error reading credentials at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse credentials TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A token was found neither in the file nor on the command line.
    #[error("missing {0}: set it in the credentials file or on the command line")]
    Missing(&'static str),
}

/// On-disk layout of the credentials file.  Both keys are optional so that a
/// file may carry one secret while the other comes from the environment.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
struct CredentialsFile {
    #[serde(default)]
    app_token: Option<String>,
    #[serde(default)]
    user_token: Option<String>,
}

fn load_file(path: &Path) -> Result<CredentialsFile, CredentialsError> {
    let content = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CredentialsFile = toml::from_str(&content)?;
    Ok(file)
}

/// Combines the optional credentials file with command-line overrides.
///
/// Blank values count as missing.
///
/// # Errors
///
/// - [`CredentialsError::Io`] if `file` is given but cannot be read.
/// - [`CredentialsError::Parse`] if the file is not valid TOML.
/// - [`CredentialsError::Missing`] if either token is still absent.
pub fn resolve(
    file: Option<&Path>,
    app_override: Option<String>,
    user_override: Option<String>,
) -> Result<Credentials, CredentialsError> {
    let from_file = match file {
        Some(path) => load_file(path)?,
        None => CredentialsFile::default(),
    };

    let app_token = pick(app_override, from_file.app_token)
        .ok_or(CredentialsError::Missing("Pushover app token"))?;
    let user_token = pick(user_override, from_file.user_token)
        .ok_or(CredentialsError::Missing("Pushover user key"))?;

    Ok(Credentials::new(app_token, user_token))
}

fn pick(preferred: Option<String>, fallback: Option<String>) -> Option<String> {
    preferred
        .filter(|v| !v.trim().is_empty())
        .or_else(|| fallback.filter(|v| !v.trim().is_empty()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(content.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn test_resolve_reads_both_tokens_from_file() {
        // Arrange
        let file = write_file("app_token = \"app-1\"\nuser_token = \"user-1\"\n");

        // Act
        let creds = resolve(Some(file.path()), None, None).expect("resolve");

        // Assert
        assert_eq!(creds.app_token(), "app-1");
        assert_eq!(creds.user_token(), "user-1");
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let file = write_file("app_token = \"from-file\"\nuser_token = \"from-file\"\n");

        let creds = resolve(Some(file.path()), Some("from-cli".to_string()), None).expect("resolve");

        assert_eq!(creds.app_token(), "from-cli");
        assert_eq!(creds.user_token(), "from-file");
    }

    #[test]
    fn test_resolve_without_file_uses_overrides() {
        let creds = resolve(None, Some("a".to_string()), Some("u".to_string())).expect("resolve");
        assert_eq!(creds, Credentials::new("a", "u"));
    }

    #[test]
    fn test_missing_user_token_is_reported() {
        let file = write_file("app_token = \"app-1\"\n");

        let err = resolve(Some(file.path()), None, None).unwrap_err();

        assert!(matches!(err, CredentialsError::Missing("Pushover user key")));
    }

    #[test]
    fn test_blank_override_falls_back_to_file() {
        let file = write_file("app_token = \"app-1\"\nuser_token = \"user-1\"\n");

        let creds = resolve(Some(file.path()), Some("  ".to_string()), None).expect("resolve");

        assert_eq!(creds.app_token(), "app-1");
    }

    #[test]
    fn test_nothing_configured_reports_app_token_first() {
        let err = resolve(None, None, None).unwrap_err();
        assert!(matches!(err, CredentialsError::Missing("Pushover app token")));
    }

    #[test]
    fn test_unreadable_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");

        let err = resolve(Some(&missing), None, None).unwrap_err();

        assert!(matches!(err, CredentialsError::Io { ref path, .. } if path == &missing));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let file = write_file("app_token = \n");

        let err = resolve(Some(file.path()), None, None).unwrap_err();

        assert!(matches!(err, CredentialsError::Parse(_)));
    }
}
