use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DiffSarifError;

/// One changed file handed to the analysis: its path and its diff text.
///
/// The filename identifies the unit within a single request. The diff text
/// may be empty; the model is still queried in that case.
///
/// # Examples
///
/// ```
/// use diffsarif_core::DiffUnit;
///
/// let unit = DiffUnit::new("src/app.py", "@@ -1 +1 @@\n-a\n+b\n");
/// assert_eq!(unit.filename, "src/app.py");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffUnit {
    /// Path of the changed file, relative to the repository root.
    pub filename: String,
    /// Diff body for this file.
    pub diff_text: String,
}

impl DiffUnit {
    /// Create a diff unit from a filename and its diff text.
    pub fn new(filename: impl Into<String>, diff_text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            diff_text: diff_text.into(),
        }
    }
}

/// A single finding decoded from a model response.
///
/// Line and column are whatever the model reported; they are not checked
/// against the diff.
///
/// # Examples
///
/// ```
/// use diffsarif_core::IssueRecord;
///
/// let record = IssueRecord {
///     message: "missing semicolon".into(),
///     file: "main.js".into(),
///     line: 5,
///     column: 2,
/// };
/// assert_eq!(record.line, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Trimmed comment text.
    pub message: String,
    /// Filename of the diff unit the record was parsed from.
    pub file: String,
    /// Reported line number.
    pub line: u32,
    /// Reported column number.
    pub column: u32,
}

/// Secret token for the completion service.
///
/// Passed explicitly through the pipeline and never stored globally. Both
/// `Debug` and `Display` are redacted, so a credential cannot leak into logs
/// or error messages by accident.
///
/// # Examples
///
/// ```
/// use diffsarif_core::Credential;
///
/// let key = Credential::new("sk-secret");
/// assert_eq!(key.expose(), "sk-secret");
/// assert_eq!(format!("{key:?}"), "Credential(***)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read the credential from the environment variable `var`.
    ///
    /// # Errors
    ///
    /// Returns [`DiffSarifError::Validation`] if the variable is unset or
    /// blank.
    pub fn from_env(var: &str) -> Result<Self, DiffSarifError> {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(Self(token.trim().to_string())),
            _ => Err(DiffSarifError::Validation(format!(
                "no credential found in environment variable {var}"
            ))),
        }
    }

    /// The raw token, for the HTTP client only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_is_redacted() {
        let key = Credential::new("sk-very-secret");
        assert!(!format!("{key:?}").contains("sk-very"));
        assert!(!format!("{key}").contains("sk-very"));
    }

    #[test]
    fn blank_credential_detected() {
        assert!(Credential::new("   ").is_blank());
        assert!(!Credential::new("k").is_blank());
    }

    #[test]
    fn credential_from_missing_env_is_validation_error() {
        let err = Credential::from_env("DIFFSARIF_TEST_UNSET_VARIABLE_7F3A").unwrap_err();
        assert!(matches!(err, DiffSarifError::Validation(_)));
        assert!(err.to_string().contains("DIFFSARIF_TEST_UNSET_VARIABLE_7F3A"));
    }

    #[test]
    fn diff_unit_serializes_camel_case() {
        let unit = DiffUnit::new("a.py", "+x");
        let json = serde_json::to_value(&unit).unwrap();
        assert_eq!(json["filename"], "a.py");
        assert_eq!(json["diffText"], "+x");
    }
}
