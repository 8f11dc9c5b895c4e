use miette::Diagnostic;

/// Errors that can occur across the diffsarif workspace.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary renders it through `miette` at the boundary and the
/// HTTP service maps it onto status codes.
///
/// Malformed fragments in a model response are not represented here: the
/// response parser drops them locally and never surfaces them.
///
/// # Examples
///
/// ```
/// use diffsarif_core::DiffSarifError;
///
/// let err = DiffSarifError::Validation("Key and files are required".into());
/// assert!(err.to_string().contains("Key and files are required"));
/// ```
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum DiffSarifError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(diffsarif::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(diffsarif::config))]
    Config(String),

    /// Git operation failure while collecting diffs.
    #[error("git error: {0}")]
    #[diagnostic(code(diffsarif::git))]
    Git(String),

    /// The caller supplied an unusable request: missing credential, no files,
    /// too many files, or a file without a name or diff.
    #[error("invalid request: {0}")]
    #[diagnostic(code(diffsarif::validation))]
    Validation(String),

    /// The completion service rejected the supplied credential.
    #[error("invalid credential: {0}")]
    #[diagnostic(
        code(diffsarif::credential),
        help("check the API key passed to diffsarif")
    )]
    InvalidCredential(String),

    /// The completion service call failed (network, quota, service error).
    #[error("upstream service error: {0}")]
    #[diagnostic(code(diffsarif::upstream))]
    Upstream(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(diffsarif::toml))]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DiffSarifError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = DiffSarifError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn upstream_error_displays_message() {
        let err = DiffSarifError::Upstream("503 Service Unavailable".into());
        assert!(err.to_string().starts_with("upstream service error"));
    }
}
