use thiserror::Error;

/// Unified error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Invalid version: {0}")]
    Version(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Command `{command}` exited with {status}{detail}")]
    Shell {
        command: String,
        status: String,
        detail: String,
    },

    #[error("Missing release artifact: {0}")]
    Missing(String),

    #[error("Working tree is not clean: {0}")]
    NotPorcelain(String),

    #[error("Cherry-pick conflict: {0}")]
    CherryPick(String),

    #[error("Aborted: {0}")]
    Aborted(String),

    #[error("Version file error: {0}")]
    VersionFile(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in gbm-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Create a missing-artifact error with context
    pub fn missing(msg: impl Into<String>) -> Self {
        ReleaseError::Missing(msg.into())
    }

    /// Create a version-file error with context
    pub fn version_file(msg: impl Into<String>) -> Self {
        ReleaseError::VersionFile(msg.into())
    }

    /// Create an operator-abort error with context
    pub fn aborted(msg: impl Into<String>) -> Self {
        ReleaseError::Aborted(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReleaseError::config("unknown repo");
        assert_eq!(err.to_string(), "Configuration error: unknown repo");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReleaseError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(ReleaseError::version("x").to_string().contains("version"));
        assert!(ReleaseError::missing("GBM PR").to_string().contains("GBM PR"));
        assert!(ReleaseError::aborted("bye").to_string().starts_with("Aborted"));
    }

    #[test]
    fn test_shell_error_names_the_command() {
        let err = ReleaseError::Shell {
            command: "git push origin HEAD".to_string(),
            status: "exit status: 128".to_string(),
            detail: String::new(),
        };
        let msg = err.to_string();
        assert!(msg.contains("git push origin HEAD"));
        assert!(msg.contains("128"));
    }
}
