use crate::framework::TestFramework;
use thiserror::Error;

/// Failures a discovery call can surface. An empty result is a
/// legitimate "zero tests found" outcome and is never reported through
/// this type.
#[derive(Error, Debug, Clone)]
pub enum DiscoveryError {
    /// Configured arguments conflict irreconcilably with discovery
    /// mode. Raised before any process is spawned.
    #[error("invalid {framework} configuration: {message}")]
    Configuration {
        framework: TestFramework,
        message: String,
    },

    /// The framework executable could not be started at all.
    #[error("failed to spawn '{executable}': {message}")]
    Spawn { executable: String, message: String },

    /// The framework process ran but its output could not be
    /// interpreted as a successful discovery. Carries the raw streams
    /// for diagnostics.
    #[error("{framework} discovery failed (exit code {exit_code:?}); output could not be parsed")]
    Parse {
        framework: TestFramework,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The caller withdrew the operation. Distinguished from failure
    /// so callers do not report it as an error.
    #[error("discovery was cancelled")]
    Cancelled,
}

impl DiscoveryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DiscoveryError::Cancelled)
    }

    pub(crate) fn spawn(executable: &str, source: &std::io::Error) -> Self {
        DiscoveryError::Spawn {
            executable: executable.to_string(),
            message: source.to_string(),
        }
    }
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DiscoveryError::Configuration {
            framework: TestFramework::Pytest,
            message: "--pdb conflicts with collect-only mode".to_string(),
        };
        assert!(error.to_string().contains("pytest"));
        assert!(error.to_string().contains("--pdb"));

        let error = DiscoveryError::Spawn {
            executable: "nosetests".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert!(error.to_string().contains("nosetests"));
    }

    #[test]
    fn test_cancelled_is_distinguished() {
        assert!(DiscoveryError::Cancelled.is_cancelled());
        let error = DiscoveryError::Parse {
            framework: TestFramework::Unittest,
            exit_code: Some(1),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!error.is_cancelled());
    }
}
