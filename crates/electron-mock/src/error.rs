//! Errors surfaced to test code.
//!
//! Nothing here is retried. Every variant that wraps a remote failure keeps
//! the remote message and adds which API or mock it came from.

use electron_mock_ipc::ChannelError;
use electron_mock_ipc::error_codes::ErrorCategory;
use thiserror::Error;

/// Static misconfiguration, reported before any session starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "The command \"{0}\" is reserved, please provide a different value for custom_api_command"
    )]
    ReservedCommand(String),
    #[error("The custom API command name must not be empty")]
    EmptyCommand,
}

#[derive(Error, Debug)]
pub enum MockError {
    /// A mock command failed in, or on the way to, the remote process.
    #[error("{target}: {source}")]
    Remote {
        target: String,
        source: ChannelError,
    },
    /// The handle was restored and can no longer be configured.
    #[error("{0} has been restored; call mock() again to create a new mock")]
    Restored(String),
    /// A forwarded API call failed.
    #[error("{command} error: {message}")]
    Api {
        command: String,
        code: Option<i32>,
        message: String,
    },
    #[error("Unknown API command: {0}")]
    UnknownCommand(String),
    #[error("Failed to encode mock payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode remote response for {target}: {source}")]
    Decode {
        target: String,
        source: serde_json::Error,
    },
    /// Individual failures of a bulk operation that kept going past them.
    #[error("{operation} failed for {} mock(s): {}", .failures.len(), join_failures(.failures))]
    Bulk {
        operation: &'static str,
        failures: Vec<MockError>,
    },
}

impl MockError {
    /// The remote method is not (or no longer) mocked.
    pub fn is_not_mocked(&self) -> bool {
        matches!(self, MockError::Remote { source, .. } if source.is_not_mocked())
    }

    pub fn is_restored(&self) -> bool {
        matches!(self, MockError::Restored(_))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MockError::Remote { source, .. } => source.category(),
            MockError::Api {
                code: Some(code), ..
            } => electron_mock_ipc::error_codes::category_for_code(*code),
            MockError::Api { code: None, .. } => ErrorCategory::External,
            MockError::Restored(_) => ErrorCategory::Conflict,
            MockError::UnknownCommand(_) => ErrorCategory::InvalidInput,
            MockError::Encode(_) | MockError::Decode { .. } | MockError::Bulk { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}

fn join_failures(failures: &[MockError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use electron_mock_ipc::error_codes;

    #[test]
    fn test_reserved_command_message() {
        let err = ConfigError::ReservedCommand("app".into());
        assert_eq!(
            err.to_string(),
            "The command \"app\" is reserved, please provide a different value for custom_api_command"
        );
    }

    #[test]
    fn test_api_error_prefixes_command() {
        let err = MockError::Api {
            command: "dialog".into(),
            code: Some(error_codes::INVOCATION_FAILED),
            message: "user cancelled".into(),
        };
        assert_eq!(err.to_string(), "dialog error: user cancelled");
        assert_eq!(err.category(), ErrorCategory::Invocation);
    }

    #[test]
    fn test_remote_error_names_target() {
        let err = MockError::Remote {
            target: "electron.app.quit".into(),
            source: ChannelError::remote(error_codes::NOT_MOCKED, "electron.app.quit is not mocked"),
        };
        assert_eq!(
            err.to_string(),
            "electron.app.quit: Remote error (-32004): electron.app.quit is not mocked"
        );
        assert!(err.is_not_mocked());
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_bulk_error_lists_failures() {
        let err = MockError::Bulk {
            operation: "restore",
            failures: vec![
                MockError::Restored("electron.app.quit".into()),
                MockError::UnknownCommand("tray".into()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "restore failed for 2 mock(s): electron.app.quit has been restored; call mock() again to create a new mock; Unknown API command: tray"
        );
    }
}
