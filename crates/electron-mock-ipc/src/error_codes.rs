//! Semantic error codes for remote failures.
//!
//! Codes follow the JSON-RPC 2.0 specification:
//! - -32700 to -32600: Reserved protocol errors
//! - -32000 to -32099: Server errors (we use -32001 to -32010 for bridge errors)

// Protocol errors
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const UNKNOWN_COMMAND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

// Bridge lookup errors
pub const BRIDGE_NOT_AVAILABLE: i32 = -32001;
pub const API_NOT_FOUND: i32 = -32002;
pub const METHOD_NOT_FOUND: i32 = -32003;

// Mock state errors
pub const NOT_MOCKED: i32 = -32004;
pub const ALREADY_MOCKED: i32 = -32005;

// Failure raised by the invoked method or mock
pub const INVOCATION_FAILED: i32 = -32006;

pub const GENERIC_ERROR: i32 = -32000;

/// Message used when the application under test has not exposed its bridge.
pub const BRIDGE_NOT_AVAILABLE_MESSAGE: &str = "ContextBridge is not available; \
    the application under test must expose the electron-mock bridge";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bridge, API group or method missing
    NotFound,
    /// Malformed command or parameters
    InvalidInput,
    /// Mock state does not allow the command
    Conflict,
    /// The invoked code failed
    Invocation,
    Internal,
    /// Transport failure
    External,
    Timeout,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Invocation => "invocation",
            ErrorCategory::Internal => "internal",
            ErrorCategory::External => "external",
            ErrorCategory::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the error category for a given error code.
pub fn category_for_code(code: i32) -> ErrorCategory {
    match code {
        BRIDGE_NOT_AVAILABLE | API_NOT_FOUND | METHOD_NOT_FOUND => ErrorCategory::NotFound,
        PARSE_ERROR | INVALID_REQUEST | UNKNOWN_COMMAND | INVALID_PARAMS => {
            ErrorCategory::InvalidInput
        }
        NOT_MOCKED | ALREADY_MOCKED => ErrorCategory::Conflict,
        INVOCATION_FAILED => ErrorCategory::Invocation,
        _ => ErrorCategory::Internal,
    }
}

/// Whether a caller may reasonably try the same command again.
///
/// Nothing in this workspace retries on its own; this only informs callers.
pub fn is_retryable(code: i32) -> bool {
    matches!(code, BRIDGE_NOT_AVAILABLE | GENERIC_ERROR)
}
