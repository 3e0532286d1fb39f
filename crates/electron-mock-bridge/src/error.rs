//! Failures raised inside the remote process.
//!
//! Each variant maps to a JSON-RPC error code so the test process can tell a
//! missing bridge from a missing API group, a missing method, or a failure
//! raised by the invoked code itself.

use electron_mock_ipc::ChannelError;
use electron_mock_ipc::MockTarget;
use electron_mock_ipc::error_codes;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("{}", error_codes::BRIDGE_NOT_AVAILABLE_MESSAGE)]
    NotAvailable,
    #[error("\"{0}\" API not found on ContextBridge")]
    ApiNotFound(String),
    #[error("\"{method}\" is not a method of the \"{namespace}\" API")]
    MethodNotFound { namespace: String, method: String },
    #[error("{} is not mocked", .0.label())]
    NotMocked(MockTarget),
    #[error("{} is already mocked", .0.label())]
    AlreadyMocked(MockTarget),
    #[error("{0}")]
    Invocation(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

impl BridgeError {
    pub fn code(&self) -> i32 {
        match self {
            BridgeError::NotAvailable => error_codes::BRIDGE_NOT_AVAILABLE,
            BridgeError::ApiNotFound(_) => error_codes::API_NOT_FOUND,
            BridgeError::MethodNotFound { .. } => error_codes::METHOD_NOT_FOUND,
            BridgeError::NotMocked(_) => error_codes::NOT_MOCKED,
            BridgeError::AlreadyMocked(_) => error_codes::ALREADY_MOCKED,
            BridgeError::Invocation(_) => error_codes::INVOCATION_FAILED,
            BridgeError::InvalidParams(_) => error_codes::INVALID_PARAMS,
        }
    }
}

impl From<BridgeError> for ChannelError {
    fn from(err: BridgeError) -> Self {
        ChannelError::Remote {
            code: err.code(),
            message: err.to_string(),
        }
    }
}
