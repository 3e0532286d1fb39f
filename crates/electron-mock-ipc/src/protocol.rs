use std::fmt;

use electron_mock_common::Behavior;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::error::ChannelError;

/// Identity of one intercepted method on the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MockTarget {
    pub namespace: String,
    pub method: String,
}

impl MockTarget {
    pub fn new(namespace: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            method: method.into(),
        }
    }

    /// Human-readable label, e.g. `electron.dialog.showOpenDialog`.
    pub fn label(&self) -> String {
        format!("electron.{}.{}", self.namespace, self.method)
    }
}

impl fmt::Display for MockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.method)
    }
}

/// Everything the test process can ask the remote process to do.
///
/// Serialized as JSON-RPC `method`/`params` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum RemoteCommand {
    /// Save the original method and replace it with a fresh mock.
    InstallMock(MockTarget),
    SetBehavior {
        target: MockTarget,
        behavior: Behavior,
        once: bool,
    },
    ClearMock(MockTarget),
    ResetMock(MockTarget),
    /// Put the saved original back in place of the mock.
    RestoreMock(MockTarget),
    /// Full ordered call history of the mock.
    MockCalls(MockTarget),
    ListMethods {
        namespace: String,
    },
    /// Call a method through the bridge, as the application itself would.
    Invoke {
        bridge_prop: String,
        method: String,
        args: Vec<Value>,
    },
}

impl RemoteCommand {
    pub const NAMES: [&'static str; 8] = [
        "install_mock",
        "set_behavior",
        "clear_mock",
        "reset_mock",
        "restore_mock",
        "mock_calls",
        "list_methods",
        "invoke",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RemoteCommand::InstallMock(_) => "install_mock",
            RemoteCommand::SetBehavior { .. } => "set_behavior",
            RemoteCommand::ClearMock(_) => "clear_mock",
            RemoteCommand::ResetMock(_) => "reset_mock",
            RemoteCommand::RestoreMock(_) => "restore_mock",
            RemoteCommand::MockCalls(_) => "mock_calls",
            RemoteCommand::ListMethods { .. } => "list_methods",
            RemoteCommand::Invoke { .. } => "invoke",
        }
    }

    pub fn target(&self) -> Option<&MockTarget> {
        match self {
            RemoteCommand::InstallMock(target)
            | RemoteCommand::ClearMock(target)
            | RemoteCommand::ResetMock(target)
            | RemoteCommand::RestoreMock(target)
            | RemoteCommand::MockCalls(target)
            | RemoteCommand::SetBehavior { target, .. } => Some(target),
            RemoteCommand::ListMethods { .. } | RemoteCommand::Invoke { .. } => None,
        }
    }

    pub fn into_request(self, id: u64) -> Result<RpcRequest, serde_json::Error> {
        let method = self.name().to_string();
        let mut wire = serde_json::to_value(self)?;
        let params = wire.get_mut("params").map(Value::take);
        Ok(RpcRequest {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        })
    }

    pub fn from_request(request: &RpcRequest) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json!({
            "method": request.method,
            "params": request.params,
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    jsonrpc: String,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<RpcServerError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcServerError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: u64, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(RpcServerError {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }

    pub fn error_with_target(
        id: u64,
        code: i32,
        message: &str,
        target: Option<&MockTarget>,
    ) -> Self {
        let mut response = Self::error(id, code, message);
        if let Some(error) = response.error.as_mut() {
            error.data = target.map(|t| json!({ "namespace": t.namespace, "method": t.method }));
        }
        response
    }

    pub fn action_success(id: u64) -> Self {
        Self::success(id, json!({ "success": true }))
    }

    pub fn into_result(self) -> Result<Value, ChannelError> {
        if let Some(error) = self.error {
            return Err(ChannelError::Remote {
                code: error.code,
                message: error.message,
            });
        }
        self.result.ok_or(ChannelError::InvalidResponse)
    }
}
