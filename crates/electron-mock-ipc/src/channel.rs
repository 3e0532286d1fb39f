use async_trait::async_trait;
use serde_json::Value;

use crate::error::ChannelError;
use crate::protocol::RemoteCommand;

/// One-request/one-response execution of commands in the remote process.
///
/// Implementations must not deliver partial results or push messages; each
/// `execute` resolves exactly once with the remote result or its failure.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    async fn execute(&self, command: RemoteCommand) -> Result<Value, ChannelError>;
}
