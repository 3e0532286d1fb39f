use std::sync::Arc;

use async_trait::async_trait;
use electron_mock_ipc::ChannelError;
use electron_mock_ipc::RemoteChannel;
use electron_mock_ipc::RemoteCommand;
use serde_json::Value;

use crate::host::BridgeHost;

/// Executes commands against a [`BridgeHost`] living in the same process.
///
/// Commands still go through their JSON-RPC wire form, so anything that
/// works here also survives a real transport.
#[derive(Clone)]
pub struct InProcessChannel {
    host: Arc<BridgeHost>,
}

impl InProcessChannel {
    pub fn new(host: Arc<BridgeHost>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Arc<BridgeHost> {
        &self.host
    }
}

#[async_trait]
impl RemoteChannel for InProcessChannel {
    async fn execute(&self, command: RemoteCommand) -> Result<Value, ChannelError> {
        let request = command.into_request(0)?;
        let command = RemoteCommand::from_request(&request)?;
        // Every round trip is a suspension point, as it is over a socket.
        tokio::task::yield_now().await;
        Ok(self.host.execute(command)?)
    }
}
