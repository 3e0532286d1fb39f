use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::io::ReadHalf;
use tokio::io::WriteHalf;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::warn;

use crate::channel::RemoteChannel;
use crate::config::ChannelConfig;
use crate::error::ChannelError;
use crate::protocol::RemoteCommand;
use crate::protocol::RpcRequest;
use crate::protocol::RpcResponse;

/// One end of the wire.
///
/// Both buffers survive a round trip that is dropped by its timeout: bytes of
/// a half-written request are sent before the next one, and bytes of a
/// half-read response stay in `incoming` until the rest of the line arrives.
struct Connection<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    outgoing: Vec<u8>,
    incoming: Vec<u8>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite,
{
    async fn flush_outgoing(&mut self) -> Result<(), ChannelError> {
        while !self.outgoing.is_empty() {
            let written = self.writer.write(&self.outgoing).await?;
            if written == 0 {
                return Err(ChannelError::Closed);
            }
            self.outgoing.drain(..written);
        }
        self.writer.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self) -> Result<Vec<u8>, ChannelError> {
        let read = self.reader.read_until(b'\n', &mut self.incoming).await?;
        if read == 0 || self.incoming.last() != Some(&b'\n') {
            return Err(ChannelError::Closed);
        }
        Ok(std::mem::take(&mut self.incoming))
    }
}

/// Newline-delimited JSON-RPC 2.0 over a byte stream.
///
/// The connection is held for the whole round trip, so at most one request
/// is outstanding on the wire at a time.
pub struct JsonRpcChannel<S> {
    connection: Mutex<Connection<S>>,
    next_id: AtomicU64,
    config: ChannelConfig,
}

impl<S> JsonRpcChannel<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(stream: S, config: ChannelConfig) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            connection: Mutex::new(Connection {
                reader: BufReader::new(reader),
                writer,
                outgoing: Vec::new(),
                incoming: Vec::new(),
            }),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    async fn round_trip(&self, request: &RpcRequest) -> Result<Value, ChannelError> {
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');

        let mut connection = self.connection.lock().await;
        // Finish whatever a timed-out request left unsent first.
        connection.flush_outgoing().await?;
        connection.outgoing.extend_from_slice(&line);
        connection.flush_outgoing().await?;

        loop {
            let response_line = connection.next_line().await?;
            let response: RpcResponse = serde_json::from_slice(&response_line)?;
            // Late answers to requests that already timed out are dropped.
            if response.id < request.id {
                warn!(stale_id = response.id, id = request.id, "discarding stale response");
                continue;
            }
            if response.id != request.id {
                return Err(ChannelError::InvalidResponse);
            }
            return response.into_result();
        }
    }
}

#[cfg(unix)]
impl JsonRpcChannel<tokio::net::UnixStream> {
    pub async fn connect_unix(
        path: impl AsRef<std::path::Path>,
        config: ChannelConfig,
    ) -> Result<Self, ChannelError> {
        let stream = tokio::net::UnixStream::connect(path).await?;
        Ok(Self::new(stream, config))
    }
}

#[async_trait]
impl<S> RemoteChannel for JsonRpcChannel<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn execute(&self, command: RemoteCommand) -> Result<Value, ChannelError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let method = command.name();
        let request = command.into_request(id)?;
        debug!(id, method, "sending remote command");

        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.round_trip(&request))
                .await
                .map_err(|_| ChannelError::Timeout(limit.as_millis() as u64))?,
            None => self.round_trip(&request).await,
        }
    }
}
