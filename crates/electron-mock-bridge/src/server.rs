use std::sync::Arc;

use electron_mock_ipc::RemoteCommand;
use electron_mock_ipc::RpcRequest;
use electron_mock_ipc::RpcResponse;
use electron_mock_ipc::error_codes;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::host::BridgeHost;

pub fn handle_request(host: &BridgeHost, request: RpcRequest) -> RpcResponse {
    if !RemoteCommand::NAMES.contains(&request.method.as_str()) {
        return RpcResponse::error(
            request.id,
            error_codes::UNKNOWN_COMMAND,
            &format!("Unknown command: {}", request.method),
        );
    }

    let command = match RemoteCommand::from_request(&request) {
        Ok(command) => command,
        Err(e) => {
            return RpcResponse::error(
                request.id,
                error_codes::INVALID_PARAMS,
                &format!("Invalid params for '{}': {}", request.method, e),
            );
        }
    };

    let target = command.target().cloned();
    match host.execute(command) {
        Ok(result) => RpcResponse::success(request.id, result),
        Err(e) => {
            debug!(id = request.id, method = %request.method, error = %e, "bridge command failed");
            RpcResponse::error_with_target(request.id, e.code(), &e.to_string(), target.as_ref())
        }
    }
}

fn handle_line(host: &BridgeHost, line: &str) -> RpcResponse {
    match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) => handle_request(host, request),
        Err(e) => RpcResponse::error(0, error_codes::PARSE_ERROR, &format!("Parse error: {}", e)),
    }
}

/// Answers newline-delimited JSON-RPC requests until the peer hangs up.
pub async fn serve_connection<S>(stream: S, host: Arc<BridgeHost>) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&host, &line);
        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }

    debug!("bridge connection closed");
    Ok(())
}

/// Accepts connections forever, serving each on its own task.
#[cfg(unix)]
pub async fn serve_listener(
    listener: tokio::net::UnixListener,
    host: Arc<BridgeHost>,
) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "bridge listening");
    loop {
        let (stream, _) = listener.accept().await?;
        let host = Arc::clone(&host);
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, host).await {
                warn!(error = %e, "bridge connection failed");
            }
        });
    }
}
