//! End-to-end tests over the JSON-RPC transport
//!
//! The bridge is served on one end of an in-memory duplex stream and the
//! service talks to it through `JsonRpcChannel`, the same wiring used with
//! a real socket.

mod common;

use std::sync::Arc;
use std::time::Duration;

use electron_mock::ChannelConfig;
use electron_mock::ElectronApi;
use electron_mock::ElectronService;
use electron_mock::JsonRpcChannel;
use electron_mock::MockError;
use electron_mock::RemoteChannel;
use electron_mock::ServiceOptions;
use electron_mock_bridge::BridgeHost;
use electron_mock_bridge::serve_connection;
use serde_json::json;

fn connect() -> (Arc<BridgeHost>, ElectronApi) {
    common::init_tracing();
    let host = Arc::new(common::fixture_host());
    let (client, server) = tokio::io::duplex(64 * 1024);
    tokio::spawn(serve_connection(server, Arc::clone(&host)));

    let channel: Arc<dyn RemoteChannel> = Arc::new(JsonRpcChannel::new(
        client,
        ChannelConfig::default().with_request_timeout(Duration::from_secs(5)),
    ));
    let api = ElectronService::new(ServiceOptions::default().with_custom_api_command("api"))
        .unwrap()
        .attach(channel);
    (host, api)
}

#[tokio::test]
async fn test_dialog_scenario_over_json_rpc() {
    let (_host, api) = connect();
    let mock = api.mock("dialog", "showOpenDialog").await.unwrap();

    mock.mock_return_value(["/mock/path"])
        .await
        .unwrap()
        .mock_return_value_once(["/other/path"])
        .await
        .unwrap();

    let options = json!({ "properties": ["openFile"] });
    assert_eq!(
        api.dialog("showOpenDialog", vec![options.clone()]).await.unwrap(),
        json!(["/other/path"])
    );
    assert_eq!(
        api.dialog("showOpenDialog", vec![options.clone()]).await.unwrap(),
        json!(["/mock/path"])
    );

    mock.update().await.unwrap();
    assert_eq!(mock.calls(), vec![vec![options.clone()], vec![options]]);
}

#[tokio::test]
async fn test_mock_all_and_remove_over_json_rpc() {
    let (host, api) = connect();
    let mocks = api.mock_all("app").await.unwrap();
    assert_eq!(mocks.len(), 2);

    assert_eq!(api.remove_mocks().await.unwrap(), 2);
    assert_eq!(host.methods("app").unwrap(), vec!["getName", "quit"]);
    assert_eq!(api.app("getName", vec![]).await.unwrap(), json!("fixture-app"));
}

#[tokio::test]
async fn test_remote_error_keeps_code_over_json_rpc() {
    let (host, api) = connect();
    host.set_exposed(false);

    let err = api.app("getName", vec![]).await.unwrap_err();
    assert!(matches!(
        err,
        MockError::Api {
            code: Some(electron_mock_ipc::error_codes::BRIDGE_NOT_AVAILABLE),
            ..
        }
    ));
}

#[tokio::test]
async fn test_closed_transport() {
    let (client, server) = tokio::io::duplex(1024);
    drop(server);
    let channel: Arc<dyn RemoteChannel> =
        Arc::new(JsonRpcChannel::new(client, ChannelConfig::default()));
    let api = ElectronService::new(ServiceOptions::default().with_custom_api_command("api"))
        .unwrap()
        .attach(channel);

    assert!(api.mock("app", "quit").await.is_err());
    assert!(api.registry().is_empty().await);
}
