//! Shared fixture: an application bridge reachable in-process.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Once;

use electron_mock::ElectronApi;
use electron_mock::ElectronService;
use electron_mock::MockOutcome;
use electron_mock::RemoteChannel;
use electron_mock::ServiceOptions;
use electron_mock_bridge::BridgeHost;
use electron_mock_bridge::InProcessChannel;
use serde_json::Value;
use serde_json::json;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        std::mem::forget(electron_mock::telemetry::init_tracing("warn"));
    });
}

/// The APIs a typical application exposes, with recognisable originals.
pub fn fixture_host() -> BridgeHost {
    BridgeHost::new()
        .with_method("app", "getName", |_| MockOutcome::Returned(json!("fixture-app")))
        .with_method("app", "quit", |_| MockOutcome::Returned(Value::Null))
        .with_method("dialog", "showOpenDialog", |_| {
            MockOutcome::Resolved(json!({ "canceled": true, "filePaths": [] }))
        })
        .with_method("browserWindow", "getTitle", |_| {
            MockOutcome::Returned(json!("Fixture Window"))
        })
        .with_method("mainProcess", "cwd", |_| MockOutcome::Returned(json!("/app")))
        .with_method("custom", "echo", |args| {
            MockOutcome::Returned(args.first().cloned().unwrap_or(Value::Null))
        })
        .with_function("double", |args| {
            let n = args.first().and_then(Value::as_i64).unwrap_or(0);
            MockOutcome::Returned(json!(n * 2))
        })
}

pub struct Session {
    pub host: Arc<BridgeHost>,
    pub api: ElectronApi,
}

pub fn session() -> Session {
    session_with(ServiceOptions::default().with_custom_api_command("api"))
}

pub fn session_with(options: ServiceOptions) -> Session {
    init_tracing();
    let host = Arc::new(fixture_host());
    let channel: Arc<dyn RemoteChannel> = Arc::new(InProcessChannel::new(Arc::clone(&host)));
    let api = ElectronService::new(options)
        .expect("valid options")
        .attach(channel);
    Session { host, api }
}
