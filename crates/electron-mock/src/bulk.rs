//! Operations over every mock in a namespace or in the whole session.

use std::collections::BTreeMap;
use std::sync::Arc;

use electron_mock_ipc::RemoteCommand;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::api::ElectronApi;
use crate::error::MockError;
use crate::mock::MockHandle;

/// Mocks every method of a bridge namespace.
///
/// Fails as a whole if the methods cannot be listed, and stops at the first
/// method that cannot be mocked.
pub(crate) async fn mock_all(
    api: &ElectronApi,
    namespace: &str,
) -> Result<BTreeMap<String, Arc<MockHandle>>, MockError> {
    let bridge_prop = api.resolve_namespace(namespace);
    let target = format!("electron.{}", bridge_prop);

    let value = api
        .channel()
        .execute(RemoteCommand::ListMethods {
            namespace: bridge_prop.clone(),
        })
        .await
        .map_err(|source| MockError::Remote {
            target: target.clone(),
            source,
        })?;
    let methods: Vec<String> =
        serde_json::from_value(value).map_err(|source| MockError::Decode { target, source })?;
    info!(namespace = %bridge_prop, count = methods.len(), "mocking all methods");

    let mut mocks = BTreeMap::new();
    for method in methods {
        let handle = api.mock(&bridge_prop, &method).await?;
        mocks.insert(method, handle);
    }
    Ok(mocks)
}

/// Restores every registered mock, optionally limited to one namespace.
///
/// Mocks that are already restored, here or remotely, are skipped. Any other
/// failure is collected and reported once all mocks have been attempted.
pub(crate) async fn remove_mocks(
    api: &ElectronApi,
    namespace: Option<&str>,
) -> Result<usize, MockError> {
    let mut restored = 0;
    let mut failures = Vec::new();

    for handle in selected(api, namespace).await {
        match handle.mock_restore().await {
            Ok(_) => restored += 1,
            Err(e) if e.is_restored() => {}
            Err(e) if e.is_not_mocked() => {
                debug!(mock = %handle.name(), "mock already gone remotely");
                handle.mark_restored().await;
            }
            Err(e) => {
                warn!(mock = %handle.name(), error = %e, "failed to restore mock");
                failures.push(e);
            }
        }
    }

    api.registry().prune_restored().await;
    finish("restore", restored, failures)
}

pub(crate) async fn clear_mocks(
    api: &ElectronApi,
    namespace: Option<&str>,
) -> Result<usize, MockError> {
    let mut cleared = 0;
    let mut failures = Vec::new();

    for handle in selected(api, namespace).await {
        match handle.mock_clear().await {
            Ok(_) => cleared += 1,
            Err(e) if e.is_restored() => {}
            Err(e) => failures.push(e),
        }
    }
    finish("clear", cleared, failures)
}

pub(crate) async fn reset_mocks(
    api: &ElectronApi,
    namespace: Option<&str>,
) -> Result<usize, MockError> {
    let mut reset = 0;
    let mut failures = Vec::new();

    for handle in selected(api, namespace).await {
        match handle.mock_reset().await {
            Ok(_) => reset += 1,
            Err(e) if e.is_restored() => {}
            Err(e) => failures.push(e),
        }
    }
    finish("reset", reset, failures)
}

async fn selected(api: &ElectronApi, namespace: Option<&str>) -> Vec<Arc<MockHandle>> {
    match namespace {
        Some(namespace) => {
            api.registry()
                .handles_in(&api.resolve_namespace(namespace))
                .await
        }
        None => api.registry().handles().await,
    }
}

fn finish(
    operation: &'static str,
    succeeded: usize,
    failures: Vec<MockError>,
) -> Result<usize, MockError> {
    if failures.is_empty() {
        debug!(operation, succeeded, "bulk operation complete");
        Ok(succeeded)
    } else {
        Err(MockError::Bulk {
            operation,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ElectronService;
    use crate::config::ServiceOptions;
    use electron_mock_ipc::ScriptedChannel;
    use electron_mock_ipc::error_codes;
    use serde_json::json;

    fn api(scripted: &ScriptedChannel) -> ElectronApi {
        ElectronService::new(ServiceOptions::default().with_custom_api_command("api"))
            .unwrap()
            .attach(Arc::new(scripted.clone()))
    }

    #[tokio::test]
    async fn test_mock_all_listing_failure_fails_whole_operation() {
        let scripted = ScriptedChannel::new();
        scripted.set_error("list_methods", error_codes::API_NOT_FOUND, "\"app\" API not found on ContextBridge");
        let api = api(&scripted);

        let err = api.mock_all("app").await.unwrap_err();
        assert!(err.to_string().starts_with("electron.app:"));
        assert_eq!(scripted.call_count("install_mock"), 0);
    }

    #[tokio::test]
    async fn test_mock_all_stops_at_first_failed_install() {
        let scripted = ScriptedChannel::new();
        scripted.set_response("list_methods", json!(["a", "b", "c"]));
        scripted.queue_response("install_mock", json!({ "installed": true }));
        scripted.queue_error("install_mock", error_codes::METHOD_NOT_FOUND, "b vanished");
        let api = api(&scripted);

        assert!(api.mock_all("app").await.is_err());
        assert_eq!(scripted.call_count("install_mock"), 2);
    }

    #[tokio::test]
    async fn test_remove_mocks_skips_missing_remote_mocks() {
        let scripted = ScriptedChannel::new();
        let api = api(&scripted);
        api.mock("app", "quit").await.unwrap();
        api.mock("app", "getName").await.unwrap();

        scripted.queue_error("restore_mock", error_codes::NOT_MOCKED, "not mocked");
        assert_eq!(api.remove_mocks().await.unwrap(), 1);
        assert!(api.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_mocks_surfaces_other_failures_after_trying_all() {
        let scripted = ScriptedChannel::new();
        let api = api(&scripted);
        api.mock("app", "quit").await.unwrap();
        api.mock("dialog", "showOpenDialog").await.unwrap();

        scripted.queue_error("restore_mock", error_codes::INVOCATION_FAILED, "boom");
        let err = api.remove_mocks().await.unwrap_err();

        assert!(matches!(&err, MockError::Bulk { operation: "restore", failures } if failures.len() == 1));
        assert_eq!(scripted.call_count("restore_mock"), 2);
        assert_eq!(api.registry().len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_and_reset_skip_restored_handles() {
        let scripted = ScriptedChannel::new();
        let api = api(&scripted);
        let quit = api.mock("app", "quit").await.unwrap();
        api.mock("app", "getName").await.unwrap();
        quit.mock_restore().await.unwrap();

        assert_eq!(api.clear_mocks(None).await.unwrap(), 1);
        assert_eq!(api.reset_mocks(Some("app")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_namespace_filter() {
        let scripted = ScriptedChannel::new();
        let api = api(&scripted);
        api.mock("app", "quit").await.unwrap();
        api.mock("dialog", "showOpenDialog").await.unwrap();

        assert_eq!(api.remove_mocks_in("dialog").await.unwrap(), 1);
        assert!(api.registry().get("app", "quit").await.is_some());
    }
}
