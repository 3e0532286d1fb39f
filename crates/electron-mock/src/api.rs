//! The per-session command surface.
//!
//! [`ElectronService`] validates options once; [`ElectronService::attach`]
//! then builds an [`ElectronApi`] for each session's channel. The API owns
//! the channel, and mock handles only hold a weak reference to it, so
//! dropping the API ends the session for every handle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use electron_mock_common::FunctionTable;
use electron_mock_ipc::MockTarget;
use electron_mock_ipc::RemoteChannel;
use electron_mock_ipc::RemoteCommand;
use serde_json::Value;
use tracing::Instrument;
use tracing::debug;
use tracing::error;

use crate::bulk;
use crate::config::ServiceOptions;
use crate::error::ConfigError;
use crate::error::MockError;
use crate::mock::MockHandle;
use crate::registry::MockRegistry;
use crate::telemetry::api_span;
use crate::telemetry::session_span;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Bridge property backing the custom API command.
pub const CUSTOM_BRIDGE_PROP: &str = "custom";

/// Command names with a fixed bridge property; the custom command may not
/// reuse any of them.
pub const RESERVED_COMMANDS: [&str; 4] = ["app", "browserWindow", "dialog", "mainProcess"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCommand {
    pub name: String,
    pub bridge_prop: String,
}

impl ApiCommand {
    fn new(name: &str, bridge_prop: &str) -> Self {
        Self {
            name: name.to_string(),
            bridge_prop: bridge_prop.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElectronService {
    commands: Vec<ApiCommand>,
    local_functions: FunctionTable,
}

impl ElectronService {
    pub fn new(options: ServiceOptions) -> Result<Self, ConfigError> {
        let custom = options.custom_api_command;
        if custom.is_empty() {
            error!("custom API command name is empty");
            return Err(ConfigError::EmptyCommand);
        }
        if RESERVED_COMMANDS.contains(&custom.as_str()) {
            let err = ConfigError::ReservedCommand(custom);
            error!(error = %err, "custom API command collides with a reserved command");
            return Err(err);
        }

        let mut commands = vec![ApiCommand::new(&custom, CUSTOM_BRIDGE_PROP)];
        commands.extend(RESERVED_COMMANDS.iter().map(|name| ApiCommand::new(name, name)));
        Ok(Self {
            commands,
            local_functions: FunctionTable::new(),
        })
    }

    /// Functions the local mirrors may run for `Implementation::Remote`.
    ///
    /// Without them a mirror records the call and reports the function as
    /// unregistered; the remote mock is unaffected.
    pub fn with_local_functions(mut self, functions: FunctionTable) -> Self {
        self.local_functions = functions;
        self
    }

    pub fn commands(&self) -> &[ApiCommand] {
        &self.commands
    }

    /// Builds the command surface for one session.
    ///
    /// Each channel gets its own session, so several application instances
    /// can be driven side by side, each through its own `ElectronApi`.
    pub fn attach(&self, channel: Arc<dyn RemoteChannel>) -> ElectronApi {
        let session = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        let _span = session_span(session).entered();
        for command in &self.commands {
            debug!(
                command = %command.name,
                bridge_prop = %command.bridge_prop,
                "adding api command"
            );
        }
        ElectronApi {
            session,
            channel,
            commands: self.commands.clone(),
            registry: MockRegistry::for_session(session),
            local_functions: self.local_functions.clone(),
        }
    }
}

pub struct ElectronApi {
    session: u64,
    channel: Arc<dyn RemoteChannel>,
    commands: Vec<ApiCommand>,
    registry: MockRegistry,
    local_functions: FunctionTable,
}

impl ElectronApi {
    /// Identifies this session in logs and on its mock handles.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn commands(&self) -> &[ApiCommand] {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<&ApiCommand> {
        self.commands.iter().find(|command| command.name == name)
    }

    pub fn registry(&self) -> &MockRegistry {
        &self.registry
    }

    pub(crate) fn channel(&self) -> &Arc<dyn RemoteChannel> {
        &self.channel
    }

    /// Calls `method` on the bridge API behind `command`.
    pub async fn call(
        &self,
        command: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, MockError> {
        let api_command = self
            .command(command)
            .ok_or_else(|| MockError::UnknownCommand(command.to_string()))?;
        debug!(command, method, "forwarding api call");

        self.channel
            .execute(RemoteCommand::Invoke {
                bridge_prop: api_command.bridge_prop.clone(),
                method: method.to_string(),
                args,
            })
            .instrument(api_span(self.session, command, method))
            .await
            .map_err(|e| MockError::Api {
                command: api_command.name.clone(),
                code: e.code(),
                message: e.message(),
            })
    }

    pub async fn app(&self, method: &str, args: Vec<Value>) -> Result<Value, MockError> {
        self.call("app", method, args).await
    }

    pub async fn browser_window(&self, method: &str, args: Vec<Value>) -> Result<Value, MockError> {
        self.call("browserWindow", method, args).await
    }

    pub async fn dialog(&self, method: &str, args: Vec<Value>) -> Result<Value, MockError> {
        self.call("dialog", method, args).await
    }

    pub async fn main_process(&self, method: &str, args: Vec<Value>) -> Result<Value, MockError> {
        self.call("mainProcess", method, args).await
    }

    /// Calls the application's custom API, whatever its command name is.
    pub async fn custom(&self, method: &str, args: Vec<Value>) -> Result<Value, MockError> {
        let name = self
            .commands
            .iter()
            .find(|command| command.bridge_prop == CUSTOM_BRIDGE_PROP)
            .map(|command| command.name.clone())
            .ok_or_else(|| MockError::UnknownCommand(CUSTOM_BRIDGE_PROP.to_string()))?;
        self.call(&name, method, args).await
    }

    /// Maps a command name to its bridge property; other names pass through.
    pub(crate) fn resolve_namespace(&self, namespace: &str) -> String {
        self.command(namespace)
            .map(|command| command.bridge_prop.clone())
            .unwrap_or_else(|| namespace.to_string())
    }

    /// Mocks one method, reusing the existing mock for the same pair.
    pub async fn mock(&self, namespace: &str, method: &str) -> Result<Arc<MockHandle>, MockError> {
        let target = MockTarget::new(self.resolve_namespace(namespace), method);
        self.registry
            .get_or_create(target, &self.channel, &self.local_functions)
            .await
    }

    pub async fn mock_all(
        &self,
        namespace: &str,
    ) -> Result<BTreeMap<String, Arc<MockHandle>>, MockError> {
        bulk::mock_all(self, namespace)
            .instrument(session_span(self.session))
            .await
    }

    pub async fn remove_mocks(&self) -> Result<usize, MockError> {
        bulk::remove_mocks(self, None)
            .instrument(session_span(self.session))
            .await
    }

    pub async fn remove_mocks_in(&self, namespace: &str) -> Result<usize, MockError> {
        bulk::remove_mocks(self, Some(namespace))
            .instrument(session_span(self.session))
            .await
    }

    pub async fn clear_mocks(&self, namespace: Option<&str>) -> Result<usize, MockError> {
        bulk::clear_mocks(self, namespace)
            .instrument(session_span(self.session))
            .await
    }

    pub async fn reset_mocks(&self, namespace: Option<&str>) -> Result<usize, MockError> {
        bulk::reset_mocks(self, namespace)
            .instrument(session_span(self.session))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use electron_mock_ipc::ScriptedChannel;
    use electron_mock_ipc::error_codes;
    use serde_json::json;

    fn options(custom: &str) -> ServiceOptions {
        ServiceOptions::default().with_custom_api_command(custom)
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        for name in RESERVED_COMMANDS {
            assert_eq!(
                ElectronService::new(options(name)).unwrap_err(),
                ConfigError::ReservedCommand(name.to_string())
            );
        }
    }

    #[test]
    fn test_empty_custom_name_is_rejected() {
        assert_eq!(
            ElectronService::new(options("")).unwrap_err(),
            ConfigError::EmptyCommand
        );
    }

    #[test]
    fn test_commands_include_custom_first() {
        let service = ElectronService::new(options("myApi")).unwrap();
        let names: Vec<_> = service.commands().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["myApi", "app", "browserWindow", "dialog", "mainProcess"]);
        assert_eq!(service.commands()[0].bridge_prop, "custom");
    }

    #[tokio::test]
    async fn test_call_forwards_to_bridge_prop() {
        let scripted = ScriptedChannel::new();
        scripted.set_response("invoke", json!("ok"));
        let api = ElectronService::new(options("myApi"))
            .unwrap()
            .attach(Arc::new(scripted.clone()));

        assert_eq!(api.custom("ping", vec![json!(1)]).await.unwrap(), json!("ok"));
        assert_eq!(
            scripted.commands()[0],
            RemoteCommand::Invoke {
                bridge_prop: "custom".into(),
                method: "ping".into(),
                args: vec![json!(1)],
            }
        );
    }

    #[tokio::test]
    async fn test_call_failure_is_prefixed_with_command() {
        let scripted = ScriptedChannel::new();
        scripted.set_error(
            "invoke",
            error_codes::API_NOT_FOUND,
            "\"dialog\" API not found on ContextBridge",
        );
        let api = ElectronService::new(options("api"))
            .unwrap()
            .attach(Arc::new(scripted));

        let err = api.dialog("showOpenDialog", vec![]).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "dialog error: \"dialog\" API not found on ContextBridge"
        );
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let api = ElectronService::new(options("api"))
            .unwrap()
            .attach(Arc::new(ScriptedChannel::new()));
        assert!(matches!(
            api.call("tray", "setImage", vec![]).await.unwrap_err(),
            MockError::UnknownCommand(name) if name == "tray"
        ));
    }

    #[tokio::test]
    async fn test_mock_resolves_custom_command_name() {
        let scripted = ScriptedChannel::new();
        let api = ElectronService::new(options("myApi"))
            .unwrap()
            .attach(Arc::new(scripted.clone()));

        let mock = api.mock("myApi", "ping").await.unwrap();
        assert_eq!(mock.namespace(), "custom");
        assert_eq!(api.resolve_namespace("app"), "app");
        assert_eq!(api.resolve_namespace("webContents"), "webContents");
    }

    #[test]
    fn test_each_attach_is_a_separate_session() {
        let service = ElectronService::new(options("api")).unwrap();
        let first = service.attach(Arc::new(ScriptedChannel::new()));
        let second = service.attach(Arc::new(ScriptedChannel::new()));
        assert_ne!(first.session(), second.session());
    }
}
