use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use electron_mock_common::mutex_lock_or_recover;
use serde_json::Value;
use tokio::sync::Notify;

use crate::channel::RemoteChannel;
use crate::error::ChannelError;
use crate::error_codes;
use crate::protocol::RemoteCommand;

#[derive(Debug, Clone)]
enum Scripted {
    Value(Value),
    Error { code: i32, message: String },
}

#[derive(Default)]
struct Script {
    responses: HashMap<String, Scripted>,
    queued: HashMap<String, VecDeque<Scripted>>,
    commands: Vec<RemoteCommand>,
    holds: HashMap<String, Arc<CommandHold>>,
}

/// Parks every command of one name until the test lets it through.
#[derive(Debug, Default)]
pub struct CommandHold {
    entered: Notify,
    released: Notify,
}

impl CommandHold {
    /// Waits until a held command has been received.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets one held command (or the next one to arrive) through.
    pub fn release(&self) {
        self.released.notify_one();
    }
}

/// A `RemoteChannel` that answers from a script instead of a remote process.
///
/// Responses are keyed by command name (`install_mock`, `invoke`, ...).
/// Queued responses are used first, in order, before the standing response
/// for that command. Every command is recorded for assertions.
///
/// # Example
///
/// ```ignore
/// use electron_mock_ipc::{RemoteChannel, RemoteCommand, ScriptedChannel};
/// use serde_json::json;
///
/// let channel = ScriptedChannel::new();
/// channel.set_response("list_methods", json!(["quit"]));
///
/// let result = channel
///     .execute(RemoteCommand::ListMethods { namespace: "app".into() })
///     .await?;
/// assert_eq!(result, json!(["quit"]));
/// assert_eq!(channel.call_count("list_methods"), 1);
/// ```
#[derive(Clone)]
pub struct ScriptedChannel {
    script: Arc<Mutex<Script>>,
    default_response: Value,
    error_on_missing: bool,
}

impl Default for ScriptedChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedChannel {
    /// Answers unscripted commands with `{ "success": true }`.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            default_response: serde_json::json!({ "success": true }),
            error_on_missing: false,
        }
    }

    /// Fails unscripted commands with an unknown-command error.
    pub fn new_strict() -> Self {
        Self {
            error_on_missing: true,
            default_response: Value::Null,
            ..Self::new()
        }
    }

    pub fn set_response(&self, command: &str, response: Value) {
        mutex_lock_or_recover(&self.script)
            .responses
            .insert(command.to_string(), Scripted::Value(response));
    }

    pub fn set_error(&self, command: &str, code: i32, message: &str) {
        mutex_lock_or_recover(&self.script).responses.insert(
            command.to_string(),
            Scripted::Error {
                code,
                message: message.to_string(),
            },
        );
    }

    pub fn queue_response(&self, command: &str, response: Value) {
        mutex_lock_or_recover(&self.script)
            .queued
            .entry(command.to_string())
            .or_default()
            .push_back(Scripted::Value(response));
    }

    pub fn queue_error(&self, command: &str, code: i32, message: &str) {
        mutex_lock_or_recover(&self.script)
            .queued
            .entry(command.to_string())
            .or_default()
            .push_back(Scripted::Error {
                code,
                message: message.to_string(),
            });
    }

    /// Holds `command` before it is answered; it is still recorded on arrival.
    pub fn hold(&self, command: &str) -> Arc<CommandHold> {
        Arc::clone(
            mutex_lock_or_recover(&self.script)
                .holds
                .entry(command.to_string())
                .or_default(),
        )
    }

    pub fn commands(&self) -> Vec<RemoteCommand> {
        mutex_lock_or_recover(&self.script).commands.clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        mutex_lock_or_recover(&self.script)
            .commands
            .iter()
            .filter(|c| c.name() == command)
            .count()
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        mutex_lock_or_recover(&self.script)
            .commands
            .iter()
            .map(RemoteCommand::name)
            .collect()
    }

    pub fn clear_commands(&self) {
        mutex_lock_or_recover(&self.script).commands.clear();
    }
}

#[async_trait]
impl RemoteChannel for ScriptedChannel {
    async fn execute(&self, command: RemoteCommand) -> Result<Value, ChannelError> {
        let name = command.name();
        let hold = {
            let mut script = mutex_lock_or_recover(&self.script);
            script.commands.push(command);
            script.holds.get(name).cloned()
        };
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.released.notified().await;
        }

        let mut script = mutex_lock_or_recover(&self.script);

        let queued = script.queued.get_mut(name).and_then(VecDeque::pop_front);
        let scripted = queued.or_else(|| script.responses.get(name).cloned());

        match scripted {
            Some(Scripted::Value(value)) => Ok(value),
            Some(Scripted::Error { code, message }) => Err(ChannelError::Remote { code, message }),
            None if self.error_on_missing => Err(ChannelError::Remote {
                code: error_codes::UNKNOWN_COMMAND,
                message: format!("Unscripted command: {}", name),
            }),
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MockTarget;
    use serde_json::json;

    fn calls() -> RemoteCommand {
        RemoteCommand::MockCalls(MockTarget::new("app", "quit"))
    }

    #[tokio::test]
    async fn test_held_command_waits_for_release() {
        let channel = ScriptedChannel::new();
        channel.set_response("mock_calls", json!([]));
        let hold = channel.hold("mock_calls");

        let pending = tokio::spawn({
            let channel = channel.clone();
            async move { channel.execute(calls()).await }
        });
        hold.entered().await;
        assert_eq!(channel.call_count("mock_calls"), 1);
        assert!(!pending.is_finished());

        hold.release();
        assert_eq!(pending.await.unwrap().unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_returns_configured_response() {
        let channel = ScriptedChannel::new();
        channel.set_response("mock_calls", json!([[1]]));

        assert_eq!(channel.execute(calls()).await.unwrap(), json!([[1]]));
    }

    #[tokio::test]
    async fn test_returns_default_for_unscripted() {
        let channel = ScriptedChannel::new();
        assert_eq!(
            channel.execute(calls()).await.unwrap(),
            json!({ "success": true })
        );
    }

    #[tokio::test]
    async fn test_strict_errors_on_unscripted() {
        let channel = ScriptedChannel::new_strict();
        let err = channel.execute(calls()).await.unwrap_err();
        assert_eq!(err.code(), Some(error_codes::UNKNOWN_COMMAND));
    }

    #[tokio::test]
    async fn test_queued_responses_drain_first() {
        let channel = ScriptedChannel::new();
        channel.set_response("mock_calls", json!("standing"));
        channel.queue_response("mock_calls", json!("first"));
        channel.queue_error("mock_calls", -32004, "second");

        assert_eq!(channel.execute(calls()).await.unwrap(), json!("first"));
        assert_eq!(
            channel.execute(calls()).await.unwrap_err().message(),
            "second"
        );
        assert_eq!(channel.execute(calls()).await.unwrap(), json!("standing"));
    }

    #[tokio::test]
    async fn test_records_commands() {
        let channel = ScriptedChannel::new();
        channel.execute(calls()).await.unwrap();
        channel
            .execute(RemoteCommand::ListMethods {
                namespace: "dialog".into(),
            })
            .await
            .unwrap();

        assert_eq!(channel.call_count("mock_calls"), 1);
        assert_eq!(channel.command_names(), vec!["mock_calls", "list_methods"]);
        assert_eq!(channel.commands()[0], calls());

        channel.clear_commands();
        assert!(channel.commands().is_empty());
    }

    #[tokio::test]
    async fn test_set_error() {
        let channel = ScriptedChannel::new();
        channel.set_error("mock_calls", error_codes::API_NOT_FOUND, "missing");
        let err = channel.execute(calls()).await.unwrap_err();
        assert_eq!(err.code(), Some(error_codes::API_NOT_FOUND));
    }
}
