//! Local proxies for mocks living in the application's main process.
//!
//! A [`MockHandle`] forwards every configuration call to its remote mock and
//! applies the same change to a local [`MockFn`] mirror. Call history only
//! flows the other way, when [`MockHandle::update`] pulls it.
//!
//! The mirror's history is append-only. A pull fills in indices the mirror
//! does not have yet by replaying those calls through the mirror, and leaves
//! every existing index alone, so a call recorded locally always wins over a
//! late pull reporting the same position.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use electron_mock_common::Behavior;
use electron_mock_common::FunctionTable;
use electron_mock_common::Implementation;
use electron_mock_common::MockFn;
use electron_mock_common::MockOutcome;
use electron_mock_common::mutex_lock_or_recover;
use electron_mock_ipc::ChannelError;
use electron_mock_ipc::MockTarget;
use electron_mock_ipc::RemoteChannel;
use electron_mock_ipc::RemoteCommand;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::MutexGuard;
use tracing::Instrument;
use tracing::debug;
use tracing::info;

use crate::error::MockError;
use crate::telemetry::mock_span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockState {
    Active,
    Restored,
}

pub struct MockHandle {
    session: u64,
    target: MockTarget,
    name: String,
    channel: Weak<dyn RemoteChannel>,
    local: Mutex<MockFn>,
    local_functions: FunctionTable,
    updating: AtomicBool,
    // Held across each configuration round trip so restore cannot interleave.
    state: tokio::sync::Mutex<MockState>,
}

/// Clears `updating` however the pull ends.
struct UpdatingFlag<'a>(&'a AtomicBool);

impl Drop for UpdatingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MockHandle {
    /// Installs a remote mock for `target` and returns its local proxy.
    pub(crate) async fn install(
        session: u64,
        target: MockTarget,
        channel: &Arc<dyn RemoteChannel>,
        local_functions: FunctionTable,
    ) -> Result<Self, MockError> {
        let name = target.label();
        channel
            .execute(RemoteCommand::InstallMock(target.clone()))
            .instrument(mock_span(session, &target, "install_mock"))
            .await
            .map_err(|source| MockError::Remote {
                target: name.clone(),
                source,
            })?;
        info!(mock = %name, "mock installed");

        Ok(Self {
            session,
            local: Mutex::new(MockFn::named(name.clone())),
            channel: Arc::downgrade(channel),
            target,
            name,
            local_functions,
            updating: AtomicBool::new(false),
            state: tokio::sync::Mutex::new(MockState::Active),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session the handle was created in.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn target(&self) -> &MockTarget {
        &self.target
    }

    pub fn namespace(&self) -> &str {
        &self.target.namespace
    }

    pub fn method(&self) -> &str {
        &self.target.method
    }

    /// True while a pull is in flight; history may be momentarily stale.
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    pub async fn state(&self) -> MockState {
        *self.state.lock().await
    }

    pub async fn is_restored(&self) -> bool {
        self.state().await == MockState::Restored
    }

    pub fn calls(&self) -> Vec<Vec<Value>> {
        mutex_lock_or_recover(&self.local).calls().to_vec()
    }

    pub fn call_count(&self) -> usize {
        mutex_lock_or_recover(&self.local).call_count()
    }

    pub fn last_call(&self) -> Option<Vec<Value>> {
        mutex_lock_or_recover(&self.local).last_call().cloned()
    }

    /// Outcomes the local mirror produced, one per recorded call.
    pub fn results(&self) -> Vec<MockOutcome> {
        mutex_lock_or_recover(&self.local).results()
    }

    /// Records a call on the local mirror only, as test code calling the
    /// proxy directly would.
    pub fn call_local(&self, args: Vec<Value>) -> MockOutcome {
        mutex_lock_or_recover(&self.local).call(args, &self.local_functions)
    }

    /// Pulls the remote call history into the local mirror.
    ///
    /// A second `update` while one is in flight returns immediately.
    pub async fn update(&self) -> Result<&Self, MockError> {
        if self
            .updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(mock = %self.name, "update already in flight");
            return Ok(self);
        }
        let _flag = UpdatingFlag(&self.updating);

        let _state = self.active().await?;
        let value = self
            .send(RemoteCommand::MockCalls(self.target.clone()))
            .await?;
        let remote: Vec<Vec<Value>> =
            serde_json::from_value(value).map_err(|source| MockError::Decode {
                target: self.name.clone(),
                source,
            })?;

        let appended = self.merge_remote_calls(remote);
        debug!(mock = %self.name, appended, "mock history synchronized");
        Ok(self)
    }

    fn merge_remote_calls(&self, remote: Vec<Vec<Value>>) -> usize {
        let mut local = mutex_lock_or_recover(&self.local);
        let known = local.call_count();
        let mut appended = 0;
        for args in remote.into_iter().skip(known) {
            local.call(args, &self.local_functions);
            appended += 1;
        }
        appended
    }

    pub async fn mock_implementation(
        &self,
        implementation: Implementation,
    ) -> Result<&Self, MockError> {
        self.configure(Behavior::Implementation(implementation), false)
            .await
    }

    pub async fn mock_implementation_once(
        &self,
        implementation: Implementation,
    ) -> Result<&Self, MockError> {
        self.configure(Behavior::Implementation(implementation), true)
            .await
    }

    pub async fn mock_return_value<T: Serialize>(&self, value: T) -> Result<&Self, MockError> {
        self.configure(Behavior::ReturnValue(encode(value)?), false)
            .await
    }

    pub async fn mock_return_value_once<T: Serialize>(
        &self,
        value: T,
    ) -> Result<&Self, MockError> {
        self.configure(Behavior::ReturnValue(encode(value)?), true)
            .await
    }

    pub async fn mock_resolved_value<T: Serialize>(&self, value: T) -> Result<&Self, MockError> {
        self.configure(Behavior::ResolvedValue(encode(value)?), false)
            .await
    }

    pub async fn mock_resolved_value_once<T: Serialize>(
        &self,
        value: T,
    ) -> Result<&Self, MockError> {
        self.configure(Behavior::ResolvedValue(encode(value)?), true)
            .await
    }

    pub async fn mock_rejected_value<T: Serialize>(&self, value: T) -> Result<&Self, MockError> {
        self.configure(Behavior::RejectedValue(encode(value)?), false)
            .await
    }

    pub async fn mock_rejected_value_once<T: Serialize>(
        &self,
        value: T,
    ) -> Result<&Self, MockError> {
        self.configure(Behavior::RejectedValue(encode(value)?), true)
            .await
    }

    /// Erases remote and local call history; behaviour is kept.
    pub async fn mock_clear(&self) -> Result<&Self, MockError> {
        let _state = self.active().await?;
        self.clear_both().await?;
        Ok(self)
    }

    /// Reverts the remote mock to a no-op and empties its history.
    pub async fn mock_reset(&self) -> Result<&Self, MockError> {
        let _state = self.active().await?;
        self.send(RemoteCommand::ResetMock(self.target.clone()))
            .await?;
        mutex_lock_or_recover(&self.local).reset();
        // The mock primitive's reset keeps history; clearing must follow.
        self.clear_both().await?;
        debug!(mock = %self.name, "mock reset");
        Ok(self)
    }

    /// Puts the original method back. The handle cannot be configured again.
    pub async fn mock_restore(&self) -> Result<&Self, MockError> {
        let mut state = self.active().await?;
        self.send(RemoteCommand::RestoreMock(self.target.clone()))
            .await?;
        // The remote mock is gone along with its history.
        mutex_lock_or_recover(&self.local).clear();
        *state = MockState::Restored;
        info!(mock = %self.name, "mock restored");
        Ok(self)
    }

    /// Marks the handle restored when the remote mock is already gone.
    pub(crate) async fn mark_restored(&self) {
        let mut state = self.state.lock().await;
        mutex_lock_or_recover(&self.local).clear();
        *state = MockState::Restored;
    }

    async fn configure(&self, behavior: Behavior, once: bool) -> Result<&Self, MockError> {
        let _state = self.active().await?;
        debug!(mock = %self.name, kind = behavior.kind(), once, "configuring mock");
        self.send(RemoteCommand::SetBehavior {
            target: self.target.clone(),
            behavior: behavior.clone(),
            once,
        })
        .await?;
        mutex_lock_or_recover(&self.local).set_behavior(behavior, once);
        Ok(self)
    }

    async fn clear_both(&self) -> Result<(), MockError> {
        self.send(RemoteCommand::ClearMock(self.target.clone()))
            .await?;
        mutex_lock_or_recover(&self.local).clear();
        Ok(())
    }

    async fn active(&self) -> Result<MutexGuard<'_, MockState>, MockError> {
        let state = self.state.lock().await;
        if *state == MockState::Restored {
            return Err(MockError::Restored(self.name.clone()));
        }
        Ok(state)
    }

    async fn send(&self, command: RemoteCommand) -> Result<Value, MockError> {
        let channel = self.channel.upgrade().ok_or_else(|| MockError::Remote {
            target: self.name.clone(),
            source: ChannelError::Closed,
        })?;
        let span = mock_span(self.session, &self.target, command.name());
        channel
            .execute(command)
            .instrument(span)
            .await
            .map_err(|source| MockError::Remote {
                target: self.name.clone(),
                source,
            })
    }
}

impl std::fmt::Debug for MockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHandle")
            .field("name", &self.name)
            .field("calls", &self.call_count())
            .field("updating", &self.is_updating())
            .finish()
    }
}

fn encode<T: Serialize>(value: T) -> Result<Value, MockError> {
    serde_json::to_value(value).map_err(MockError::Encode)
}
