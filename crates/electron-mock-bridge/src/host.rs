use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use electron_mock_common::FunctionTable;
use electron_mock_common::MockFn;
use electron_mock_common::MockOutcome;
use electron_mock_common::NativeFn;
use electron_mock_common::PendingCall;
use electron_mock_common::mutex_lock_or_recover;
use electron_mock_ipc::MockTarget;
use electron_mock_ipc::RemoteCommand;
use serde_json::Value;
use serde_json::json;
use tracing::debug;
use tracing::info;

use crate::error::BridgeError;

/// A mock installed in place of a bridge method. The replaced method is kept
/// alongside it so restore does not depend on anything outside this slot.
struct RemoteMock {
    mock: MockFn,
    original: NativeFn,
}

/// What `call_method` runs once the state lock is released.
enum Dispatch {
    Native(NativeFn),
    Mock(PendingCall, FunctionTable),
}

enum MethodSlot {
    Native(NativeFn),
    Mocked(Box<RemoteMock>),
}

#[derive(Default)]
struct ApiGroup {
    methods: BTreeMap<String, MethodSlot>,
}

struct BridgeState {
    exposed: bool,
    groups: BTreeMap<String, ApiGroup>,
    functions: FunctionTable,
    installs: HashMap<MockTarget, usize>,
}

/// In-memory model of the bridge exposed by the application under test.
pub struct BridgeHost {
    state: Mutex<BridgeState>,
}

impl Default for BridgeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BridgeState {
                exposed: true,
                groups: BTreeMap::new(),
                functions: FunctionTable::new(),
                installs: HashMap::new(),
            }),
        }
    }

    /// A host whose application never exposed the bridge.
    pub fn unexposed() -> Self {
        let host = Self::new();
        host.set_exposed(false);
        host
    }

    pub fn set_exposed(&self, exposed: bool) {
        mutex_lock_or_recover(&self.state).exposed = exposed;
    }

    /// Adds an empty API group.
    pub fn register_api(&self, namespace: &str) {
        mutex_lock_or_recover(&self.state)
            .groups
            .entry(namespace.to_string())
            .or_default();
    }

    pub fn register_method<F>(&self, namespace: &str, method: &str, function: F)
    where
        F: Fn(&[Value]) -> MockOutcome + Send + Sync + 'static,
    {
        mutex_lock_or_recover(&self.state)
            .groups
            .entry(namespace.to_string())
            .or_default()
            .methods
            .insert(method.to_string(), MethodSlot::Native(Arc::new(function)));
    }

    pub fn with_method<F>(self, namespace: &str, method: &str, function: F) -> Self
    where
        F: Fn(&[Value]) -> MockOutcome + Send + Sync + 'static,
    {
        self.register_method(namespace, method, function);
        self
    }

    /// Registers a function that mocks may reference by name.
    pub fn register_function<F>(&self, name: &str, function: F)
    where
        F: Fn(&[Value]) -> MockOutcome + Send + Sync + 'static,
    {
        mutex_lock_or_recover(&self.state)
            .functions
            .register(name, function);
    }

    pub fn with_function<F>(self, name: &str, function: F) -> Self
    where
        F: Fn(&[Value]) -> MockOutcome + Send + Sync + 'static,
    {
        self.register_function(name, function);
        self
    }

    pub fn methods(&self, namespace: &str) -> Option<Vec<String>> {
        mutex_lock_or_recover(&self.state)
            .groups
            .get(namespace)
            .map(|group| group.methods.keys().cloned().collect())
    }

    /// How many mocks have ever been installed for `target`.
    pub fn install_count(&self, target: &MockTarget) -> usize {
        mutex_lock_or_recover(&self.state)
            .installs
            .get(target)
            .copied()
            .unwrap_or(0)
    }

    pub fn is_mocked(&self, target: &MockTarget) -> bool {
        let state = mutex_lock_or_recover(&self.state);
        matches!(
            state
                .groups
                .get(&target.namespace)
                .and_then(|group| group.methods.get(&target.method)),
            Some(MethodSlot::Mocked(_))
        )
    }

    /// Calls a method the way the application does internally: through
    /// whatever currently occupies the slot, mock or original.
    ///
    /// Neither the original nor a mock's behaviour runs under the state
    /// lock, so both may call back into the host.
    pub fn call_method(
        &self,
        namespace: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, BridgeError> {
        let dispatch = {
            let mut guard = mutex_lock_or_recover(&self.state);
            let state = &mut *guard;
            let slot = state
                .groups
                .get_mut(namespace)
                .ok_or_else(|| BridgeError::ApiNotFound(namespace.to_string()))?
                .methods
                .get_mut(method)
                .ok_or_else(|| BridgeError::MethodNotFound {
                    namespace: namespace.to_string(),
                    method: method.to_string(),
                })?;

            match slot {
                MethodSlot::Native(function) => Dispatch::Native(Arc::clone(function)),
                MethodSlot::Mocked(remote) => {
                    Dispatch::Mock(remote.mock.record(args.clone()), state.functions.clone())
                }
            }
        };

        let outcome = match dispatch {
            Dispatch::Native(function) => function(&args),
            Dispatch::Mock(pending, functions) => {
                let outcome = pending.evaluate(&functions);
                let target = MockTarget::new(namespace, method);
                let mut state = mutex_lock_or_recover(&self.state);
                // The mock may have been restored or cleared meanwhile.
                if let Ok(mock) = mock_mut(&mut state.groups, &target) {
                    mock.complete(&pending, outcome.clone());
                }
                outcome
            }
        };
        outcome.into_result().map_err(BridgeError::Invocation)
    }

    pub fn execute(&self, command: RemoteCommand) -> Result<Value, BridgeError> {
        debug!(command = command.name(), "bridge command");
        if let RemoteCommand::Invoke {
            bridge_prop,
            method,
            args,
        } = command
        {
            self.ensure_exposed()?;
            return self.call_method(&bridge_prop, &method, args);
        }

        let mut guard = mutex_lock_or_recover(&self.state);
        if !guard.exposed {
            return Err(BridgeError::NotAvailable);
        }
        let state = &mut *guard;

        match command {
            RemoteCommand::InstallMock(target) => {
                let slot = slot_mut(&mut state.groups, &target)?;
                let original = match slot {
                    MethodSlot::Native(function) => Arc::clone(function),
                    MethodSlot::Mocked(_) => return Err(BridgeError::AlreadyMocked(target)),
                };
                *slot = MethodSlot::Mocked(Box::new(RemoteMock {
                    mock: MockFn::named(target.label()),
                    original,
                }));
                *state.installs.entry(target.clone()).or_insert(0) += 1;
                info!(mock = %target.label(), "installed remote mock");
                Ok(json!({ "installed": true, "name": target.label() }))
            }
            RemoteCommand::SetBehavior {
                target,
                behavior,
                once,
            } => {
                mock_mut(&mut state.groups, &target)?.set_behavior(behavior, once);
                Ok(json!({ "success": true }))
            }
            RemoteCommand::ClearMock(target) => {
                mock_mut(&mut state.groups, &target)?.clear();
                Ok(json!({ "success": true }))
            }
            RemoteCommand::ResetMock(target) => {
                mock_mut(&mut state.groups, &target)?.reset();
                Ok(json!({ "success": true }))
            }
            RemoteCommand::RestoreMock(target) => {
                let slot = slot_mut(&mut state.groups, &target)?;
                let original = match slot {
                    MethodSlot::Mocked(remote) => Arc::clone(&remote.original),
                    MethodSlot::Native(_) => return Err(BridgeError::NotMocked(target)),
                };
                *slot = MethodSlot::Native(original);
                info!(mock = %target.label(), "restored original method");
                Ok(json!({ "success": true }))
            }
            RemoteCommand::MockCalls(target) => {
                let mock = mock_mut(&mut state.groups, &target)?;
                Ok(Value::Array(
                    mock.calls().iter().cloned().map(Value::Array).collect(),
                ))
            }
            RemoteCommand::ListMethods { namespace } => {
                let group = state
                    .groups
                    .get(&namespace)
                    .ok_or(BridgeError::ApiNotFound(namespace))?;
                Ok(Value::Array(
                    group.methods.keys().cloned().map(Value::String).collect(),
                ))
            }
            RemoteCommand::Invoke { .. } => Err(BridgeError::InvalidParams(
                "invoke is dispatched before the state lock".to_string(),
            )),
        }
    }

    fn ensure_exposed(&self) -> Result<(), BridgeError> {
        if mutex_lock_or_recover(&self.state).exposed {
            Ok(())
        } else {
            Err(BridgeError::NotAvailable)
        }
    }
}

fn slot_mut<'a>(
    groups: &'a mut BTreeMap<String, ApiGroup>,
    target: &MockTarget,
) -> Result<&'a mut MethodSlot, BridgeError> {
    groups
        .get_mut(&target.namespace)
        .ok_or_else(|| BridgeError::ApiNotFound(target.namespace.clone()))?
        .methods
        .get_mut(&target.method)
        .ok_or_else(|| BridgeError::MethodNotFound {
            namespace: target.namespace.clone(),
            method: target.method.clone(),
        })
}

fn mock_mut<'a>(
    groups: &'a mut BTreeMap<String, ApiGroup>,
    target: &MockTarget,
) -> Result<&'a mut MockFn, BridgeError> {
    match slot_mut(groups, target)? {
        MethodSlot::Mocked(remote) => Ok(&mut remote.mock),
        MethodSlot::Native(_) => Err(BridgeError::NotMocked(target.clone())),
    }
}
