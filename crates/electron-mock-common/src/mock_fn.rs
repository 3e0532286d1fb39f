use std::collections::VecDeque;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde_json::Value;

use crate::behavior::Behavior;
use crate::behavior::FunctionTable;
use crate::behavior::MockOutcome;

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

/// Recording mock function.
///
/// Every call is appended to the history before its behaviour runs. A call
/// consumes the oldest queued one-shot behaviour if there is one, otherwise
/// it uses the default behaviour, otherwise it returns `null`.
///
/// [`MockFn::reset`] reverts behaviour but keeps history. Callers that need
/// an empty history after a reset must follow it with [`MockFn::clear`].
#[derive(Debug, Clone)]
pub struct MockFn {
    name: Option<String>,
    calls: Vec<Vec<Value>>,
    results: Vec<Option<MockOutcome>>,
    default: Option<Behavior>,
    once: VecDeque<Behavior>,
    // Changes on clear so outcomes of calls recorded before it are dropped.
    epoch: u64,
}

/// A call that has been recorded but whose behaviour has not run yet.
///
/// Returned by [`MockFn::record`] so the behaviour can run without holding
/// whatever lock guards the mock.
#[derive(Debug, Clone)]
pub struct PendingCall {
    index: usize,
    epoch: u64,
    args: Vec<Value>,
    behavior: Option<Behavior>,
}

impl PendingCall {
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn evaluate(&self, functions: &FunctionTable) -> MockOutcome {
        match &self.behavior {
            Some(behavior) => behavior.evaluate(&self.args, functions),
            None => MockOutcome::Returned(Value::Null),
        }
    }
}

impl Default for MockFn {
    fn default() -> Self {
        Self {
            name: None,
            calls: Vec::new(),
            results: Vec::new(),
            default: None,
            once: VecDeque::new(),
            epoch: next_epoch(),
        }
    }
}

impl MockFn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Records the call, then runs its behaviour.
    pub fn call(&mut self, args: Vec<Value>, functions: &FunctionTable) -> MockOutcome {
        let pending = self.record(args);
        let outcome = pending.evaluate(functions);
        self.complete(&pending, outcome.clone());
        outcome
    }

    /// Appends `args` to the history and picks the behaviour for this call.
    pub fn record(&mut self, args: Vec<Value>) -> PendingCall {
        let behavior = self.once.pop_front().or_else(|| self.default.clone());
        self.calls.push(args.clone());
        self.results.push(None);
        PendingCall {
            index: self.calls.len() - 1,
            epoch: self.epoch,
            args,
            behavior,
        }
    }

    /// Stores the outcome of a recorded call. Ignored if the history was
    /// cleared since, or if `pending` belongs to another mock.
    pub fn complete(&mut self, pending: &PendingCall, outcome: MockOutcome) {
        if pending.epoch != self.epoch {
            return;
        }
        if let Some(slot) = self.results.get_mut(pending.index) {
            *slot = Some(outcome);
        }
    }

    pub fn set_behavior(&mut self, behavior: Behavior, once: bool) {
        if once {
            self.once.push_back(behavior);
        } else {
            self.default = Some(behavior);
        }
    }

    pub fn default_behavior(&self) -> Option<&Behavior> {
        self.default.as_ref()
    }

    pub fn pending_once(&self) -> usize {
        self.once.len()
    }

    pub fn calls(&self) -> &[Vec<Value>] {
        &self.calls
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn last_call(&self) -> Option<&Vec<Value>> {
        self.calls.last()
    }

    /// Outcomes of finished calls, in call order.
    pub fn results(&self) -> Vec<MockOutcome> {
        self.results.iter().flatten().cloned().collect()
    }

    /// Erases call history; configured behaviour is untouched.
    pub fn clear(&mut self) {
        self.calls.clear();
        self.results.clear();
        self.epoch = next_epoch();
    }

    /// Reverts to a no-op and drops queued one-shot behaviours.
    pub fn reset(&mut self) {
        self.default = None;
        self.once.clear();
    }
}
