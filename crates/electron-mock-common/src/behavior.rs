//! Serializable descriptions of what a mock does when it is called.
//!
//! Closures cannot cross the process boundary, so every configurable
//! behaviour is expressed as data. The one escape hatch for genuinely
//! dynamic code is [`Implementation::Remote`], which names a function the
//! receiving process registered in its own [`FunctionTable`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A function installed by the process that owns it.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> MockOutcome + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Implementation {
    /// Returns `null`.
    Noop,
    /// Returns the argument at the given position, or `null` if absent.
    ReturnArg(usize),
    /// Fails synchronously with the given message.
    Throw(String),
    /// Runs a function registered under this name in the evaluating process.
    Remote(String),
}

impl Implementation {
    pub fn evaluate(&self, args: &[Value], functions: &FunctionTable) -> MockOutcome {
        match self {
            Implementation::Noop => MockOutcome::Returned(Value::Null),
            Implementation::ReturnArg(index) => {
                MockOutcome::Returned(args.get(*index).cloned().unwrap_or(Value::Null))
            }
            Implementation::Throw(message) => MockOutcome::Threw(message.clone()),
            Implementation::Remote(name) => match functions.get(name) {
                Some(function) => function(args),
                None => MockOutcome::Threw(format!("function '{}' is not registered", name)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Behavior {
    Implementation(Implementation),
    ReturnValue(Value),
    ResolvedValue(Value),
    RejectedValue(Value),
}

impl Behavior {
    pub fn evaluate(&self, args: &[Value], functions: &FunctionTable) -> MockOutcome {
        match self {
            Behavior::Implementation(implementation) => implementation.evaluate(args, functions),
            Behavior::ReturnValue(value) => MockOutcome::Returned(value.clone()),
            Behavior::ResolvedValue(value) => MockOutcome::Resolved(value.clone()),
            Behavior::RejectedValue(value) => MockOutcome::Rejected(value.clone()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Behavior::Implementation(_) => "implementation",
            Behavior::ReturnValue(_) => "return_value",
            Behavior::ResolvedValue(_) => "resolved_value",
            Behavior::RejectedValue(_) => "rejected_value",
        }
    }
}

/// Result of a single call to a mock or a native method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MockOutcome {
    Returned(Value),
    Resolved(Value),
    Rejected(Value),
    Threw(String),
}

impl MockOutcome {
    /// Collapses the outcome the way an awaiting caller observes it:
    /// synchronous and resolved values succeed, throws and rejections fail.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            MockOutcome::Returned(value) | MockOutcome::Resolved(value) => Ok(value),
            MockOutcome::Threw(message) => Err(message),
            MockOutcome::Rejected(Value::String(message)) => Err(message),
            MockOutcome::Rejected(value) => Err(value.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, MockOutcome::Threw(_) | MockOutcome::Rejected(_))
    }
}

/// Named functions available to [`Implementation::Remote`].
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: BTreeMap<String, NativeFn>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[Value]) -> MockOutcome + Send + Sync + 'static,
    {
        self.functions.insert(name.to_string(), Arc::new(function));
    }

    pub fn with<F>(mut self, name: &str, function: F) -> Self
    where
        F: Fn(&[Value]) -> MockOutcome + Send + Sync + 'static,
    {
        self.register(name, function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&NativeFn> {
        self.functions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}
