#![deny(clippy::all)]

mod behavior;
mod mock_fn;
mod sync;

pub use behavior::Behavior;
pub use behavior::FunctionTable;
pub use behavior::Implementation;
pub use behavior::MockOutcome;
pub use behavior::NativeFn;
pub use mock_fn::MockFn;
pub use mock_fn::PendingCall;
pub use sync::mutex_lock_or_recover;
pub use sync::poison_recovery_count;
