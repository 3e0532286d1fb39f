#![deny(clippy::all)]

//! Mock Electron main-process APIs from the process driving the tests.
//!
//! An [`ElectronService`] is configured once. Each session attaches it to a
//! [`RemoteChannel`] and gets an [`ElectronApi`] back, which forwards API
//! calls and hands out [`MockHandle`]s whose call history can be pulled from
//! the application with [`MockHandle::update`].

mod api;
mod bulk;
mod config;
mod error;
mod mock;
mod registry;
pub mod telemetry;

pub use api::ApiCommand;
pub use api::CUSTOM_BRIDGE_PROP;
pub use api::ElectronApi;
pub use api::ElectronService;
pub use api::RESERVED_COMMANDS;
pub use config::ServiceOptions;
pub use error::ConfigError;
pub use error::MockError;
pub use mock::MockHandle;
pub use mock::MockState;
pub use registry::MockRegistry;

pub use electron_mock_common::Behavior;
pub use electron_mock_common::FunctionTable;
pub use electron_mock_common::Implementation;
pub use electron_mock_common::MockOutcome;
pub use electron_mock_ipc::ChannelConfig;
pub use electron_mock_ipc::ChannelError;
pub use electron_mock_ipc::JsonRpcChannel;
pub use electron_mock_ipc::MockTarget;
pub use electron_mock_ipc::RemoteChannel;

pub type Result<T> = std::result::Result<T, MockError>;
