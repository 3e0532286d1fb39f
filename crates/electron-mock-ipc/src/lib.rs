#![deny(clippy::all)]

mod channel;
mod client;
mod config;
mod error;
pub mod error_codes;
mod protocol;
mod scripted;

pub use channel::RemoteChannel;
pub use client::JsonRpcChannel;
pub use config::ChannelConfig;
pub use error::ChannelError;
pub use protocol::MockTarget;
pub use protocol::RemoteCommand;
pub use protocol::RpcRequest;
pub use protocol::RpcResponse;
pub use protocol::RpcServerError;
pub use scripted::CommandHold;
pub use scripted::ScriptedChannel;

pub type Result<T> = std::result::Result<T, ChannelError>;
