#![deny(clippy::all)]

//! The application-side half of electron-mock.
//!
//! [`BridgeHost`] models the bridge an application under test exposes: named
//! API groups whose methods can be called, swapped for mocks and restored.
//! It is reachable in-process through [`InProcessChannel`] or over a socket
//! through [`serve_connection`].

mod channel;
mod error;
mod host;
mod server;

pub use channel::InProcessChannel;
pub use error::BridgeError;
pub use host::BridgeHost;
pub use server::handle_request;
pub use server::serve_connection;
#[cfg(unix)]
pub use server::serve_listener;

pub type Result<T> = std::result::Result<T, BridgeError>;
