//! Stride daemon library.
//!
//! Serves the progression engine over a line-delimited JSON-RPC unix
//! socket. The binary in `main.rs` wires configuration, store and server
//! together; handlers are exported so integration tests can drive them
//! without a socket.

pub mod config;
pub mod handlers;
pub mod rpc_server;
