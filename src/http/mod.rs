//! HTTP listener.
//!
//! Binds the configured address and serves the route table until the process
//! is asked to stop. Bind failures are returned as errors, never swallowed.

mod server;
mod shutdown;

pub use server::{bind, serve, start_server, ServerError};
pub use shutdown::shutdown_signal;
