//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept polled against a shutdown flag)
//! - Fixed worker thread pool fed through a bounded channel
//! - Commands routed through the API request handler

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
