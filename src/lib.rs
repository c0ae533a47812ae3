//! Networked tuple space
//!
//! A single in-memory key/value store shared by any number of TCP clients
//! speaking a length-prefixed text protocol with READ, GET and PUT.

pub mod client;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod stats;
pub mod store;

/// Default listening address
pub const DEFAULT_ADDR: &str = "localhost:51234";
