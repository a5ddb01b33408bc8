//! Network module
//!
//! Owns the single stream connection to the chat coordinator.

mod connection;

pub use connection::*;
