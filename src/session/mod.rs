//! Interactive session module
//!
//! Handle validation, terminal rendering and the loop that multiplexes operator
//! input with the coordinator connection.

mod chat;
mod handle;
mod terminal;

pub use chat::*;
pub use handle::*;
pub use terminal::*;
