//! Configuration module
//!
//! Client settings assembled from the command line. There is no configuration file.

mod client;

pub use client::*;
