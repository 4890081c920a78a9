//! Server core functionality
//!
//! Listener, connection handling and middleware assembly.

pub mod connection;
pub mod core;

pub use self::core::{Server, build_pipeline};
