//! RAX static server
//!
//! Request-time gatekeeper for serving files from disk in a development HTTP
//! server: URL classification, path aliases, path resolution and the
//! filesystem access policy, plus a small HTTP front end to run them.

pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod safe_paths;
pub mod server;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use server::Server;
