//! File system storage management
//!
//! Handles path aliases, path resolution and serving permissions.

pub mod alias;
pub mod permissions;
pub mod validation;

pub use alias::{AliasFind, AliasRule, AliasTable};
pub use permissions::{AccessGuard, ServingPolicy, StrictMode, is_restricted};
pub use validation::{clean_url, resolve_path, resolve_url};
