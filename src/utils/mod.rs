//! Utility functions
//!
//! Provides logging setup and warning deduplication.

pub mod logging;

pub use logging::{WarnOnce, setup_logging};
