//! HTTP protocol implementation
//!
//! Request head parsing, request/response types and URL classification.

pub mod classify;
pub mod parser;
pub mod request;
pub mod responses;

pub use classify::{Classification, UrlClassifier};
pub use parser::parse_request_head;
pub use request::Request;
pub use responses::Response;
